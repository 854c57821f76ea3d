//! Journal retention and ordering rules.

use chrono::{DateTime, Duration, Utc};
use shared::wellness::{JournalEntry, Sentiment};

/// How long a negative entry is kept.
pub fn negative_retention() -> Duration {
    Duration::hours(24)
}

/// Drop negative entries older than the retention window.
///
/// Returns `None` when nothing expired so callers can skip a write.
pub fn prune_expired(entries: &[JournalEntry], now: DateTime<Utc>) -> Option<Vec<JournalEntry>> {
    let kept: Vec<JournalEntry> = entries
        .iter()
        .filter(|entry| {
            entry.sentiment == Sentiment::Positive || now - entry.date < negative_retention()
        })
        .cloned()
        .collect();

    if kept.len() == entries.len() {
        None
    } else {
        Some(kept)
    }
}

/// Positive entries, newest first.
pub fn positive_reflections(entries: &[JournalEntry]) -> Vec<&JournalEntry> {
    let mut positives: Vec<&JournalEntry> = entries
        .iter()
        .filter(|e| e.sentiment == Sentiment::Positive)
        .collect();
    positives.sort_by(|a, b| b.date.cmp(&a.date));
    positives
}

/// Append a new entry; blank content is rejected.
pub fn append_entry(
    entries: &[JournalEntry],
    content: &str,
    sentiment: Sentiment,
    now: DateTime<Utc>,
) -> Option<Vec<JournalEntry>> {
    if content.trim().is_empty() {
        return None;
    }
    let mut next = entries.to_vec();
    next.push(JournalEntry::new(content, sentiment, now));
    Some(next)
}
