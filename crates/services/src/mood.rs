//! Daily mood log: one mood per calendar day, last write wins.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use shared::wellness::{Mood, MoodEntry};

/// Set the mood for `date`, replacing any earlier entry for that day.
pub fn record_mood(moods: &[MoodEntry], date: NaiveDate, mood: Mood) -> Vec<MoodEntry> {
    let mut next = moods.to_vec();
    match next.iter_mut().find(|m| m.date == date) {
        Some(existing) => existing.mood = mood,
        None => next.push(MoodEntry { date, mood }),
    }
    next
}

/// Mood logged for a day. Duplicate dates resolve to the later entry.
pub fn mood_on(moods: &[MoodEntry], date: NaiveDate) -> Option<Mood> {
    moods.iter().rev().find(|m| m.date == date).map(|m| m.mood)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySlot {
    pub date: NaiveDate,
    pub mood: Option<Mood>,
}

impl DaySlot {
    /// Localization key for the short weekday name under the bar.
    pub fn weekday_key(&self) -> &'static str {
        match self.date.weekday() {
            Weekday::Mon => "weekdays.mon",
            Weekday::Tue => "weekdays.tue",
            Weekday::Wed => "weekdays.wed",
            Weekday::Thu => "weekdays.thu",
            Weekday::Fri => "weekdays.fri",
            Weekday::Sat => "weekdays.sat",
            Weekday::Sun => "weekdays.sun",
        }
    }

    /// Bar height as a fraction of the chart; empty days get a sliver.
    pub fn height_fraction(&self) -> f32 {
        match self.mood {
            Some(mood) => mood.level() as f32 / 5.0,
            None => 0.02,
        }
    }
}

/// The seven days ending with `today`, oldest first.
pub fn week_series(moods: &[MoodEntry], today: NaiveDate) -> Vec<DaySlot> {
    (0..7)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back);
            DaySlot {
                date,
                mood: mood_on(moods, date),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_record_mood_last_write_wins() {
        let moods = record_mood(&[], day(1), Mood::Sad);
        let moods = record_mood(&moods, day(2), Mood::Okay);
        let moods = record_mood(&moods, day(1), Mood::Happy);
        assert_eq!(moods.len(), 2);
        assert_eq!(mood_on(&moods, day(1)), Some(Mood::Happy));
    }

    #[test]
    fn test_week_series_ends_today() {
        let moods = vec![
            MoodEntry { date: day(10), mood: Mood::Calm },
            MoodEntry { date: day(4), mood: Mood::Anxious },
            MoodEntry { date: day(3), mood: Mood::Happy },
        ];
        let week = week_series(&moods, day(10));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(4));
        assert_eq!(week[0].mood, Some(Mood::Anxious));
        assert_eq!(week[6].date, day(10));
        assert_eq!(week[6].mood, Some(Mood::Calm));
        assert!(week[1..6].iter().all(|slot| slot.mood.is_none()));
    }

    #[test]
    fn test_height_fraction() {
        let happy = DaySlot { date: day(1), mood: Some(Mood::Happy) };
        let empty = DaySlot { date: day(1), mood: None };
        assert_eq!(happy.height_fraction(), 1.0);
        assert!(empty.height_fraction() > 0.0 && empty.height_fraction() < 0.1);
    }

    #[test]
    fn test_weekday_keys() {
        let wednesday = DaySlot { date: day(1), mood: None };
        assert_eq!(wednesday.weekday_key(), "weekdays.wed");
        let sunday = DaySlot { date: day(5), mood: None };
        assert_eq!(sunday.weekday_key(), "weekdays.sun");
    }
}
