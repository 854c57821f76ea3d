//! Domain types for the companion: profile, chat log, journal and moods.
//!
//! Field names serialize in camelCase so stored data stays readable by
//! other clients of the same storage layout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Oldest age the profile form accepts.
pub const MAX_AGE: u32 = 150;

/// Gender choices offered by the profile forms, as stored values.
pub const GENDER_OPTIONS: [&str; 5] = [
    "female",
    "male",
    "non-binary",
    "other",
    "prefer not to say",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("age must be a whole number between 1 and {MAX_AGE}")]
    InvalidAge,
    #[error("gender must be selected")]
    MissingGender,
}

impl UserProfile {
    /// Build a profile from raw form fields.
    pub fn from_form(name: &str, age: &str, gender: &str) -> Result<Self, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let age = age
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|a| (1..=MAX_AGE).contains(a))
            .ok_or(ProfileError::InvalidAge)?;
        let gender = gender.trim();
        if gender.is_empty() {
            return Err(ProfileError::MissingGender);
        }
        Ok(Self {
            name: name.to_string(),
            age,
            gender: gender.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Ai)
    }

    pub fn is_from_ai(&self) -> bool {
        self.sender == Sender::Ai
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    /// Parse a classifier's one-word answer. Anything unexpected is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub content: String,
    pub sentiment: Sentiment,
}

impl JournalEntry {
    pub fn new(content: impl Into<String>, sentiment: Sentiment, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            content: content.into(),
            sentiment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Okay,
    Sad,
    Anxious,
    Calm,
}

impl Mood {
    /// Picker order, brightest first.
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Calm, Mood::Okay, Mood::Anxious, Mood::Sad];

    /// Bar height on the weekly chart, 1..=5.
    pub fn level(&self) -> u8 {
        match self {
            Mood::Happy => 5,
            Mood::Calm => 4,
            Mood::Okay => 3,
            Mood::Anxious => 2,
            Mood::Sad => 1,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😄",
            Mood::Calm => "😊",
            Mood::Okay => "🙂",
            Mood::Anxious => "😟",
            Mood::Sad => "😢",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Okay => "Okay",
            Mood::Sad => "Sad",
            Mood::Anxious => "Anxious",
            Mood::Calm => "Calm",
        }
    }

    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Mood::Happy => (74, 222, 128),
            Mood::Calm => (96, 165, 250),
            Mood::Okay => (250, 204, 21),
            Mood::Anxious => (192, 132, 252),
            Mood::Sad => (156, 163, 175),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub date: NaiveDate,
    pub mood: Mood,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub username: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Helpline {
    pub name: &'static str,
    pub number: &'static str,
    pub description: &'static str,
}

pub const HELPLINES: [Helpline; 4] = [
    Helpline {
        name: "Vandrevala Foundation",
        number: "9999666555",
        description: "24/7 crisis intervention",
    },
    Helpline {
        name: "iCall",
        number: "9152987821",
        description: "Mon-Sat, 10 AM - 8 PM",
    },
    Helpline {
        name: "Connecting Trust",
        number: "+919922001122",
        description: "12 PM - 8 PM, all days",
    },
    Helpline {
        name: "AASRA",
        number: "9820466726",
        description: "24/7 emotional support for those in distress",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_form() {
        let profile = UserProfile::from_form("  Asha ", "29", "female").unwrap();
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.age, 29);

        assert_eq!(
            UserProfile::from_form("   ", "29", "female"),
            Err(ProfileError::EmptyName)
        );
        assert_eq!(
            UserProfile::from_form("Asha", "twenty", "female"),
            Err(ProfileError::InvalidAge)
        );
        assert_eq!(
            UserProfile::from_form("Asha", "0", "female"),
            Err(ProfileError::InvalidAge)
        );
        assert_eq!(
            UserProfile::from_form("Asha", "29", ""),
            Err(ProfileError::MissingGender)
        );
    }

    #[test]
    fn test_message_wire_shape() {
        let msg = Message {
            id: "1".into(),
            text: "hi".into(),
            sender: Sender::Ai,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "ai");
    }

    #[test]
    fn test_journal_entry_reads_js_iso_dates() {
        let raw = r#"{"id":"1","date":"2024-05-01T10:00:00.000Z","content":"ok","sentiment":"negative"}"#;
        let entry: JournalEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.sentiment, Sentiment::Negative);
        assert_eq!(entry.date.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_mood_entry_date_format() {
        let entry: MoodEntry =
            serde_json::from_str(r#"{"date":"2024-05-01","mood":"Calm"}"#).unwrap();
        assert_eq!(entry.mood.level(), 4);
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_sentiment_parse() {
        assert_eq!(Sentiment::parse(" Positive\n"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse("neutral"), None);
    }
}
