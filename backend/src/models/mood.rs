use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Color token used for any category the table below does not know.
pub const DEFAULT_COLOR: &str = "bg-gray-200";

/// Icon path used for any category the table below does not know (no icon).
pub const DEFAULT_ICON: &str = "";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MoodCategory {
    Happy,
    Neutral,
    Sad,
    Angry,
    Sleepy,
}

impl MoodCategory {
    pub const ALL: [MoodCategory; 5] = [
        MoodCategory::Happy,
        MoodCategory::Neutral,
        MoodCategory::Sad,
        MoodCategory::Angry,
        MoodCategory::Sleepy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MoodCategory::Happy => "happy",
            MoodCategory::Neutral => "neutral",
            MoodCategory::Sad => "sad",
            MoodCategory::Angry => "angry",
            MoodCategory::Sleepy => "sleepy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoodCategory::Happy => "Happy",
            MoodCategory::Neutral => "Neutral",
            MoodCategory::Sad => "Sad",
            MoodCategory::Angry => "Angry",
            MoodCategory::Sleepy => "Sleepy",
        }
    }

    /// Value plotted on the trend chart (1 = lowest, 5 = highest).
    pub fn intensity(self) -> u8 {
        match self {
            MoodCategory::Happy => 5,
            MoodCategory::Sleepy => 4,
            MoodCategory::Neutral => 3,
            MoodCategory::Angry => 2,
            MoodCategory::Sad => 1,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            MoodCategory::Happy => "bg-primary",
            MoodCategory::Neutral => "bg-secondary",
            MoodCategory::Sad => "bg-accent",
            MoodCategory::Angry => "bg-red-400",
            MoodCategory::Sleepy => "bg-gray-400",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            MoodCategory::Happy => "/happy.svg",
            MoodCategory::Neutral => "/neutral.svg",
            MoodCategory::Sad => "/sad.svg",
            MoodCategory::Angry => "/angry.svg",
            MoodCategory::Sleepy => "/sleepy.svg",
        }
    }
}

impl fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mood category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for MoodCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoodCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Color token for a raw category name. Never fails.
pub fn color_for(category: &str) -> &'static str {
    category
        .parse::<MoodCategory>()
        .map(MoodCategory::color)
        .unwrap_or(DEFAULT_COLOR)
}

/// Icon path for a raw category name. Never fails.
pub fn icon_for(category: &str) -> &'static str {
    category
        .parse::<MoodCategory>()
        .map(MoodCategory::icon)
        .unwrap_or(DEFAULT_ICON)
}

/// One day's entry. Persisted as `{id, date, emoji, note}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "emoji")]
    pub category: MoodCategory,
    #[serde(default)]
    pub note: String,
}

/// Fields of a record that may change after creation. `id` and `date` never do.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MoodPatch {
    #[serde(rename = "emoji")]
    pub category: Option<MoodCategory>,
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMoodRequest {
    pub date: Option<NaiveDate>,
    #[serde(rename = "emoji")]
    pub category: MoodCategory,
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

/// `emoji=all` (or no parameter) disables the filter.
#[derive(Debug, Deserialize)]
pub struct MoodFilterQuery {
    pub emoji: Option<String>,
}

impl MoodFilterQuery {
    pub fn category(&self) -> Result<Option<MoodCategory>, UnknownCategory> {
        match self.emoji.as_deref() {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for c in MoodCategory::ALL {
            assert_eq!(c.as_str().parse::<MoodCategory>().unwrap(), c);
        }
        assert!("ecstatic".parse::<MoodCategory>().is_err());
    }

    #[test]
    fn test_presentation_lookups_fall_back() {
        assert_eq!(color_for("happy"), "bg-primary");
        assert_eq!(icon_for("sleepy"), "/sleepy.svg");
        assert_eq!(color_for("ecstatic"), DEFAULT_COLOR);
        assert_eq!(icon_for(""), DEFAULT_ICON);
    }

    #[test]
    fn test_intensity_order() {
        let mut ordered = MoodCategory::ALL;
        ordered.sort_by_key(|c| std::cmp::Reverse(c.intensity()));
        assert_eq!(
            ordered,
            [
                MoodCategory::Happy,
                MoodCategory::Sleepy,
                MoodCategory::Neutral,
                MoodCategory::Angry,
                MoodCategory::Sad,
            ]
        );
    }

    #[test]
    fn test_record_uses_emoji_field_name() {
        let record = MoodRecord {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category: MoodCategory::Sad,
            note: String::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["emoji"], "sad");
        assert_eq!(json["date"], "2024-03-01");
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_record_without_note_defaults_to_empty() {
        let json = r#"{"id":"6f1c2b0e-8d4a-4c1e-9a57-0f3a9e1d2c44","date":"2024-03-02","emoji":"happy"}"#;
        let record: MoodRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.note, "");
    }

    #[test]
    fn test_filter_query_all_means_no_filter() {
        let q = MoodFilterQuery { emoji: Some("all".into()) };
        assert_eq!(q.category().unwrap(), None);
        let q = MoodFilterQuery { emoji: Some("angry".into()) };
        assert_eq!(q.category().unwrap(), Some(MoodCategory::Angry));
        let q = MoodFilterQuery { emoji: Some("bogus".into()) };
        assert!(q.category().is_err());
    }
}
