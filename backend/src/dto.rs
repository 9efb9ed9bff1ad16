//! # Moodlog — response DTOs
//!
//! JSON shapes returned to the presentation layer. Request bodies live next to
//! the entity they touch in `models::mood`.
//!
//! Every mutating response carries `durable`: `false` means the change is held
//! in memory only because the last write to storage failed.

use serde::Serialize;
use uuid::Uuid;

use crate::models::mood::{self, MoodCategory, MoodRecord};
use crate::stats::MonthView;

/// POST /api/moods
#[derive(Debug, Serialize)]
pub struct AddMoodResponse {
    /// "created" or "updated"
    pub status: &'static str,
    pub mood: MoodRecord,
    pub durable: bool,
}

/// PUT /api/moods/:id — `updated: false` when the id is unknown
#[derive(Debug, Serialize)]
pub struct EditMoodResponse {
    pub updated: bool,
    pub mood: Option<MoodRecord>,
    pub durable: bool,
}

/// DELETE /api/moods/:id
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
    pub durable: bool,
}

/// GET /api/categories[/:name]
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CategoryResponse {
    pub emoji: String,
    pub known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    pub color: &'static str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
}

impl CategoryResponse {
    pub fn lookup(raw: &str) -> Self {
        let parsed = raw.parse::<MoodCategory>().ok();
        Self {
            emoji: raw.to_string(),
            known: parsed.is_some(),
            label: parsed.map(MoodCategory::label),
            color: mood::color_for(raw),
            icon: mood::icon_for(raw),
            intensity: parsed.map(MoodCategory::intensity),
        }
    }
}

impl From<MoodCategory> for CategoryResponse {
    fn from(c: MoodCategory) -> Self {
        Self::lookup(c.as_str())
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

/// GET /api/calendar
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    #[serde(flatten)]
    pub view: MonthView,
    pub previous: Option<MonthRef>,
    pub next: Option<MonthRef>,
}

/// Pushed to WebSocket subscribers after every successful mutation.
#[derive(Debug, Serialize)]
pub struct MoodChangedEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// "created", "updated" or "deleted"
    pub action: &'static str,
    pub id: Uuid,
    pub date: chrono::NaiveDate,
}

impl MoodChangedEvent {
    pub fn new(action: &'static str, record: &MoodRecord) -> Self {
        Self {
            kind: "mood_changed",
            action,
            id: record.id,
            date: record.date,
        }
    }
}
