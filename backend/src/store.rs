//! # Mood store
//!
//! Owns every [`MoodRecord`] and is the only thing that mutates them. Each
//! mutator finishes with an explicit [`MoodStore::save`], so the persisted blob
//! is rewritten inside the same call that changed memory.
//!
//! Rules:
//! - at most one record per date; `add_mood` on an existing date overwrites
//!   that record's category and note and keeps its id
//! - no entries after today
//! - edit/delete of an unknown id is a silent no-op (`None`), never an error
//! - a failed write keeps memory authoritative and marks the store non-durable

use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::models::mood::{MoodCategory, MoodPatch, MoodRecord};
use crate::storage::BlobStore;

pub const DEFAULT_STORAGE_KEY: &str = "moods";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoodError {
    #[error("Cannot log a mood for {date}, it is after today ({today})")]
    InvalidDate { date: NaiveDate, today: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Created(MoodRecord),
    Updated(MoodRecord),
}

impl AddOutcome {
    pub fn record(&self) -> &MoodRecord {
        match self {
            AddOutcome::Created(r) | AddOutcome::Updated(r) => r,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            AddOutcome::Created(_) => "created",
            AddOutcome::Updated(_) => "updated",
        }
    }
}

pub struct MoodStore {
    storage: Box<dyn BlobStore>,
    key: String,
    moods: Vec<MoodRecord>,
    durable: bool,
}

impl MoodStore {
    /// Rehydrates from `key`. Missing, unreadable or corrupt blobs all start
    /// the session with an empty collection.
    pub fn open(storage: Box<dyn BlobStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (moods, durable) = match storage.load(&key) {
            Ok(None) => {
                tracing::info!(key = %key, "No saved moods, starting empty");
                (Vec::new(), true)
            }
            Ok(Some(raw)) => match serde_json::from_str::<Vec<MoodRecord>>(&raw) {
                Ok(loaded) => (dedupe_by_date(loaded), true),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Saved moods are malformed, starting empty");
                    (Vec::new(), true)
                }
            },
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to read saved moods, starting empty");
                (Vec::new(), false)
            }
        };

        tracing::info!(
            key = %key,
            backend = %storage.describe(),
            count = moods.len(),
            "Mood store opened"
        );

        Self {
            storage,
            key,
            moods,
            durable,
        }
    }

    /// Upsert by date against the local calendar's today.
    pub fn add_mood(
        &mut self,
        date: NaiveDate,
        category: MoodCategory,
        note: String,
    ) -> Result<AddOutcome, MoodError> {
        self.add_mood_as_of(Local::now().date_naive(), date, category, note)
    }

    pub fn add_mood_as_of(
        &mut self,
        today: NaiveDate,
        date: NaiveDate,
        category: MoodCategory,
        note: String,
    ) -> Result<AddOutcome, MoodError> {
        if date > today {
            tracing::debug!(%date, %today, "Rejected future-dated mood");
            return Err(MoodError::InvalidDate { date, today });
        }

        let outcome = match self.moods.iter_mut().find(|m| m.date == date) {
            Some(existing) => {
                existing.category = category;
                existing.note = note;
                AddOutcome::Updated(existing.clone())
            }
            None => {
                let record = MoodRecord {
                    id: Uuid::new_v4(),
                    date,
                    category,
                    note,
                };
                self.moods.push(record.clone());
                AddOutcome::Created(record)
            }
        };

        tracing::debug!(
            id = %outcome.record().id,
            %date,
            emoji = %category,
            status = outcome.status(),
            "Mood saved"
        );
        self.save();
        Ok(outcome)
    }

    /// Merges `patch` into the record with `id`. Unknown ids return `None` and
    /// leave both memory and storage untouched.
    pub fn edit_mood(&mut self, id: Uuid, patch: MoodPatch) -> Option<MoodRecord> {
        let record = self.moods.iter_mut().find(|m| m.id == id)?;
        if let Some(category) = patch.category {
            record.category = category;
        }
        if let Some(note) = patch.note {
            record.note = note;
        }
        let updated = record.clone();

        tracing::debug!(id = %id, "Mood edited");
        self.save();
        Some(updated)
    }

    pub fn delete_mood(&mut self, id: Uuid) -> Option<MoodRecord> {
        let idx = self.moods.iter().position(|m| m.id == id)?;
        let removed = self.moods.remove(idx);

        tracing::debug!(id = %id, date = %removed.date, "Mood deleted");
        self.save();
        Some(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<&MoodRecord> {
        self.moods.iter().find(|m| m.id == id)
    }

    pub fn get_by_date(&self, date: NaiveDate) -> Option<&MoodRecord> {
        self.moods.iter().find(|m| m.date == date)
    }

    /// Insertion order, not date order.
    pub fn list_all(&self) -> &[MoodRecord] {
        &self.moods
    }

    pub fn filter_by_category(&self, category: MoodCategory) -> Vec<&MoodRecord> {
        self.moods
            .iter()
            .filter(|m| m.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.moods.len()
    }

    /// `false` while the last load or write failed.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn backend(&self) -> String {
        self.storage.describe()
    }

    /// Rewrites the whole collection under the store's key.
    fn save(&mut self) {
        let serialized = match serde_json::to_string(&self.moods) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize moods");
                self.durable = false;
                return;
            }
        };

        match self.storage.save(&self.key, &serialized) {
            Ok(()) => {
                if !self.durable {
                    tracing::info!(key = %self.key, "Mood persistence restored");
                }
                self.durable = true;
            }
            Err(e) => {
                tracing::error!(
                    key = %self.key,
                    error = %e,
                    "Failed to persist moods, keeping changes in memory only"
                );
                self.durable = false;
            }
        }
    }
}

/// Blobs written by older builds may hold several entries for one date. The
/// later entry wins, applied onto the first one's id.
fn dedupe_by_date(loaded: Vec<MoodRecord>) -> Vec<MoodRecord> {
    let total = loaded.len();
    let mut moods: Vec<MoodRecord> = Vec::with_capacity(total);
    for record in loaded {
        match moods.iter_mut().find(|m| m.date == record.date) {
            Some(existing) => {
                existing.category = record.category;
                existing.note = record.note;
            }
            None => moods.push(record),
        }
    }
    if moods.len() != total {
        tracing::warn!(
            dropped = total - moods.len(),
            "Merged duplicate mood entries sharing a date"
        );
    }
    moods
}
