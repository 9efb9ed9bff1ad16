use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{AddMoodResponse, DeleteResponse, EditMoodResponse, MoodChangedEvent};
use crate::error::{AppError, AppResult};
use crate::models::mood::{AddMoodRequest, MoodFilterQuery, MoodPatch, MoodRecord};
use crate::AppState;

pub async fn list_moods(
    State(state): State<AppState>,
    query: Result<Query<MoodFilterQuery>, QueryRejection>,
) -> AppResult<Json<Vec<MoodRecord>>> {
    let Query(query) = query?;
    let filter = query.category()?;

    let store = state.store.read().await;
    let moods = match filter {
        Some(category) => store
            .filter_by_category(category)
            .into_iter()
            .cloned()
            .collect(),
        None => store.list_all().to_vec(),
    };

    Ok(Json(moods))
}

pub async fn get_mood(
    State(state): State<AppState>,
    Path(mood_id): Path<Uuid>,
) -> AppResult<Json<MoodRecord>> {
    let store = state.store.read().await;
    let mood = store
        .get(mood_id)
        .cloned()
        .ok_or(AppError::NotFound("Mood not found".into()))?;

    Ok(Json(mood))
}

pub async fn get_mood_by_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<MoodRecord>> {
    let store = state.store.read().await;
    let mood = store
        .get_by_date(date)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No mood logged for {date}")))?;

    Ok(Json(mood))
}

/// Upsert by date. A second POST for the same day overwrites it in place.
pub async fn add_mood(
    State(state): State<AppState>,
    body: Result<Json<AddMoodRequest>, JsonRejection>,
) -> AppResult<Json<AddMoodResponse>> {
    let Json(body) = body?;
    body.validate()?;

    let date = body.date.unwrap_or_else(super::today);

    let (outcome, durable) = {
        let mut store = state.store.write().await;
        let outcome = store.add_mood(date, body.category, body.note.unwrap_or_default())?;
        (outcome, store.is_durable())
    };

    broadcast(&state, MoodChangedEvent::new(outcome.status(), outcome.record()));

    Ok(Json(AddMoodResponse {
        status: outcome.status(),
        mood: outcome.record().clone(),
        durable,
    }))
}

/// Unknown ids are not an error: the client may be acting on a stale view.
pub async fn edit_mood(
    State(state): State<AppState>,
    Path(mood_id): Path<Uuid>,
    body: Result<Json<MoodPatch>, JsonRejection>,
) -> AppResult<Json<EditMoodResponse>> {
    let Json(patch) = body?;
    patch.validate()?;

    let (mood, durable) = {
        let mut store = state.store.write().await;
        let mood = store.edit_mood(mood_id, patch);
        (mood, store.is_durable())
    };

    match &mood {
        Some(record) => broadcast(&state, MoodChangedEvent::new("updated", record)),
        None => tracing::debug!(id = %mood_id, "Edit for unknown mood ignored"),
    }

    Ok(Json(EditMoodResponse {
        updated: mood.is_some(),
        mood,
        durable,
    }))
}

pub async fn delete_mood(
    State(state): State<AppState>,
    Path(mood_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let (removed, durable) = {
        let mut store = state.store.write().await;
        let removed = store.delete_mood(mood_id);
        (removed, store.is_durable())
    };

    if let Some(record) = &removed {
        broadcast(&state, MoodChangedEvent::new("deleted", record));
    }

    Ok(Json(DeleteResponse {
        deleted: removed.is_some(),
        id: mood_id,
        durable,
    }))
}

fn broadcast(state: &AppState, event: MoodChangedEvent) {
    let Some(tx) = state.ws_tx.as_ref() else {
        return;
    };
    match serde_json::to_string(&event) {
        // No subscribers is fine.
        Ok(msg) => {
            let _ = tx.send(msg);
        }
        Err(e) => tracing::warn!(error = %e, "Failed to encode mood event"),
    }
}
