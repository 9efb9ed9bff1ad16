use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Datelike;
use serde::Deserialize;

use crate::dto::{CalendarResponse, MonthRef};
use crate::error::{AppError, AppResult};
use crate::models::mood::MoodFilterQuery;
use crate::stats::{self, MoodSummary, TrendPoint};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub emoji: Option<String>,
}

pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<MoodSummary>> {
    let store = state.store.read().await;
    Ok(Json(stats::summarize(store.list_all(), super::today())))
}

pub async fn get_trend(State(state): State<AppState>) -> AppResult<Json<Vec<TrendPoint>>> {
    let store = state.store.read().await;
    Ok(Json(stats::trend_series(store.list_all(), super::today())))
}

/// Month grid for the calendar view. Defaults to the current month.
pub async fn get_calendar(
    State(state): State<AppState>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> AppResult<Json<CalendarResponse>> {
    let Query(query) = query?;
    let today = super::today();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    let filter = MoodFilterQuery { emoji: query.emoji }.category()?;

    let grid = stats::calendar_grid(year, month, state.config.week_start)
        .ok_or_else(|| AppError::Validation(format!("Invalid month: {year}-{month}")))?;

    let view = {
        let store = state.store.read().await;
        stats::month_view(&grid, store.list_all(), filter)
    };

    let month_ref = |delta| {
        stats::shift_month(year, month, delta).map(|(year, month)| MonthRef { year, month })
    };

    Ok(Json(CalendarResponse {
        view,
        previous: month_ref(-1),
        next: month_ref(1),
    }))
}
