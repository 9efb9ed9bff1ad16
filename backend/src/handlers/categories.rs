use axum::{extract::Path, Json};

use crate::dto::CategoryResponse;
use crate::models::mood::MoodCategory;

pub async fn list_categories() -> Json<Vec<CategoryResponse>> {
    Json(MoodCategory::ALL.into_iter().map(CategoryResponse::from).collect())
}

/// Never 404s: unknown names get the default color and icon.
pub async fn get_category(Path(name): Path<String>) -> Json<CategoryResponse> {
    Json(CategoryResponse::lookup(&name))
}
