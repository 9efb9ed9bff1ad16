use anyhow::Context;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod stats;
mod storage;
mod store;

use config::{Config, StorageBackend};
use storage::{BlobStore, FileBlobStore, MemoryBlobStore};
use store::MoodStore;

#[derive(Clone)]
pub struct AppState {
    /// The one store for the process. Writers hold the lock across mutate + save.
    pub store: Arc<RwLock<MoodStore>>,
    pub config: Arc<Config>,
    pub ws_tx: Option<broadcast::Sender<String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Storage
    let blobs: Box<dyn BlobStore> = match config.storage_backend {
        StorageBackend::File => {
            let files = FileBlobStore::new(&config.data_dir).with_context(|| {
                format!("Failed to open data directory {}", config.data_dir.display())
            })?;
            tracing::info!(data_dir = %files.dir().display(), "Using file storage");
            Box::new(files)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, moods will not survive a restart");
            Box::new(MemoryBlobStore::new())
        }
    };
    let store = MoodStore::open(blobs, config.storage_key.clone());

    // WebSocket broadcast channel
    let (ws_tx, _) = broadcast::channel::<String>(256);

    let state = AppState {
        store: Arc::new(RwLock::new(store)),
        config: config.clone(),
        ws_tx: Some(ws_tx),
    };

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .context("FRONTEND_URL is not a valid origin")?];
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    let app = app(state).layer(cors).layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        // Moods
        .route(
            "/api/moods",
            get(handlers::moods::list_moods).post(handlers::moods::add_mood),
        )
        .route(
            "/api/moods/:id",
            get(handlers::moods::get_mood)
                .put(handlers::moods::edit_mood)
                .delete(handlers::moods::delete_mood),
        )
        .route(
            "/api/moods/by-date/:date",
            get(handlers::moods::get_mood_by_date),
        )
        // Presentation tokens
        .route("/api/categories", get(handlers::categories::list_categories))
        .route(
            "/api/categories/:name",
            get(handlers::categories::get_category),
        )
        // Derived views
        .route("/api/stats", get(handlers::stats::get_stats))
        .route("/api/stats/trend", get(handlers::stats::get_trend))
        .route("/api/calendar", get(handlers::stats::get_calendar))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Days, Local, NaiveDate};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app(blobs: &MemoryBlobStore) -> Router {
        let store = MoodStore::open(Box::new(blobs.clone()), store::DEFAULT_STORAGE_KEY);
        app(AppState {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(Config::for_tests()),
            ws_tx: None,
        })
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app(&MemoryBlobStore::new());
        let (status, json) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_add_upserts_by_date() {
        let app = test_app(&MemoryBlobStore::new());
        let date = today().to_string();

        let (status, first) = send(
            &app,
            "POST",
            "/api/moods",
            Some(json!({ "date": date, "emoji": "happy", "note": "walk" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "created");
        assert_eq!(first["durable"], true);

        let (_, second) = send(
            &app,
            "POST",
            "/api/moods",
            Some(json!({ "date": date, "emoji": "sad" })),
        )
        .await;
        assert_eq!(second["status"], "updated");
        assert_eq!(second["mood"]["id"], first["mood"]["id"]);
        assert_eq!(second["mood"]["note"], "");

        let (status, found) = send(&app, "GET", &format!("/api/moods/by-date/{date}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["emoji"], "sad");

        let (_, all) = send(&app, "GET", "/api/moods", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_without_date_uses_today() {
        let app = test_app(&MemoryBlobStore::new());
        let (status, json) = send(&app, "POST", "/api/moods", Some(json!({ "emoji": "sleepy" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["mood"]["date"], today().to_string());
    }

    #[tokio::test]
    async fn test_future_date_is_rejected() {
        let blobs = MemoryBlobStore::new();
        let app = test_app(&blobs);
        let tomorrow = today().checked_add_days(Days::new(1)).unwrap();

        let (status, json) = send(
            &app,
            "POST",
            "/api/moods",
            Some(json!({ "date": tomorrow.to_string(), "emoji": "happy" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], 422);

        let (_, all) = send(&app, "GET", "/api/moods", None).await;
        assert!(all.as_array().unwrap().is_empty());
        assert!(blobs.get(store::DEFAULT_STORAGE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let app = test_app(&MemoryBlobStore::new());
        let (status, _) = send(&app, "POST", "/api/moods", Some(json!({ "emoji": "ecstatic" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, "GET", "/api/moods?emoji=ecstatic", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_overlong_note_is_rejected() {
        let app = test_app(&MemoryBlobStore::new());
        let note = "x".repeat(1001);
        let (status, _) = send(
            &app,
            "POST",
            "/api/moods",
            Some(json!({ "emoji": "happy", "note": note })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_edit_and_delete_unknown_ids_are_noops() {
        let app = test_app(&MemoryBlobStore::new());
        let id = uuid::Uuid::new_v4();

        let (status, json) = send(
            &app,
            "PUT",
            &format!("/api/moods/{id}"),
            Some(json!({ "emoji": "angry" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["updated"], false);
        assert!(json["mood"].is_null());

        let (status, json) = send(&app, "DELETE", &format!("/api/moods/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], false);
    }

    #[tokio::test]
    async fn test_edit_then_delete() {
        let app = test_app(&MemoryBlobStore::new());
        let (_, created) = send(
            &app,
            "POST",
            "/api/moods",
            Some(json!({ "emoji": "neutral", "note": "meh" })),
        )
        .await;
        let id = created["mood"]["id"].as_str().unwrap().to_string();

        let (_, edited) = send(
            &app,
            "PUT",
            &format!("/api/moods/{id}"),
            Some(json!({ "note": "better" })),
        )
        .await;
        assert_eq!(edited["updated"], true);
        assert_eq!(edited["mood"]["emoji"], "neutral");
        assert_eq!(edited["mood"]["note"], "better");

        let (_, deleted) = send(&app, "DELETE", &format!("/api/moods/{id}"), None).await;
        assert_eq!(deleted["deleted"], true);

        let (status, _) = send(&app, "GET", &format!("/api/moods/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_date_is_404() {
        let app = test_app(&MemoryBlobStore::new());
        let (status, json) = send(&app, "GET", "/api/moods/by-date/2020-01-01", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], 404);
    }

    #[tokio::test]
    async fn test_category_lookup_never_fails() {
        let app = test_app(&MemoryBlobStore::new());
        let (status, json) = send(&app, "GET", "/api/categories/unknown", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["color"], "bg-gray-200");
        assert_eq!(json["known"], false);

        let (_, all) = send(&app, "GET", "/api/categories", None).await;
        assert_eq!(all.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_stats_and_trend() {
        let app = test_app(&MemoryBlobStore::new());
        let two_days_ago = today().checked_sub_days(Days::new(2)).unwrap();
        send(&app, "POST", "/api/moods", Some(json!({ "emoji": "happy" }))).await;
        send(
            &app,
            "POST",
            "/api/moods",
            Some(json!({ "date": two_days_ago.to_string(), "emoji": "happy" })),
        )
        .await;

        let (_, stats) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(stats["total_entries"], 2);
        assert_eq!(stats["most_frequent"]["emoji"], "happy");
        assert_eq!(stats["most_frequent"]["count"], 2);

        let (_, trend) = send(&app, "GET", "/api/stats/trend", None).await;
        let values: Vec<Value> = trend
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["value"].clone())
            .collect();
        assert_eq!(values.len(), 7);
        assert_eq!(values[4], 5);
        assert_eq!(values[6], 5);
        assert_eq!(values.iter().filter(|v| v.is_null()).count(), 5);
    }

    #[tokio::test]
    async fn test_calendar_view() {
        let app = test_app(&MemoryBlobStore::new());
        send(
            &app,
            "POST",
            "/api/moods",
            Some(json!({ "date": "2024-03-02", "emoji": "sad" })),
        )
        .await;

        let (status, json) = send(&app, "GET", "/api/calendar?year=2024&month=3&emoji=happy", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["leading_blanks"], 5);
        assert_eq!(json["cells"].as_array().unwrap().len(), 31);
        assert_eq!(json["cells"][1]["mood"]["emoji"], "sad");
        assert_eq!(json["cells"][1]["visible"], false);
        assert_eq!(json["previous"], json!({ "year": 2024, "month": 2 }));
        assert_eq!(json["next"], json!({ "year": 2024, "month": 4 }));

        let (status, _) = send(&app, "GET", "/api/calendar?year=2024&month=13", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_readyz_reports_failed_storage() {
        let blobs = MemoryBlobStore::new();
        let app = test_app(&blobs);
        let (status, _) = send(&app, "GET", "/readyz", None).await;
        assert_eq!(status, StatusCode::OK);

        blobs.set_fail_writes(true);
        let (status, json) = send(&app, "POST", "/api/moods", Some(json!({ "emoji": "happy" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["durable"], false);

        let (status, json) = send(&app, "GET", "/readyz", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["entries"], 1);
    }
}
