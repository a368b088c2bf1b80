use crate::error::ApiError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use facematch_core::{Analyzer, FaceImage, MatchReport};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Multipart field carrying the uploaded photo.
pub const USER_IMAGE_FIELD: &str = "user_image";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            started_at: Utc::now(),
        }
    }
}

/// Build the HTTP router: analysis endpoint, health/status and static files.
pub fn router(state: AppState, static_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/analyze-face", post(analyze_face))
        .route("/health", get(health_check))
        .route("/status", get(status))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn analyze_face(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MatchReport>, ApiError> {
    let mut multipart = multipart?;
    let upload = read_user_image(&mut multipart)
        .await?
        .ok_or_else(ApiError::no_image)?;
    tracing::info!(file = %upload.file_name, bytes = upload.bytes.len(), "analyze-face request");

    let report = state.analyzer.analyze(upload).await?;
    Ok(Json(report))
}

/// First `user_image` file part of the form. Other fields, and a
/// `user_image` part without a filename (a plain text field), are skipped.
async fn read_user_image(multipart: &mut Multipart) -> Result<Option<FaceImage>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(USER_IMAGE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        return Ok(Some(FaceImage::new(file_name, bytes.to_vec())));
    }
    Ok(None)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "facematchd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let gallery = state.analyzer.gallery();
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "gallery_dir": gallery.dir().display().to_string(),
        "gallery_size": gallery.len(),
        "comparer": state.analyzer.comparer_name(),
    }))
}
