use std::{sync::Arc, time::Duration};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    model::{Model, Prediction},
};

const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    pub model: Model,
    pub predict_delay: Duration,
}

impl AppState {
    pub fn new(model: Model, predict_delay: Duration) -> Self {
        Self {
            model,
            predict_delay,
        }
    }
}

/// Maximum accepted request body, in bytes.
#[derive(Debug, Clone, Copy)]
struct UploadLimit(usize);

/// A file pulled out of the multipart body.
#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    content_type: String,
    data: Vec<u8>,
}

pub fn build_app(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/predict/", post(predict_handler))
        .route("/predict", post(predict_handler))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(Extension(UploadLimit(body_limit_bytes)))
        .with_state(state)
        .route("/", get(root))
        .route("/health", get(health_check))
        .fallback(not_found)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "PlantAI Backend API is running!" }))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Extension(limit): Extension<UploadLimit>,
    mut multipart: Multipart,
) -> Result<Json<Prediction>, ApiError> {
    let upload = read_upload(&mut multipart, limit).await?;

    tracing::info!(
        file_name = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        content_type = %upload.content_type,
        bytes = upload.data.len(),
        "received upload"
    );

    tokio::time::sleep(state.predict_delay).await;

    let prediction = state.model.predict(&upload.data).map_err(|err| {
        tracing::error!(error = %err, "prediction failed");
        ApiError::from(err)
    })?;

    tracing::info!(
        disease = %prediction.disease,
        confidence = prediction.confidence,
        "diagnosis ready"
    );

    Ok(Json(prediction))
}

/// Finds the `file` field and checks its declared content type before reading
/// the payload. Other fields are skipped.
async fn read_upload(multipart: &mut Multipart, limit: UploadLimit) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);

        let content_type = match content_type {
            Some(ct) if is_image_content_type(&ct) => ct,
            other => {
                tracing::warn!(
                    file_name = file_name.as_deref().unwrap_or("<unnamed>"),
                    content_type = other.as_deref().unwrap_or("<none>"),
                    "rejected non-image upload"
                );
                return Err(ApiError::InvalidFileType);
            }
        };

        let data = field
            .bytes()
            .await
            .map_err(|err| multipart_error(err, limit))?
            .to_vec();

        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }

    Err(ApiError::MissingFile)
}

/// Keeps the status axum assigns to a multipart failure, so a body that hits
/// the size limit is reported as 413 rather than as malformed.
fn multipart_error(err: MultipartError, limit: UploadLimit) -> ApiError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(limit_bytes = limit.0, "upload exceeds body limit");
        return ApiError::PayloadTooLarge {
            limit_bytes: limit.0,
        };
    }

    ApiError::Multipart {
        status,
        message: err.to_string(),
    }
}

pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
