use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ModelError;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid file type. Please upload an image file.")]
    InvalidFileType,
    #[error("Missing required multipart field `file`")]
    MissingFile,
    #[error("Malformed multipart body: {message}")]
    Multipart { status: StatusCode, message: String },
    #[error("Upload exceeds the {} limit", describe_limit(.limit_bytes))]
    PayloadTooLarge { limit_bytes: usize },
    #[error("Prediction failed: {0}")]
    Prediction(#[from] ModelError),
    #[error("Not Found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidFileType => StatusCode::BAD_REQUEST,
            Self::Multipart { status, .. } => *status,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

fn describe_limit(bytes: &usize) -> String {
    const MIB: usize = 1024 * 1024;
    let bytes = *bytes;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else {
        format!("{bytes} byte")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_status_codes() {
        assert_eq!(ApiError::InvalidFileType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Multipart {
                status: StatusCode::BAD_REQUEST,
                message: "eof".into(),
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge { limit_bytes: 1024 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::MissingFile.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(ModelError::EmptyTable).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn prediction_failure_message() {
        let err = ApiError::from(ModelError::EmptyTable);
        assert_eq!(err.to_string(), "Prediction failed: diagnosis table is empty");
    }

    #[test]
    fn payload_too_large_names_the_limit() {
        let err = ApiError::PayloadTooLarge {
            limit_bytes: 5 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "Upload exceeds the 5 MiB limit");

        let err = ApiError::PayloadTooLarge { limit_bytes: 512 };
        assert_eq!(err.to_string(), "Upload exceeds the 512 byte limit");
    }
}
