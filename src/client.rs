//! HTTP client for the prediction service and the text report shown to the
//! user.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use reqwest::{multipart, StatusCode};
use thiserror::Error;

use crate::{error::ErrorResponse, model::Prediction};

pub const DEFAULT_SERVER: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not connect to the backend server at {url}. Please make sure the backend is running.")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("An error occurred: {0}")]
    Request(#[source] reqwest::Error),
    #[error("The backend returned {status}: {}", .detail.as_deref().unwrap_or("no details"))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("Failed to parse the response from the backend.")]
    Decode(#[source] reqwest::Error),
    #[error("Could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported file {}: upload a jpg, jpeg or png image", .0.display())]
    UnsupportedFile(PathBuf),
    #[error("Invalid content type {0:?}")]
    InvalidContentType(String),
}

/// The bytes, file name and declared content type sent to the service.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Reads an image from disk. Only JPEG and PNG files are accepted; the
    /// content type is derived from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content_type = content_type_for(path)
            .ok_or_else(|| ClientError::UnsupportedFile(path.to_path_buf()))?;
        Self::from_path_as(path, content_type).await
    }

    /// Reads any file and declares it with the given content type, skipping
    /// the extension check.
    pub async fn from_path_as(
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|source| ClientError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(file_name, content_type, data))
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?;
    match ImageFormat::from_extension(extension)? {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        _ => None,
    }
}

pub struct DiagnosisClient {
    http: reqwest::Client,
    base_url: String,
}

impl DiagnosisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict/", self.base_url)
    }

    /// Uploads the image and decodes the diagnosis. Nothing is retried.
    pub async fn diagnose(&self, upload: ImageUpload) -> Result<Prediction, ClientError> {
        let url = self.predict_url();

        let part = multipart::Part::bytes(upload.data)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|_| ClientError::InvalidContentType(upload.content_type.clone()))?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(%url, content_type = %upload.content_type, "sending upload");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| {
                if source.is_connect() {
                    ClientError::Connection {
                        url: url.clone(),
                        source,
                    }
                } else {
                    ClientError::Request(source)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .map(|body| body.detail);
            return Err(ClientError::Status { status, detail });
        }

        response.json::<Prediction>().await.map_err(ClientError::Decode)
    }
}

/// Markdown report for a successful diagnosis.
pub fn render_report(prediction: &Prediction) -> String {
    format!(
        "Diagnosis Complete!\n\n## Diagnosis: {}\nConfidence: **{:.2}%**\n\n## Treatment Plan\n{}\n",
        prediction.disease,
        prediction.confidence,
        prediction.treatment.trim(),
    )
}
