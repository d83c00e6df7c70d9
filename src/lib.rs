pub mod client;
pub mod error;
pub mod model;
pub mod routes;
pub mod utils;

pub use client::{render_report, ClientError, DiagnosisClient, ImageUpload};
pub use error::{ApiError, ErrorResponse};
pub use model::{Diagnosis, Model, ModelError, Prediction};
pub use routes::{build_app, AppState};
pub use utils::{Config, ConfigError};
