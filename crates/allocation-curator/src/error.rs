use crate::config::ConfigError;
use crate::curation::modification::ModificationError;
use crate::curation::rules::{InvalidRule, PriorityError};
use crate::curation::search::SearchError;
use crate::export::ExportError;
use crate::ingest::ImportError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("import failed: {0}")]
    Import(#[from] ImportError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("modification rejected: {0}")]
    Modification(#[from] ModificationError),
    #[error("invalid rule: {0}")]
    Rule(#[from] InvalidRule),
    #[error("invalid search filters: {0}")]
    Search(#[from] SearchError),
    #[error("invalid priorities: {0}")]
    Priority(#[from] PriorityError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Import(_)
            | AppError::Modification(_)
            | AppError::Rule(_)
            | AppError::Search(_)
            | AppError::Priority(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Export(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
