use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use extract::ExtractError;
use ingest::IngestError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadUpload(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl AppError {
    /// Stable machine-readable name for the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadUpload(_) => "bad_upload",
            AppError::Ingest(IngestError::Io(_)) => "intake_io",
            AppError::Ingest(IngestError::Pdf(_)) => "unreadable_pdf",
            AppError::Ingest(IngestError::NoTableFound) => "no_table_found",
            AppError::Extract(ExtractError::Http(e)) if e.is_timeout() => "model_timeout",
            AppError::Extract(ExtractError::Http(_)) => "model_unreachable",
            AppError::Extract(ExtractError::Api { .. }) => "model_api",
            AppError::Extract(ExtractError::MalformedResponse(_)) => "malformed_response",
            AppError::Extract(ExtractError::NoRecordExtracted) => "no_record_extracted",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadUpload(_) => StatusCode::BAD_REQUEST,
            AppError::Ingest(IngestError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Extract(ExtractError::Http(e)) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Extract(ExtractError::NoRecordExtracted) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Extract(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Extraction request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "Extraction request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
