use crate::advisor::AdvisoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// What the presentation layer gets back from one advisory run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdvisoryOutcome {
    Success { text: String },
    UnsupportedType { message: String },
    UpstreamError { detail: String },
}

impl AdvisoryOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdvisoryOutcome::Success { .. } => StatusCode::OK,
            AdvisoryOutcome::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AdvisoryOutcome::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<Result<String, AdvisoryError>> for AdvisoryOutcome {
    fn from(result: Result<String, AdvisoryError>) -> Self {
        match result {
            Ok(text) => AdvisoryOutcome::Success { text },
            Err(err @ AdvisoryError::UnsupportedFileType) => AdvisoryOutcome::UnsupportedType {
                message: err.to_string(),
            },
            Err(AdvisoryError::Upstream(detail)) => AdvisoryOutcome::UpstreamError { detail },
        }
    }
}

impl IntoResponse for AdvisoryOutcome {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
