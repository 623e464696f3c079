use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failure kinds of the query pipeline. Each request either completes or
/// short-circuits into exactly one of these; there are no partial results.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unsupported LLM model selected: '{0}'")]
    UnsupportedModel(String),

    #[error("No API key configured for provider '{0}'")]
    MissingCredential(&'static str),

    #[error("LLM query failed ({provider}): {message}")]
    LlmFailed {
        provider: &'static str,
        message: String,
    },

    #[error("Failed to parse LLM output: {reason}\n{raw}")]
    MalformedOutput { reason: String, raw: String },

    #[error("Northwind query failed: {status} - {body}")]
    DataService { status: u16, body: String },
}

#[derive(serde::Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::UnsupportedModel(_) => StatusCode::BAD_REQUEST,
            QueryError::MissingCredential(_) => StatusCode::BAD_REQUEST,
            QueryError::LlmFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            QueryError::MalformedOutput { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            // Mirror the downstream status when it is a valid HTTP code
            QueryError::DataService { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        };

        let body = ErrorBody {
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
