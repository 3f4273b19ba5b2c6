//! Maps service errors onto HTTP responses.
//!
//! JSON errors have the shape `{"error": <code>, "params": {...}}`.

use crate::domain::LmsError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body is not the expected JSON object. Answered as plain text.
    #[error("JSON unmarshaling failed for http request: {0}")]
    MalformedJson(String),

    /// Service refused the request.
    #[error("{source}")]
    Rejected {
        status: StatusCode,
        #[source]
        source: LmsError,
    },

    #[error("loan_does_not_exist")]
    LoanNotFound,

    #[error("problem getting client with ktpNumber {ktp_number}: {source}")]
    ClientLookup {
        ktp_number: String,
        #[source]
        source: LmsError,
    },
}

impl ApiError {
    /// Status picked from the error kind: unknown client 404, storage 500, business rules 400.
    pub fn from_lms(source: LmsError) -> Self {
        let status = match &source {
            LmsError::ClientNotFound => StatusCode::NOT_FOUND,
            LmsError::Repository { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            LmsError::ClientAlreadyExists { .. } | LmsError::Loan(_) => StatusCode::BAD_REQUEST,
        };
        Self::Rejected { status, source }
    }

    /// Every failure answered with `status`, regardless of kind.
    pub fn with_status(status: StatusCode, source: LmsError) -> Self {
        Self::Rejected { status, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedJson(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::LoanNotFound => StatusCode::NOT_FOUND,
            Self::ClientLookup { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code of the JSON error body. `None` for errors answered as plain text.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::MalformedJson(_) => None,
            Self::Rejected { source, .. } => Some(source.code()),
            Self::LoanNotFound => Some("loan_does_not_exist"),
            Self::ClientLookup { .. } => Some("server_error"),
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Self::Rejected { source, .. } => source.params(),
            Self::ClientLookup { .. } => json!({ "TechnicalError": self.to_string() }),
            Self::MalformedJson(_) | Self::LoanNotFound => json!({}),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonError {
    error: &'static str,
    params: Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "request failed");
        }
        let Some(error) = self.code() else {
            return (status, self.to_string()).into_response();
        };
        let body = Json(JsonError {
            error,
            params: self.params(),
        });
        (status, body).into_response()
    }
}
