// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponseBody {
    pub error: ErrorBody,
}

/// Error taxonomy shared by the DNS service, the bot, and the RPC surface.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    #[error("dns record not found: {0}")]
    RecordNotFound(String),

    #[error("invalid dns record: {0}")]
    InvalidRecord(String),

    #[error("dns record already exists: {0}")]
    DuplicateRecord(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl DnsError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        DnsError::BadRequest(msg.into())
    }

    /// Stable machine-readable code used in RPC error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            DnsError::ZoneNotFound(_) => "zone_not_found",
            DnsError::RecordNotFound(_) => "record_not_found",
            DnsError::InvalidRecord(_) => "invalid_record",
            DnsError::DuplicateRecord(_) => "duplicate_record",
            DnsError::Unauthorized => "unauthorized",
            DnsError::BadRequest(_) => "bad_request",
            DnsError::Backend(_) => "backend_error",
        }
    }
}

impl IntoResponse for DnsError {
    fn into_response(self) -> Response {
        let status = match &self {
            DnsError::ZoneNotFound(_) | DnsError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            DnsError::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DnsError::DuplicateRecord(_) => StatusCode::CONFLICT,
            DnsError::Unauthorized => StatusCode::UNAUTHORIZED,
            DnsError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DnsError::Backend(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(ErrorResponseBody {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        });
        (status, body).into_response()
    }
}
