//! Translation from backend error identifiers to HTTP status codes and user-facing messages.
//!
//! The table is static and only consulted at the request/response boundary. Vendor codes
//! (ORM error codes, SQLSTATE values, JWT library error names) map to the same entries as
//! their symbolic names.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassification {
    pub http_status: u16,
    pub message: &'static str,
}

const INTERNAL: ErrorClassification = ErrorClassification {
    http_status: 500,
    message: "Internal server error",
};

const DATABASE: ErrorClassification = ErrorClassification {
    http_status: 500,
    message: "Database operation failed",
};

const CLASSIFICATIONS: &[(&[&str], ErrorClassification)] = &[
    (
        &["unique_violation", "P2002", "23505"],
        ErrorClassification {
            http_status: 409,
            message: "A record with the same unique value already exists",
        },
    ),
    (
        &["not_found", "P2025"],
        ErrorClassification {
            http_status: 404,
            message: "Record not found",
        },
    ),
    (
        &["write_conflict", "P2034", "40001"],
        ErrorClassification {
            http_status: 409,
            message: "The record was modified by another request",
        },
    ),
    (
        &["foreign_key_violation", "P2003", "23503"],
        ErrorClassification {
            http_status: 400,
            message: "Referenced record does not exist",
        },
    ),
    (
        &["not_null_violation", "P2011", "23502"],
        ErrorClassification {
            http_status: 400,
            message: "A required field is null",
        },
    ),
    (
        &["missing_required_value", "P2012"],
        ErrorClassification {
            http_status: 400,
            message: "A required value is missing",
        },
    ),
    (
        &["missing_required_argument", "P2013"],
        ErrorClassification {
            http_status: 400,
            message: "A required argument is missing",
        },
    ),
    (
        &["token_invalid", "JsonWebTokenError"],
        ErrorClassification {
            http_status: 401,
            message: "Invalid token",
        },
    ),
    (
        &["token_expired", "TokenExpiredError"],
        ErrorClassification {
            http_status: 401,
            message: "Token expired",
        },
    ),
    (
        &["validation_error", "ValidationError"],
        ErrorClassification {
            http_status: 400,
            message: "Validation failed",
        },
    ),
];

fn lookup(code: &str) -> Option<ErrorClassification> {
    CLASSIFICATIONS
        .iter()
        .find(|(codes, _)| codes.iter().any(|candidate| *candidate == code))
        .map(|(_, classification)| *classification)
}

pub fn classify(code: &str) -> ErrorClassification {
    lookup(code).unwrap_or(INTERNAL)
}

/// Same table, with the persistence-layer fallback for unrecognized codes.
pub fn classify_persistence(code: &str) -> ErrorClassification {
    lookup(code).unwrap_or(DATABASE)
}

/// Uniform failure body: `{ success: false, error: { message, statusCode }, timestamp }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub status_code: u16,
}

impl ErrorEnvelope {
    /// `detail` replaces the table message when the caller has something more specific.
    pub fn new(classification: ErrorClassification, detail: Option<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                message: detail.unwrap_or_else(|| classification.message.to_string()),
                status_code: classification.http_status,
            },
            timestamp: Utc::now(),
        }
    }

    pub fn from_code(code: &str, detail: Option<String>) -> Self {
        Self::new(classify(code), detail)
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
