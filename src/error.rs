// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::TokenError;
use crate::database::DatabaseError;
use crate::services::aplicativo_service::AplicativoError;
use crate::services::mail_service::MailError;
use crate::services::nota_service::NotaError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 428 Precondition Required (destructive call without confirmation)
    ConfirmationRequired {
        message: String,
        candidates: usize,
    },

    // 500 Internal Server Error, operator-facing deployment defect
    Configuration {
        message: String,
        missing: Vec<String>,
    },

    // 500 Internal Server Error, with the underlying driver/transport text
    InternalServerError {
        message: String,
        detail: Option<String>,
    },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ConfirmationRequired { .. } => StatusCode::PRECONDITION_REQUIRED,
            ApiError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::ConfirmationRequired { message, .. } => message,
            ApiError::Configuration { message, .. } => message,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ConfirmationRequired { .. } => "CONFIRMATION_REQUIRED",
            ApiError::Configuration { .. } => "CONFIGURATION_ERROR",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::ConfirmationRequired { candidates, .. } => {
                response["candidates"] = json!(candidates);
            }
            ApiError::Configuration { missing, .. } => {
                response["missingVariables"] = json!(missing);
            }
            ApiError::InternalServerError {
                detail: Some(detail),
                ..
            } => {
                response["error"] = json!(detail);
            }
            _ => {}
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>, detail: Option<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            detail,
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing | TokenError::Malformed | TokenError::Expired => {
                ApiError::unauthorized(err.to_string())
            }
            TokenError::SecretNotConfigured => {
                tracing::error!("JWT secret is not configured; set JWT_SECRET");
                ApiError::Configuration {
                    message: err.to_string(),
                    missing: vec!["JWT_SECRET".to_string()],
                }
            }
            TokenError::Invalid(reason) => {
                tracing::warn!("Rejected bearer token: {}", reason);
                ApiError::forbidden("Invalid token")
            }
            TokenError::Generation(msg) => ApiError::internal_server_error("Failed to issue token", Some(msg)),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(name) => ApiError::Configuration {
                message: "Database is not configured".to_string(),
                missing: vec![name.to_string()],
            },
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::ServiceUnavailable("Database temporarily unavailable".to_string())
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("Database error occurred", Some(other.to_string()))
            }
        }
    }
}

impl From<NotaError> for ApiError {
    fn from(err: NotaError) -> Self {
        match err {
            NotaError::Validation { message, field_errors } => {
                ApiError::validation_error(message, Some(field_errors))
            }
            NotaError::NotFound(id) => ApiError::not_found(format!("Nota {} not found", id)),
            NotaError::PlantillaNotAvailable(id) => {
                ApiError::not_found(format!("Plantilla {} not found or not available", id))
            }
            NotaError::ConfirmationRequired { candidates } => ApiError::ConfirmationRequired {
                message: format!(
                    "{} template(s) would be deleted; resend with ?confirmar=true",
                    candidates
                ),
                candidates,
            },
            NotaError::Database(e) => DatabaseError::Sqlx(e).into(),
        }
    }
}

impl From<AplicativoError> for ApiError {
    fn from(err: AplicativoError) -> Self {
        match err {
            AplicativoError::Validation { message, field_errors } => {
                ApiError::validation_error(message, Some(field_errors))
            }
            AplicativoError::NotFound(id) => ApiError::not_found(format!("Aplicativo {} not found", id)),
            AplicativoError::Database(e) => DatabaseError::Sqlx(e).into(),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::MissingConfig(missing) => ApiError::Configuration {
                message: "SMTP configuration incomplete".to_string(),
                missing: missing.into_iter().map(String::from).collect(),
            },
            MailError::InvalidConfig(msg) => ApiError::Configuration {
                message: format!("SMTP configuration invalid: {}", msg),
                missing: Vec::new(),
            },
            MailError::Validation { message, field_errors } => {
                ApiError::validation_error(message, Some(field_errors))
            }
            MailError::Address(msg) => ApiError::validation_error(msg, None),
            MailError::Build(msg) => {
                tracing::error!("Failed to build mail message: {}", msg);
                ApiError::internal_server_error("Failed to build mail message", Some(msg))
            }
            MailError::Delivery(msg) => {
                tracing::error!("Mail delivery failed: {}", msg);
                ApiError::internal_server_error("Internal error while sending mail", Some(msg))
            }
            MailError::Verification(msg) => {
                tracing::error!("SMTP verification failed: {}", msg);
                ApiError::internal_server_error(
                    "SMTP verification failed; check host, port and credentials",
                    Some(msg),
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
