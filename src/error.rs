//! Error handling for the CardioCare API
//!
//! Every handler and service returns [`ApiError`]. The [`ResponseError`]
//! impl maps each variant to a status code and a `{success, message}` body,
//! so no failure reaches the client as a raw stack trace.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub const NO_TOKEN: &str = "Access denied. No token provided.";
pub const AUTHENTICATION_FAILED: &str = "Authentication failed.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired token (401)
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated but wrong role (403)
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent (404)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (409)
    #[error("{0}")]
    Conflict(String),

    /// The risk-prediction service failed (502)
    #[error("{0}")]
    Upstream(String),

    /// Anything unexpected (500); `detail` is echoed for diagnostics
    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn authentication_failed() -> Self {
        Self::Unauthenticated(AUTHENTICATION_FAILED.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Internal { message, detail } => json!({
                "success": false,
                "message": message,
                "error": detail,
            }),
            other => json!({
                "success": false,
                "message": other.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match unique_violation_field(&err) {
            Some(field) => ApiError::Conflict(format!("A record with this {} already exists.", field)),
            None => {
                tracing::error!(error = %err, "database error");
                ApiError::internal("Server error.", err)
            }
        }
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ApiError::internal("Server error.", err)
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Column named by a unique violation, e.g. `email` for
/// "UNIQUE constraint failed: patients.email".
pub fn unique_violation_field(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(column_from_message(db.message()).to_string())
        }
        _ => None,
    }
}

fn column_from_message(message: &str) -> &str {
    let columns = message.rsplit(": ").next().unwrap_or(message);
    let first = columns.split(',').next().unwrap_or(columns).trim();
    first.rsplit('.').next().unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn column_is_taken_from_sqlite_message() {
        assert_eq!(column_from_message("UNIQUE constraint failed: patients.email"), "email");
        assert_eq!(
            column_from_message("UNIQUE constraint failed: patients.phone_number, patients.email"),
            "phone_number"
        );
        assert_eq!(column_from_message("email"), "email");
    }

    #[test]
    fn variants_map_to_status_codes() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::authentication_failed().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Upstream("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::internal("x", "y").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn internal_error_body_carries_detail() {
        let response = ApiError::internal("Server error.", "disk full").error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Server error.");
        assert_eq!(value["error"], "disk full");
    }

    #[actix_web::test]
    async fn client_error_body_has_no_detail() {
        let response = ApiError::conflict("User with this email already exists.").error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "User with this email already exists.");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn row_not_found_is_internal() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::Internal { .. }));
    }
}
