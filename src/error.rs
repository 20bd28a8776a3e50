// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::error::DbError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<Vec<(String, String)>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::TooManyRequests(_) => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to the `{code, message}` wire body, with an optional `object`
    /// carrying field-level detail.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors: Some(fields) } => {
                let detail: serde_json::Map<String, Value> = fields
                    .iter()
                    .map(|(field, msg)| (field.clone(), Value::String(msg.clone())))
                    .collect();
                json!({
                    "code": self.status_code(),
                    "message": message,
                    "object": detail,
                })
            }
            _ => {
                json!({
                    "code": self.status_code(),
                    "message": self.message(),
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<Vec<(String, String)>>,
    ) -> Self {
        ApiError::ValidationError { message: message.into(), field_errors }
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

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
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
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

/// One mapping rule inside an [`ErrorTable`].
pub struct ErrorRule {
    pub matches: fn(&DbError) -> bool,
    pub status: StatusCode,
    pub message: &'static str,
}

/// Ordered per-route mapping from repository sentinels to HTTP errors.
///
/// Rules are evaluated in order, first match wins. Anything unmatched falls
/// through to a logged 500 with a generic body, so tables only need to name
/// the outcomes a route actually distinguishes.
pub struct ErrorTable {
    rules: &'static [ErrorRule],
}

impl ErrorTable {
    pub const fn new(rules: &'static [ErrorRule]) -> Self {
        Self { rules }
    }

    pub fn resolve(&self, err: DbError) -> ApiError {
        for rule in self.rules {
            if (rule.matches)(&err) {
                return if rule.status == StatusCode::BAD_REQUEST {
                    ApiError::bad_request(rule.message)
                } else if rule.status == StatusCode::NOT_FOUND {
                    ApiError::not_found(rule.message)
                } else if rule.status == StatusCode::CONFLICT {
                    ApiError::conflict(rule.message)
                } else if rule.status == StatusCode::FORBIDDEN {
                    ApiError::forbidden(rule.message)
                } else {
                    ApiError::InternalServerError(rule.message.to_string())
                };
            }
        }
        // Unclassified: log the real error, hand the client a generic 500
        tracing::error!("unclassified repository error: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

/// The mapping shared by plain CRUD routes: missing row, duplicate key, and
/// a row still referenced by (or referencing) another table.
pub static CRUD_ERRORS: ErrorTable = ErrorTable::new(&[
    ErrorRule {
        matches: |e| matches!(e, DbError::NotFound),
        status: StatusCode::NOT_FOUND,
        message: "Record not found",
    },
    ErrorRule {
        matches: |e| matches!(e, DbError::Duplicate(_)),
        status: StatusCode::CONFLICT,
        message: "Record already exists",
    },
    ErrorRule {
        matches: |e| matches!(e, DbError::ForeignKey(_)),
        status: StatusCode::BAD_REQUEST,
        message: "Record is referenced by another record",
    },
]);

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: ErrorTable = ErrorTable::new(&[
        ErrorRule {
            matches: |e| matches!(e, DbError::NotFound),
            status: StatusCode::NOT_FOUND,
            message: "missing",
        },
        ErrorRule {
            matches: |e| matches!(e, DbError::Duplicate(_)),
            status: StatusCode::CONFLICT,
            message: "duplicate",
        },
    ]);

    #[test]
    fn first_matching_rule_wins() {
        let err = TABLE.resolve(DbError::NotFound);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "missing");
    }

    #[test]
    fn unmatched_errors_become_500() {
        let err = TABLE.resolve(DbError::ForeignKey("products_department_id_fkey".into()));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn wire_body_is_code_and_message() {
        let body = ApiError::not_found("Record not found").to_json();
        assert_eq!(body["code"], 404);
        assert_eq!(body["message"], "Record not found");
        assert!(body.get("object").is_none());
    }

    #[test]
    fn validation_body_carries_field_detail() {
        let body = ApiError::validation_error(
            "Invalid fields",
            Some(vec![("email".to_string(), "must not be empty".to_string())]),
        )
        .to_json();
        assert_eq!(body["code"], 400);
        assert_eq!(body["object"]["email"], "must not be empty");
    }
}
