use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub type Result<T, E = BookingError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BookingError {
    /// Malformed or out-of-range input. Raised before any mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The pre-check found no free spot or room.
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A concurrent booking won the race for the same resource.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row breaks a model invariant.
    #[error("storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        Self::NotFound(format!("{what} {id} does not exist"))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::CapacityExhausted(_) => "capacity_exhausted",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Database(_) | Self::Storage(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CapacityExhausted(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                format!("{field} ({})", codes.join(", "))
            })
            .collect();
        fields.sort();
        Self::Validation(format!("invalid fields: {}", fields.join("; ")))
    }
}

impl From<JsonRejection> for BookingError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for BookingError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for BookingError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "internal error".to_string()
            }
            Self::Storage(msg) => {
                tracing::error!("storage error: {}", msg);
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Contact {
        #[validate(email)]
        email: String,
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(BookingError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BookingError::not_found("room", 7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BookingError::CapacityExhausted("full".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(BookingError::Conflict("race".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            BookingError::Storage("bad row".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validator_errors_become_validation() {
        let err: BookingError = Contact { email: "not-an-email".into() }
            .validate()
            .unwrap_err()
            .into();
        match err {
            BookingError::Validation(msg) => assert!(msg.contains("email")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
