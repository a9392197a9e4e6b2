use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rater::RaterError;
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Rater(RaterError),
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized,
    NotFound(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Rater(e) => write!(f, "Rating error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::NotFound(what) => write!(f, "{} not found", what),
        }
    }
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::ConstraintViolation(_)) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rater(RaterError::CompetitionNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Rater(RaterError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            Self::Rater(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match &self {
            Self::Storage(StorageError::NotFound) => json!({ "error": "Resource not found" }),
            Self::Storage(StorageError::ConstraintViolation(msg)) => json!({ "error": msg }),
            Self::Rater(e @ (RaterError::CompetitionNotFound(_) | RaterError::InvalidPayload(_))) => {
                json!({ "error": e.to_string() })
            }
            Self::Storage(_) | Self::Rater(_) => {
                tracing::error!(error = %self, "Request failed");
                json!({ "error": "An internal error occurred" })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) => json!({ "error": msg }),
            Self::Unauthorized => json!({ "error": "Unauthorized" }),
            Self::NotFound(what) => json!({ "error": format!("{} not found", what) }),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<RaterError> for WebError {
    fn from(error: RaterError) -> Self {
        match error {
            RaterError::StorageError(e) => Self::Storage(e),
            other => Self::Rater(other),
        }
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebError::from(StorageError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::from(RaterError::CompetitionNotFound("1".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::from(RaterError::StorageError(StorageError::NotFound)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::from(RaterError::GenerationTimeout(5)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(WebError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }
}
