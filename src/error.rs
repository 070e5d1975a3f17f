use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error taxonomy for the API. Every component returns one of these and the
/// mapping to a transport status happens exactly once, in `into_response`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid {0}")]
    InvalidInput(&'static str),
    #[error("username already taken")]
    DuplicateUsername,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("not found")]
    NotFound,
    #[error("internal error")]
    Internal(anyhow::Error),
}

impl ApiError {
    /// Machine-stable reason string included in every error payload.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::DuplicateUsername => "duplicate_username",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::NotFound => "not_found",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::DuplicateUsername => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The cause stays in the log; clients get the generic message only.
        if let ApiError::Internal(source) = &self {
            error!(error = %source, "internal error");
        }
        let mut body = json!({
            "error": self.reason(),
            "message": self.to_string(),
        });
        if let ApiError::InvalidInput(field) = &self {
            body["field"] = json!(field);
        }
        (self.status(), Json(body)).into_response()
    }
}
