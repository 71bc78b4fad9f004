//! HTTP error type and JSON error bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hf_auth::AuthError;
use hf_site::SiteError;
use hf_store::StoreError;
use serde::Serialize;

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// A manager, upload or public section failed.
    #[error(transparent)]
    Site(#[from] SiteError),

    /// Sign-in failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Reading from object storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The request could not be understood.
    #[error("invalid request: {message}")]
    BadRequest {
        /// Description of the problem.
        message: String,
    },

    /// Nothing lives at this path.
    #[error("not found: {message}")]
    NotFound {
        /// What was looked for.
        message: String,
    },
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl HttpError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Map to an HTTP status code.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Site(e) => match e {
                SiteError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SiteError::NotFound { .. } => StatusCode::NOT_FOUND,
                SiteError::NotEditing => StatusCode::CONFLICT,
                SiteError::Meta(_) => StatusCode::BAD_GATEWAY,
                SiteError::Store(StoreError::InvalidKey { .. }) => StatusCode::BAD_REQUEST,
                SiteError::Store(StoreError::CapacityExceeded { .. }) => {
                    StatusCode::INSUFFICIENT_STORAGE
                }
                SiteError::Store(_) => StatusCode::BAD_GATEWAY,
                SiteError::Decode { .. } | SiteError::Encode(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(_) => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::InvalidKey { .. }) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// Map to the machine-readable code in the body.
    fn code(&self) -> &'static str {
        match self {
            Self::Site(e) => match e {
                SiteError::Validation(_) => "validation_failed",
                SiteError::NotFound { .. } => "not_found",
                SiteError::NotEditing => "not_editing",
                SiteError::Meta(_) => "backend_error",
                SiteError::Store(_) => "upload_failed",
                SiteError::Decode { .. } | SiteError::Encode(_) => "internal_error",
            },
            Self::Auth(AuthError::InvalidCredentials) => "invalid_credentials",
            Self::Auth(_) => "auth_error",
            Self::Store(StoreError::InvalidKey { .. }) => "not_found",
            Self::Store(_) => "storage_error",
            Self::BadRequest { .. } => "bad_request",
            Self::NotFound { .. } => "not_found",
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
