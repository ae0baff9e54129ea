//! HTTP rendering of [`Error`].
//!
//! Client mistakes are answered with their message under one of three keys
//! (`error`, `authorizationError`, `authenticationError`). Infrastructure failures
//! are logged and answered with a generic 500 body.

use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// Status code and JSON body key for this error.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { .. } | Self::DuplicateReview { .. } => {
                (StatusCode::BAD_REQUEST, "error")
            }
            Self::InvalidCredentials => (StatusCode::BAD_REQUEST, "authenticationError"),
            Self::ProductNotFound { .. }
            | Self::ReviewNotFound { .. }
            | Self::UserNotFound { .. } => (StatusCode::NOT_FOUND, "error"),
            Self::NotOwner { .. } | Self::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "authorizationError")
            }
            Self::InsufficientRole { .. } | Self::AccountInactive { .. } | Self::InvalidToken => {
                (StatusCode::FORBIDDEN, "authorizationError")
            }
            Self::WriteConflict { .. } => (StatusCode::CONFLICT, "error"),
            Self::Config { .. }
            | Self::Database(_)
            | Self::Token(_)
            | Self::PasswordHash { .. }
            | Self::Io(_)
            | Self::IntConversion(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, key) = self.classify();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ key: message }))).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}
