use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::{auth::password::CredentialError, response::MessageResponse, users::repo::StoreError};

/// Errors surfaced to HTTP clients. The display text is the public message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("User not found")]
    UserNotFound,

    #[error("Password not set")]
    PasswordNotSet,

    #[error("Password is wrong")]
    WrongPassword,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Token diperlukan")]
    TokenRequired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound | Self::PasswordNotSet => StatusCode::NOT_FOUND,
            Self::WrongPassword => StatusCode::FORBIDDEN,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::TokenRequired | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!(error = %e, "request failed");
        }
        let status = self.status();
        (status, Json(MessageResponse::failure(self.to_string()))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::EmailTaken,
            StoreError::NotFound => Self::UserNotFound,
            StoreError::Database(e) => Self::Internal(e.into()),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NotSet => Self::PasswordNotSet,
            other => Self::Internal(other.into()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Internal(e.into())
    }
}
