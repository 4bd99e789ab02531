use thiserror::Error;

use crate::users::repo::StoreError;

/// Failure kinds of the credential and session flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad password, or a bad, expired or tampered token.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Token subject or login identity has no user record.
    #[error("user does not exist")]
    NotFound,
    #[error("inactive user")]
    Inactive,
    #[error("identity already registered")]
    Conflict,
    #[error("token subject must not be empty")]
    EmptySubject,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AuthError::Conflict,
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Backend(e) => AuthError::Internal(e),
        }
    }
}
