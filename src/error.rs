// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Domain error types for the identity subsystem.

use crate::store::StoreError;

/// Identity subsystem error. Every variant is terminal for the current
/// call; nothing here retries automatically.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists for {0}")]
    AccountAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(String),

    #[error("Federated authentication failed: {0}")]
    FederatedAuthFailed(String),

    #[error("Federated provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid sign-in intent: {0}")]
    InvalidIntent(String),

    #[error("Verification required: {0}")]
    VerificationRequired(String),

    #[error("Authentication rejected")]
    Unauthorized,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => AuthError::AccountAlreadyExists(what.to_string()),
            StoreError::Backend(msg) => AuthError::Store(msg),
        }
    }
}

/// Result type alias for identity operations
pub type Result<T> = std::result::Result<T, AuthError>;
