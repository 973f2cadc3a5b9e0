//! Typed session token claims.

use crate::error::{AuthError, Result};
use crate::models::identity::AccountType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Claims carried by every session token this crate issues.
///
/// The shape is fixed: named fields for everything the platform relies
/// on, plus a small flattened extension map for caller-supplied extras.
/// Readers go through [`SessionClaims::claim`] so an absent or mistyped
/// claim surfaces as an error instead of a silent null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Subject: the identity's email address.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    pub user_id: u64,
    pub user_type: AccountType,
    pub email_verified: bool,
    pub company_email_verified: bool,
    /// Present only on administrative tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Caller-supplied extras, flattened into the token body.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SessionClaims {
    /// Fetch a claim by its wire name and deserialize it into `T`.
    /// Works for fixed fields (`userId`, `userType`, ...) and extension
    /// claims alike. Fails if the claim is absent or carries the wrong
    /// type.
    pub fn claim<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let body = serde_json::to_value(self)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("claims serialization failed: {e}")))?;
        let value = body
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::TokenInvalid(format!("missing claim: {name}")))?;
        serde_json::from_value(value)
            .map_err(|_| AuthError::TokenInvalid(format!("malformed claim: {name}")))
    }
}
