// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuing and validation.
//!
//! Tokens are HS256 JWTs. The signing key is not the configured secret
//! itself: both it and the sign-in intent MAC key are derived from the
//! master secret with HKDF-SHA256 under distinct labels, so the two
//! uses can never be replayed against each other.

use crate::config::Config;
use crate::error::{AuthError, Result};
use crate::models::{Identity, SessionClaims};
use anyhow::anyhow;
use hkdf::Hkdf;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use std::collections::BTreeMap;

/// Refresh token lifetime. Fixed; only the access lifetime is
/// configurable.
const REFRESH_TTL_DAYS: i64 = 7;

const SIGNING_KEY_LABEL: &[u8] = b"worklane/session-signing/v1";
const INTENT_MAC_LABEL: &[u8] = b"worklane/intent-mac/v1";

/// Access/refresh pair handed out by the authentication flows.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates session tokens for the identity subsystem.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_mins: i64,
    intent_mac_key: [u8; 32],
}

impl TokenService {
    pub fn new(config: &Config) -> Result<Self> {
        let signing_key = derive_key(&config.token_secret, SIGNING_KEY_LABEL)?;
        let intent_mac_key = derive_key(&config.token_secret, INTENT_MAC_LABEL)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&signing_key),
            decoding_key: DecodingKey::from_secret(&signing_key),
            access_ttl_mins: config.access_token_ttl_mins,
            intent_mac_key,
        })
    }

    /// Key for authenticating federated sign-in intent state. Shared
    /// with the federated resolver only; never used to sign tokens.
    pub fn intent_mac_key(&self) -> &[u8] {
        &self.intent_mac_key
    }

    /// Issue an access token for `identity`. `extra` claims are
    /// flattened into the token body alongside the fixed fields.
    pub fn issue_access_token(
        &self,
        identity: &Identity,
        extra: BTreeMap<String, Value>,
    ) -> Result<String> {
        let claims = self.base_claims(identity, self.access_ttl_mins * 60, extra);
        self.sign(&claims)
    }

    /// Issue a refresh token for `identity`.
    pub fn issue_refresh_token(&self, identity: &Identity) -> Result<String> {
        let claims = self.base_claims(
            identity,
            REFRESH_TTL_DAYS * 24 * 60 * 60,
            BTreeMap::new(),
        );
        self.sign(&claims)
    }

    /// Issue an administrative token for an arbitrary subject. Not tied
    /// to a persisted identity; carries an explicit role claim.
    pub fn issue_admin_token(
        &self,
        subject: &str,
        role: &str,
        extra: BTreeMap<String, Value>,
    ) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.access_ttl_mins * 60,
            user_id: 0,
            user_type: crate::models::AccountType::Admin,
            email_verified: false,
            company_email_verified: false,
            role: Some(role.to_string()),
            is_admin: Some(true),
            extra,
        };
        self.sign(&claims)
    }

    /// Validate signature and expiry, returning the decoded claims.
    ///
    /// Expiry is checked with zero leeway. When `expected` is given the
    /// token must also belong to that identity; a mismatched subject is
    /// indistinguishable from a forged token to the caller.
    pub fn validate(&self, token: &str, expected: Option<&Identity>) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            },
        )?;
        let claims = data.claims;

        if let Some(identity) = expected {
            if claims.sub != identity.email || claims.user_id != identity.id {
                return Err(AuthError::TokenInvalid("subject mismatch".to_string()));
            }
        }

        Ok(claims)
    }

    /// Validate `token` and pull one claim out of it, typed.
    pub fn extract_claim<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        name: &str,
    ) -> Result<T> {
        self.validate(token, None)?.claim(name)
    }

    fn base_claims(
        &self,
        identity: &Identity,
        ttl_secs: i64,
        extra: BTreeMap<String, Value>,
    ) -> SessionClaims {
        let now = chrono::Utc::now().timestamp();
        SessionClaims {
            sub: identity.email.clone(),
            iat: now,
            exp: now + ttl_secs,
            user_id: identity.id,
            user_type: identity.account_type,
            email_verified: identity.email_verified,
            company_email_verified: identity.company_email_verified,
            role: None,
            is_admin: None,
            extra,
        }
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(anyhow!("token signing failed: {e}")))
    }
}

/// HKDF-SHA256 expansion of the master secret under `label`.
fn derive_key(secret: &[u8], label: &[u8]) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut okm = [0u8; 32];
    hk.expand(label, &mut okm)
        .map_err(|_| AuthError::Internal(anyhow!("key derivation failed")))?;
    Ok(okm)
}
