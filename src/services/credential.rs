// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password-based registration, login, and token refresh.

use crate::error::{AuthError, Result};
use crate::models::{AccountType, Identity, Profile};
use crate::services::hasher::{CredentialHasher, HasherError};
use crate::services::token::{TokenPair, TokenService};
use crate::store::{IdentityStore, ProfileStore, StoreError};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Authenticates callers who hold a password credential.
pub struct CredentialAuthenticator<I, P, H> {
    identities: Arc<I>,
    profiles: Arc<P>,
    hasher: Arc<H>,
    tokens: Arc<TokenService>,
}

impl<I, P, H> CredentialAuthenticator<I, P, H>
where
    I: IdentityStore,
    P: ProfileStore,
    H: CredentialHasher,
{
    pub fn new(
        identities: Arc<I>,
        profiles: Arc<P>,
        hasher: Arc<H>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            identities,
            profiles,
            hasher,
            tokens,
        }
    }

    /// Register a new native account.
    ///
    /// The pre-check is advisory only; the store's atomic uniqueness is
    /// what actually decides a race between two concurrent registrations,
    /// and the loser's conflict comes back as [`AuthError::AccountAlreadyExists`].
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        account_type: AccountType,
    ) -> Result<(Identity, TokenPair)> {
        if let Some(existing) = self.identities.find_by_email(email).await? {
            if existing.active {
                return Err(AuthError::AccountAlreadyExists(email.to_string()));
            }
        }

        let hash = self
            .hasher
            .hash(password)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

        let identity = Identity::new_native(email, hash, account_type);
        let identity = match self.identities.insert(identity).await {
            Ok(saved) => saved,
            Err(StoreError::Conflict(_)) => {
                return Err(AuthError::AccountAlreadyExists(email.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(name) = display_name {
            let mut profile = Profile::new(identity.id);
            profile.display_name = Some(name.to_string());
            self.profiles.upsert(&profile).await?;
        }

        tracing::info!(user_id = identity.id, "registered new identity");

        let pair = self.issue_pair(&identity)?;
        Ok((identity, pair))
    }

    /// Authenticate with email and password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<(Identity, TokenPair)> {
        let mut identity = self
            .identities
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound(email.to_string()))?;

        if !identity.active {
            return Err(AuthError::AccountDisabled);
        }

        let hash = identity
            .credential_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        match self.hasher.verify(password, hash) {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidCredentials),
            Err(HasherError::Locked) => return Err(AuthError::AccountLocked),
            Err(HasherError::Backend(e)) => {
                tracing::warn!(user_id = identity.id, error = %e, "credential backend failure");
                return Err(AuthError::Unauthorized);
            }
        }

        identity.last_login_at = Some(Utc::now());
        self.identities.update(&identity).await?;

        tracing::info!(user_id = identity.id, "password login succeeded");

        let pair = self.issue_pair(&identity)?;
        Ok((identity, pair))
    }

    /// Mint a fresh access token from a refresh token. The refresh token
    /// itself is returned unchanged; it is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(Identity, TokenPair)> {
        let claims = self
            .tokens
            .validate(refresh_token, None)
            .map_err(|e| AuthError::InvalidRefreshToken(e.to_string()))?;

        let identity = self
            .identities
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound(claims.sub.clone()))?;

        if !identity.active {
            return Err(AuthError::AccountDisabled);
        }

        self.tokens
            .validate(refresh_token, Some(&identity))
            .map_err(|e| AuthError::InvalidRefreshToken(e.to_string()))?;

        let access_token = self
            .tokens
            .issue_access_token(&identity, BTreeMap::new())?;

        Ok((
            identity,
            TokenPair {
                access_token,
                refresh_token: refresh_token.to_string(),
            },
        ))
    }

    fn issue_pair(&self, identity: &Identity) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access_token(identity, BTreeMap::new())?,
            refresh_token: self.tokens.issue_refresh_token(identity)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{MemoryIdentityStore, MemoryProfileStore};

    enum Verdict {
        Match,
        Locked,
        Backend,
    }

    struct StubHasher {
        verdict: Verdict,
    }

    impl CredentialHasher for StubHasher {
        fn hash(&self, _password: &str) -> std::result::Result<String, HasherError> {
            Ok("stub-hash".to_string())
        }

        fn verify(&self, _password: &str, _hash: &str) -> std::result::Result<bool, HasherError> {
            match self.verdict {
                Verdict::Match => Ok(true),
                Verdict::Locked => Err(HasherError::Locked),
                Verdict::Backend => Err(HasherError::Backend("backend down".to_string())),
            }
        }
    }

    async fn authenticator_with(
        verdict: Verdict,
    ) -> CredentialAuthenticator<MemoryIdentityStore, MemoryProfileStore, StubHasher> {
        let tokens = Arc::new(TokenService::new(&Config::default()).expect("token service"));
        let auth = CredentialAuthenticator::new(
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(MemoryProfileStore::new()),
            Arc::new(StubHasher { verdict }),
            tokens,
        );
        auth.register("a@x.com", "pw", None, AccountType::General)
            .await
            .expect("register");
        auth
    }

    #[tokio::test]
    async fn lock_signal_maps_to_account_locked() {
        let auth = authenticator_with(Verdict::Locked).await;
        let err = auth.authenticate("a@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
    }

    #[tokio::test]
    async fn backend_failure_maps_to_unauthorized_without_leaking() {
        let auth = authenticator_with(Verdict::Backend).await;
        let err = auth.authenticate("a@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
        assert!(!err.to_string().contains("backend down"));
    }

    #[tokio::test]
    async fn clean_verification_succeeds() {
        let auth = authenticator_with(Verdict::Match).await;
        let (identity, _) = auth.authenticate("a@x.com", "pw").await.unwrap();
        assert!(identity.last_login_at.is_some());
    }
}
