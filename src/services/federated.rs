// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Federated sign-in: intent state, provider gateway contract, and the
//! resolver that links or creates accounts.

use crate::error::{AuthError, Result};
use crate::models::{AccountType, Identity, Profile, Provider};
use crate::services::token::{TokenPair, TokenService};
use crate::store::{IdentityStore, ProfileStore, StoreError};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

// ─── Sign-in intent state ───────────────────────────────────────────────

/// What the caller set out to do when the federated flow started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigninAction {
    Login,
    Signup,
}

impl SigninAction {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "LOGIN" => Some(SigninAction::Login),
            "SIGNUP" => Some(SigninAction::Signup),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            SigninAction::Login => "LOGIN",
            SigninAction::Signup => "SIGNUP",
        }
    }
}

/// Decoded sign-in intent, carried opaquely through the provider
/// round-trip as signed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigninIntent {
    /// Caller-chosen correlation value, echoed back verbatim.
    pub correlation: String,
    pub account_type: AccountType,
    pub action: SigninAction,
}

impl SigninIntent {
    pub fn new(correlation: impl Into<String>, account_type: AccountType, action: SigninAction) -> Self {
        Self {
            correlation: correlation.into(),
            account_type,
            action,
        }
    }
}

/// Encode and MAC an intent as `base64url(correlation|type|action|sig_hex)`.
pub fn encode_intent(intent: &SigninIntent, mac_key: &[u8]) -> Result<String> {
    if intent.correlation.contains('|') {
        return Err(AuthError::InvalidIntent(
            "correlation value may not contain '|'".to_string(),
        ));
    }
    let payload = format!(
        "{}|{}|{}",
        intent.correlation,
        intent.account_type.token(),
        intent.action.token()
    );
    let mut mac = HmacSha256::new_from_slice(mac_key)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("HMAC init failed: {e}")))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify the MAC and decode the intent.
///
/// The payload may carry fewer than three segments; a missing account
/// type defaults to `General` and a missing action to `Signup`. An
/// unrecognized token in either position is rejected outright rather
/// than coerced to a default.
pub fn decode_intent(state: &str, mac_key: &[u8]) -> Result<SigninIntent> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state)
        .map_err(|_| AuthError::InvalidIntent("state is not base64url".to_string()))?;
    let state_str = String::from_utf8(bytes)
        .map_err(|_| AuthError::InvalidIntent("state is not utf-8".to_string()))?;

    // Last segment is the signature; everything before it is the payload.
    let (payload, signature_hex) = state_str
        .rsplit_once('|')
        .ok_or_else(|| AuthError::InvalidIntent("state carries no signature".to_string()))?;

    let presented = hex::decode(signature_hex)
        .map_err(|_| AuthError::InvalidIntent("signature is not hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(mac_key)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("HMAC init failed: {e}")))?;
    mac.update(payload.as_bytes());
    let expected = mac.finalize().into_bytes();

    if expected.ct_eq(presented.as_slice()).unwrap_u8() != 1 {
        tracing::warn!("sign-in state signature mismatch");
        return Err(AuthError::InvalidIntent("signature mismatch".to_string()));
    }

    let mut segments = payload.splitn(3, '|');
    let correlation = segments.next().unwrap_or_default().to_string();

    let account_type = match segments.next() {
        None | Some("") => AccountType::General,
        Some(token) => AccountType::parse(token).ok_or_else(|| {
            AuthError::InvalidIntent(format!("unrecognized account type: {token}"))
        })?,
    };
    let action = match segments.next() {
        None | Some("") => SigninAction::Signup,
        Some(token) => SigninAction::parse(token)
            .ok_or_else(|| AuthError::InvalidIntent(format!("unrecognized action: {token}")))?,
    };

    Ok(SigninIntent {
        correlation,
        account_type,
        action,
    })
}

// ─── Provider gateway contract ──────────────────────────────────────────

/// Federated account attributes as asserted by the provider.
#[derive(Debug, Clone)]
pub struct FederatedUser {
    /// Provider-scoped stable subject id.
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub email_verified: bool,
}

/// Outbound calls to a federated identity provider.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    fn provider(&self) -> Provider;

    /// Exchange an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String>;

    /// Fetch the federated user behind a provider access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<FederatedUser>;

    /// Verify a provider-issued identity assertion, including audience
    /// and expiry, and return the asserted user.
    async fn verify_assertion(&self, assertion: &str) -> Result<FederatedUser>;
}

// ─── Resolver ───────────────────────────────────────────────────────────

/// Resolves a verified federated user to exactly one local identity.
pub struct FederatedIdentityResolver<I, P, G> {
    identities: Arc<I>,
    profiles: Arc<P>,
    gateway: Arc<G>,
    tokens: Arc<TokenService>,
}

impl<I, P, G> FederatedIdentityResolver<I, P, G>
where
    I: IdentityStore,
    P: ProfileStore,
    G: ProviderGateway,
{
    pub fn new(identities: Arc<I>, profiles: Arc<P>, gateway: Arc<G>, tokens: Arc<TokenService>) -> Self {
        Self {
            identities,
            profiles,
            gateway,
            tokens,
        }
    }

    /// State string for starting a federated flow with `intent`.
    pub fn intent_state(&self, intent: &SigninIntent) -> Result<String> {
        encode_intent(intent, self.tokens.intent_mac_key())
    }

    /// Resolve a provider-issued assertion (no code round-trip).
    pub async fn resolve_assertion(
        &self,
        assertion: &str,
        intent: &SigninIntent,
    ) -> Result<(Identity, TokenPair)> {
        let user = self.gateway.verify_assertion(assertion).await?;
        self.resolve(user, intent).await
    }

    /// Resolve an authorization-code callback. The state parameter must
    /// verify against the intent MAC key before anything else happens.
    pub async fn resolve_code(
        &self,
        code: &str,
        redirect_uri: &str,
        state: &str,
    ) -> Result<(Identity, TokenPair)> {
        let intent = decode_intent(state, self.tokens.intent_mac_key())?;
        let provider_token = self.gateway.exchange_code(code, redirect_uri).await?;
        let user = self.gateway.fetch_profile(&provider_token).await?;
        self.resolve(user, &intent).await
    }

    async fn resolve(&self, user: FederatedUser, intent: &SigninIntent) -> Result<(Identity, TokenPair)> {
        let provider = self.gateway.provider();

        // Federation binding wins over bare email.
        let existing = match self.identities.find_by_federation(provider, &user.id).await? {
            Some(identity) => Some(identity),
            None => self.identities.find_by_email(&user.email).await?,
        };

        match (existing, intent.action) {
            (Some(identity), SigninAction::Login) => self.login(identity, &user, provider).await,
            (Some(identity), SigninAction::Signup) => {
                Err(AuthError::AccountAlreadyExists(identity.email))
            }
            (None, SigninAction::Login) => Err(AuthError::AccountNotFound(format!(
                "no account for {}; sign up first",
                user.email
            ))),
            (None, SigninAction::Signup) => self.signup(&user, intent, provider).await,
        }
    }

    async fn login(
        &self,
        mut identity: Identity,
        user: &FederatedUser,
        provider: Provider,
    ) -> Result<(Identity, TokenPair)> {
        if !identity.active {
            return Err(AuthError::AccountDisabled);
        }

        identity.bind_federation(provider, &user.id);
        if user.email_verified {
            identity.email_verified = true;
        }
        identity.last_login_at = Some(Utc::now());
        self.identities.update(&identity).await?;

        self.backfill_profile(&identity, user).await?;

        tracing::info!(user_id = identity.id, "federated login succeeded");

        let pair = self.issue_pair(&identity)?;
        Ok((identity, pair))
    }

    async fn signup(
        &self,
        user: &FederatedUser,
        intent: &SigninIntent,
        provider: Provider,
    ) -> Result<(Identity, TokenPair)> {
        let identity = Identity::new_federated(
            user.email.clone(),
            provider,
            user.id.clone(),
            intent.account_type,
            user.email_verified,
        );
        let identity = match self.identities.insert(identity).await {
            Ok(saved) => saved,
            Err(StoreError::Conflict(_)) => {
                return Err(AuthError::AccountAlreadyExists(user.email.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        self.backfill_profile(&identity, user).await?;

        tracing::info!(user_id = identity.id, "federated signup created identity");

        let pair = self.issue_pair(&identity)?;
        Ok((identity, pair))
    }

    /// Create the profile if it does not exist yet, then fill in name
    /// and picture where they are still absent.
    async fn backfill_profile(&self, identity: &Identity, user: &FederatedUser) -> Result<()> {
        let (mut profile, fresh) = match self.profiles.find_by_identity(identity.id).await? {
            Some(profile) => (profile, false),
            None => (Profile::new(identity.id), true),
        };
        let changed = profile.backfill(user.name.as_deref(), user.picture.as_deref());
        if fresh || changed {
            self.profiles.upsert(&profile).await?;
        }
        Ok(())
    }

    fn issue_pair(&self, identity: &Identity) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access_token(identity, BTreeMap::new())?,
            refresh_token: self.tokens.issue_refresh_token(identity)?,
        })
    }
}
