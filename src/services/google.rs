// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google implementation of the federated provider gateway.
//!
//! Handles:
//! - Authorization-code exchange at the token endpoint
//! - Userinfo fetch with the provider access token
//! - Identity assertion verification via tokeninfo (audience + expiry)

use crate::config::Config;
use crate::error::{AuthError, Result};
use crate::models::Provider;
use crate::services::federated::{FederatedUser, ProviderGateway};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Google OAuth/OIDC gateway.
pub struct GoogleGateway {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    userinfo_url: String,
    tokeninfo_url: String,
}

impl GoogleGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("failed building HTTP client: {e}")))?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            tokeninfo_url: TOKENINFO_URL.to_string(),
        })
    }

    /// Point the gateway at substitute endpoints. Intended for tests
    /// against a local HTTP stub.
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
        tokeninfo_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self.tokeninfo_url = tokeninfo_url.into();
        self
    }

    /// GET with one bounded retry. Only used for idempotent reads; the
    /// code exchange POST is never retried.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<T> {
        let mut last_error = String::new();
        for attempt in 0..2 {
            let mut request = self.http.get(url).query(query);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(AuthError::FederatedAuthFailed(format!(
                            "provider returned status {}",
                            response.status()
                        )));
                    }
                    return response.json::<T>().await.map_err(|e| {
                        AuthError::FederatedAuthFailed(format!("malformed provider response: {e}"))
                    });
                }
                Err(e) => {
                    if attempt == 0 {
                        tracing::warn!(error = %e, "provider request failed; retrying once");
                    }
                    last_error = e.to_string();
                }
            }
        }
        Err(AuthError::ProviderUnavailable(last_error))
    }
}

#[async_trait]
impl ProviderGateway for GoogleGateway {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(format!("code exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::FederatedAuthFailed(format!(
                "code exchange returned status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AuthError::FederatedAuthFailed(format!("malformed token response: {e}"))
        })?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<FederatedUser> {
        let info: UserInfoResponse = self
            .get_json(&self.userinfo_url, &[], Some(access_token))
            .await?;
        user_from_userinfo(info)
    }

    async fn verify_assertion(&self, assertion: &str) -> Result<FederatedUser> {
        let info: TokenInfoResponse = self
            .get_json(&self.tokeninfo_url, &[("id_token", assertion)], None)
            .await?;
        user_from_tokeninfo(info, &self.client_id, chrono::Utc::now().timestamp())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    email_verified: Option<bool>,
}

/// tokeninfo responses carry every value as a string, booleans and
/// timestamps included.
#[derive(Debug, Deserialize)]
struct TokenInfoResponse {
    aud: String,
    sub: String,
    exp: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

fn user_from_userinfo(info: UserInfoResponse) -> Result<FederatedUser> {
    let email = info.email.ok_or_else(|| {
        AuthError::FederatedAuthFailed("provider profile carries no email".to_string())
    })?;
    Ok(FederatedUser {
        id: info.sub,
        email,
        name: info.name,
        picture: info.picture,
        email_verified: info.email_verified.unwrap_or(false),
    })
}

fn user_from_tokeninfo(
    info: TokenInfoResponse,
    expected_audience: &str,
    now: i64,
) -> Result<FederatedUser> {
    if info.aud != expected_audience {
        return Err(AuthError::FederatedAuthFailed(format!(
            "assertion audience mismatch: {}",
            info.aud
        )));
    }

    let exp: i64 = info.exp.parse().map_err(|_| {
        AuthError::FederatedAuthFailed(format!("malformed exp in assertion: {}", info.exp))
    })?;
    if exp <= now {
        return Err(AuthError::FederatedAuthFailed(
            "assertion has expired".to_string(),
        ));
    }

    let email = info.email.ok_or_else(|| {
        AuthError::FederatedAuthFailed("assertion carries no email".to_string())
    })?;

    Ok(FederatedUser {
        id: info.sub,
        email,
        name: info.name,
        picture: info.picture,
        email_verified: info.email_verified.as_deref() == Some("true"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokeninfo(aud: &str, exp: i64) -> TokenInfoResponse {
        TokenInfoResponse {
            aud: aud.to_string(),
            sub: "g-123".to_string(),
            exp: exp.to_string(),
            email: Some("a@x.com".to_string()),
            email_verified: Some("true".to_string()),
            name: Some("Alice".to_string()),
            picture: None,
        }
    }

    #[test]
    fn tokeninfo_accepts_matching_audience_and_future_expiry() {
        let user = user_from_tokeninfo(tokeninfo("client-1", 1_000), "client-1", 900).unwrap();
        assert_eq!(user.id, "g-123");
        assert_eq!(user.email, "a@x.com");
        assert!(user.email_verified);
    }

    #[test]
    fn tokeninfo_rejects_wrong_audience() {
        let err = user_from_tokeninfo(tokeninfo("other-client", 1_000), "client-1", 900).unwrap_err();
        assert!(matches!(err, AuthError::FederatedAuthFailed(_)));
    }

    #[test]
    fn tokeninfo_rejects_expired_assertion() {
        let err = user_from_tokeninfo(tokeninfo("client-1", 900), "client-1", 900).unwrap_err();
        assert!(matches!(err, AuthError::FederatedAuthFailed(_)));
    }

    #[test]
    fn tokeninfo_string_booleans_are_parsed() {
        let mut info = tokeninfo("client-1", 1_000);
        info.email_verified = Some("false".to_string());
        let user = user_from_tokeninfo(info, "client-1", 900).unwrap();
        assert!(!user.email_verified);

        let mut info = tokeninfo("client-1", 1_000);
        info.email_verified = None;
        let user = user_from_tokeninfo(info, "client-1", 900).unwrap();
        assert!(!user.email_verified);
    }

    #[test]
    fn userinfo_without_email_is_rejected() {
        let info = UserInfoResponse {
            sub: "g-123".to_string(),
            email: None,
            name: None,
            picture: None,
            email_verified: None,
        };
        let err = user_from_userinfo(info).unwrap_err();
        assert!(matches!(err, AuthError::FederatedAuthFailed(_)));
    }
}
