// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use worklane_identity::config::Config;
use worklane_identity::error::{AuthError, Result};
use worklane_identity::models::Provider;
use worklane_identity::services::{
    Argon2Hasher, CredentialAuthenticator, FederatedIdentityResolver, FederatedUser,
    ProviderGateway, TokenService,
};
use worklane_identity::store::{MemoryIdentityStore, MemoryProfileStore};

/// Shared wiring for the auth flow tests.
pub struct TestHarness {
    pub identities: Arc<MemoryIdentityStore>,
    pub profiles: Arc<MemoryProfileStore>,
    pub tokens: Arc<TokenService>,
}

#[allow(dead_code)]
pub fn harness() -> TestHarness {
    harness_with_config(Config::default())
}

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn harness_with_config(config: Config) -> TestHarness {
    init_tracing();
    let tokens = Arc::new(TokenService::new(&config).expect("token service"));
    TestHarness {
        identities: Arc::new(MemoryIdentityStore::new()),
        profiles: Arc::new(MemoryProfileStore::new()),
        tokens,
    }
}

impl TestHarness {
    #[allow(dead_code)]
    pub fn authenticator(
        &self,
    ) -> CredentialAuthenticator<MemoryIdentityStore, MemoryProfileStore, Argon2Hasher> {
        CredentialAuthenticator::new(
            self.identities.clone(),
            self.profiles.clone(),
            Arc::new(Argon2Hasher::new()),
            self.tokens.clone(),
        )
    }

    #[allow(dead_code)]
    pub fn resolver(
        &self,
        gateway: Arc<MockGateway>,
    ) -> FederatedIdentityResolver<MemoryIdentityStore, MemoryProfileStore, MockGateway> {
        FederatedIdentityResolver::new(
            self.identities.clone(),
            self.profiles.clone(),
            gateway,
            self.tokens.clone(),
        )
    }
}

/// What the scripted gateway should do on its next calls.
#[allow(dead_code)]
pub enum GatewayScript {
    User(FederatedUser),
    Unavailable,
}

/// Provider gateway stand-in; returns a scripted federated user or a
/// transport failure.
pub struct MockGateway {
    script: Mutex<GatewayScript>,
}

#[allow(dead_code)]
impl MockGateway {
    pub fn returning(user: FederatedUser) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(GatewayScript::User(user)),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(GatewayScript::Unavailable),
        })
    }

    pub fn set(&self, script: GatewayScript) {
        *self.script.lock().expect("script lock") = script;
    }

    fn scripted_user(&self) -> Result<FederatedUser> {
        match &*self.script.lock().expect("script lock") {
            GatewayScript::User(user) => Ok(user.clone()),
            GatewayScript::Unavailable => Err(AuthError::ProviderUnavailable(
                "connection refused".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ProviderGateway for MockGateway {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn exchange_code(&self, _code: &str, _redirect_uri: &str) -> Result<String> {
        self.scripted_user()
            .map(|_| "provider-access-token".to_string())
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<FederatedUser> {
        self.scripted_user()
    }

    async fn verify_assertion(&self, _assertion: &str) -> Result<FederatedUser> {
        self.scripted_user()
    }
}

#[allow(dead_code)]
pub fn google_user(id: &str, email: &str) -> FederatedUser {
    FederatedUser {
        id: id.to_string(),
        email: email.to_string(),
        name: Some("Alice Example".to_string()),
        picture: Some("https://p.example/alice.png".to_string()),
        email_verified: true,
    }
}
