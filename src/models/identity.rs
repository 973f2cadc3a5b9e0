//! Identity model: the authoritative record of a distinct account.

use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account category. Company accounts are gated behind organization
/// email verification; promotion to Admin is recorded once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    General,
    Company,
    Admin,
}

impl AccountType {
    /// Parse the wire token used in sign-in intent payloads.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GENERAL" => Some(AccountType::General),
            "COMPANY" => Some(AccountType::Company),
            "ADMIN" => Some(AccountType::Admin),
            _ => None,
        }
    }

    /// Wire token for sign-in intent payloads; inverse of [`Self::parse`].
    pub fn token(&self) -> &'static str {
        match self {
            AccountType::General => "GENERAL",
            AccountType::Company => "COMPANY",
            AccountType::Admin => "ADMIN",
        }
    }
}

/// Federation provider an identity is bound to. `Native` means the
/// account was created with a password and carries no federation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provider {
    Native,
    Google,
}

/// The authoritative record of a distinct account.
///
/// Invariants:
/// - `email` is unique among active identities.
/// - `(provider, federation_id)` is unique when `provider != Native`;
///   `federation_id` is present iff the provider is non-native.
/// - Identities are never hard-deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique id, assigned by the store on first save (0 = unsaved).
    pub id: u64,
    pub email: String,
    /// One-way adaptive hash of the password; absent for pure-federated
    /// accounts.
    pub credential_hash: Option<String>,
    pub account_type: AccountType,
    pub provider: Provider,
    pub federation_id: Option<String>,
    pub email_verified: bool,
    pub company_email_verified: bool,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    /// Set exactly once, on promotion to Admin.
    pub admin_converted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new unsaved native identity.
    pub fn new_native(
        email: impl Into<String>,
        credential_hash: String,
        account_type: AccountType,
    ) -> Self {
        Self {
            id: 0,
            email: email.into(),
            credential_hash: Some(credential_hash),
            account_type,
            provider: Provider::Native,
            federation_id: None,
            email_verified: false,
            company_email_verified: false,
            active: true,
            last_login_at: None,
            admin_converted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new unsaved federated identity.
    pub fn new_federated(
        email: impl Into<String>,
        provider: Provider,
        federation_id: impl Into<String>,
        account_type: AccountType,
        email_verified: bool,
    ) -> Self {
        Self {
            id: 0,
            email: email.into(),
            credential_hash: None,
            account_type,
            provider,
            federation_id: Some(federation_id.into()),
            email_verified,
            company_email_verified: false,
            active: true,
            last_login_at: None,
            admin_converted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Bind a federation provider to an identity that was native-only.
    /// Existing bindings are left untouched.
    pub fn bind_federation(&mut self, provider: Provider, federation_id: &str) {
        if self.provider == Provider::Native {
            self.provider = provider;
            self.federation_id = Some(federation_id.to_string());
        }
    }

    /// Convert the account to Company. One-way: requires the organization
    /// email to be verified first, and there is no path back to General.
    /// Converting an already-Company account is a no-op.
    pub fn convert_to_company(&mut self) -> Result<()> {
        if self.account_type == AccountType::Company {
            return Ok(());
        }
        if !self.company_email_verified {
            return Err(AuthError::VerificationRequired(
                "organization email must be verified before company conversion".to_string(),
            ));
        }
        self.account_type = AccountType::Company;
        Ok(())
    }

    /// Promote the account to Admin, stamping the conversion timestamp
    /// exactly once.
    pub fn promote_to_admin(&mut self) {
        self.account_type = AccountType::Admin;
        if self.admin_converted_at.is_none() {
            self.admin_converted_at = Some(Utc::now());
        }
    }

    /// Deactivate the account. There is no hard delete.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
