// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Persistence contracts for the identity subsystem.
//!
//! The real persistence engine lives elsewhere; services in this crate
//! only see these traits. The [`memory`] implementations back the test
//! suite and any single-process deployment.

pub mod memory;

pub use memory::{MemoryIdentityStore, MemoryProfileStore};

use crate::models::{Identity, Profile, Provider};
use async_trait::async_trait;

/// Errors surfaced by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated. The payload names the
    /// constrained field.
    #[error("uniqueness conflict on {0}")]
    Conflict(&'static str),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage for [`Identity`] records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up the identity currently holding `email`. A deactivated
    /// identity is still returned until another active one takes the
    /// address over.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Look up an identity by its federation binding.
    async fn find_by_federation(
        &self,
        provider: Provider,
        federation_id: &str,
    ) -> StoreResult<Option<Identity>>;

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Identity>>;

    /// Persist a new identity, assigning its id. Uniqueness of `email`
    /// (among active identities) and of `(provider, federation_id)` is
    /// checked and the row inserted as one atomic step; concurrent
    /// inserts of the same email cannot both succeed.
    async fn insert(&self, identity: Identity) -> StoreResult<Identity>;

    /// Persist changes to an existing identity.
    async fn update(&self, identity: &Identity) -> StoreResult<()>;
}

/// Storage for [`Profile`] records.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_identity(&self, identity_id: u64) -> StoreResult<Option<Profile>>;

    /// Insert or replace the profile for its identity.
    async fn upsert(&self, profile: &Profile) -> StoreResult<()>;
}
