//! In-memory store implementations.

use super::{IdentityStore, ProfileStore, StoreError, StoreResult};
use crate::models::{Identity, Profile, Provider};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct IdentityTables {
    rows: HashMap<u64, Identity>,
    by_email: HashMap<String, u64>,
    by_federation: HashMap<(Provider, String), u64>,
    next_id: u64,
}

/// Identity store backed by process memory.
///
/// All tables sit behind one lock so the uniqueness checks in
/// [`IdentityStore::insert`] and the row write happen atomically.
#[derive(Default)]
pub struct MemoryIdentityStore {
    tables: Mutex<IdentityTables>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let tables = self.lock()?;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.rows.get(id))
            .cloned())
    }

    async fn find_by_federation(
        &self,
        provider: Provider,
        federation_id: &str,
    ) -> StoreResult<Option<Identity>> {
        let tables = self.lock()?;
        Ok(tables
            .by_federation
            .get(&(provider, federation_id.to_string()))
            .and_then(|id| tables.rows.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Identity>> {
        let tables = self.lock()?;
        Ok(tables.rows.get(&id).cloned())
    }

    async fn insert(&self, mut identity: Identity) -> StoreResult<Identity> {
        let mut tables = self.lock()?;

        if let Some(holder) = tables
            .by_email
            .get(&identity.email)
            .and_then(|id| tables.rows.get(id))
        {
            if holder.active {
                return Err(StoreError::Conflict("email"));
            }
        }
        if let Some(fid) = &identity.federation_id {
            let key = (identity.provider, fid.clone());
            if tables.by_federation.contains_key(&key) {
                return Err(StoreError::Conflict("federation_id"));
            }
        }

        tables.next_id += 1;
        identity.id = tables.next_id;

        tables.by_email.insert(identity.email.clone(), identity.id);
        if let Some(fid) = &identity.federation_id {
            tables
                .by_federation
                .insert((identity.provider, fid.clone()), identity.id);
        }
        tables.rows.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn update(&self, identity: &Identity) -> StoreResult<()> {
        let mut tables = self.lock()?;
        if !tables.rows.contains_key(&identity.id) {
            return Err(StoreError::Backend(format!(
                "update of unknown identity {}",
                identity.id
            )));
        }
        if let Some(fid) = &identity.federation_id {
            let key = (identity.provider, fid.clone());
            if let Some(&holder) = tables.by_federation.get(&key) {
                if holder != identity.id {
                    return Err(StoreError::Conflict("federation_id"));
                }
            }
            tables.by_federation.insert(key, identity.id);
        }
        tables.rows.insert(identity.id, identity.clone());
        Ok(())
    }
}

impl MemoryIdentityStore {
    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, IdentityTables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("identity table lock poisoned".to_string()))
    }
}

/// Profile store backed by process memory.
#[derive(Default)]
pub struct MemoryProfileStore {
    rows: DashMap<u64, Profile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_identity(&self, identity_id: u64) -> StoreResult<Option<Profile>> {
        Ok(self.rows.get(&identity_id).map(|p| p.clone()))
    }

    async fn upsert(&self, profile: &Profile) -> StoreResult<()> {
        self.rows.insert(profile.identity_id, profile.clone());
        Ok(())
    }
}
