//! In-memory account and provider stores (process lifetime only).

use async_trait::async_trait;
use mc_types::{
    NewProvider, Provider, ProviderStore, ProviderStoreError, User, UserStore, UserStoreError,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct UserTable {
    by_name: HashMap<String, User>,
    next_id: i64,
}

/// In-memory UserStore. The duplicate check and the insert run under one write lock.
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(UserTable::default()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, UserStoreError> {
        let mut guard = self.table.write().await;
        if guard.by_name.contains_key(username) {
            return Err(UserStoreError::Duplicate(username.to_string()));
        }
        guard.next_id += 1;
        let user = User {
            id: guard.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        guard.by_name.insert(username.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserStoreError> {
        let guard = self.table.read().await;
        Ok(guard.by_name.get(username).cloned())
    }
}

/// In-memory ProviderStore: append-only vector, ids are 1-based positions.
pub struct InMemoryProviderStore {
    providers: RwLock<Vec<Provider>>,
}

impl InMemoryProviderStore {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryProviderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderStore for InMemoryProviderStore {
    async fn insert_provider(&self, provider: NewProvider) -> Result<Provider, ProviderStoreError> {
        let mut guard = self.providers.write().await;
        let row = Provider {
            id: guard.len() as i64 + 1,
            name: provider.name,
            cpu_free: provider.cpu_free,
            ram_free: provider.ram_free,
            status: provider.status,
            ip_address: provider.ip_address,
        };
        guard.push(row.clone());
        Ok(row)
    }

    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderStoreError> {
        Ok(self.providers.read().await.clone())
    }

    async fn get_provider(&self, id: i64) -> Result<Option<Provider>, ProviderStoreError> {
        let guard = self.providers.read().await;
        Ok(guard.iter().find(|p| p.id == id).cloned())
    }
}
