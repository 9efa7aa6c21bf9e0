//! Account and provider stores: in-memory and (feature `sqlite`) SQLite.

mod memory;
pub mod password;
pub mod seed;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use mc_types::{ProviderStore, ProviderStoreError, UserStore, UserStoreError};
pub use memory::{InMemoryProviderStore, InMemoryUserStore};
pub use password::{hash_password, verify_password, PasswordError};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
