//! Session store: opaque cookie token -> logged-in user.

mod memory;

pub use mc_types::{Session, SessionStore, SessionStoreError};
pub use memory::InMemorySessionStore;
