//! Account registration, login, and logout.

use mc_store::{hash_password, verify_password};
use mc_types::{Session, SessionStore, SessionStoreError, User, UserStore, UserStoreError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("missing username or password")]
    MissingFields,
    #[error("user already exists: {0}")]
    Duplicate(String),
    #[error("login failed")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("account store error: {0}")]
    Store(String),
}

impl From<UserStoreError> for AccountError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::Duplicate(u) => AccountError::Duplicate(u),
            UserStoreError::Other(msg) => AccountError::Store(msg),
        }
    }
}

impl From<SessionStoreError> for AccountError {
    fn from(e: SessionStoreError) -> Self {
        AccountError::Store(e.to_string())
    }
}

/// Registration and session lifecycle over a UserStore and a SessionStore.
pub struct Accounts {
    users: Arc<dyn UserStore + Send + Sync>,
    sessions: Arc<dyn SessionStore + Send + Sync>,
}

impl Accounts {
    pub fn new(
        users: Arc<dyn UserStore + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
    ) -> Self {
        Self { users, sessions }
    }

    /// Create an account. The username is trimmed; the password is taken as-is.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AccountError::MissingFields);
        }
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AccountError::Hash(e.to_string()))?
            .map_err(|e| AccountError::Hash(e.to_string()))?;
        let user = self.users.create_user(username, &hash).await?;
        tracing::info!(user_id = user.id, username = %user.username, "account registered");
        Ok(user)
    }

    /// Verify credentials and open a session. No session is created on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AccountError> {
        let username = username.trim();
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;
        let password = password.to_string();
        let stored = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AccountError::Hash(e.to_string()))?;
        if !ok {
            tracing::info!(username = %username, "login rejected");
            return Err(AccountError::InvalidCredentials);
        }
        let session = self.sessions.create(user.id, &user.username).await?;
        tracing::info!(user_id = user.id, "login succeeded");
        Ok(session)
    }

    /// Drop the session named by `token`, if any. Always succeeds for unknown tokens.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AccountError> {
        if let Some(token) = token {
            self.sessions.remove(token).await?;
        }
        Ok(())
    }

    /// Resolve a cookie token to its session.
    pub async fn session(&self, token: &str) -> Result<Option<Session>, AccountError> {
        Ok(self.sessions.get(token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_session::InMemorySessionStore;
    use mc_store::InMemoryUserStore;

    fn accounts() -> (Accounts, Arc<InMemorySessionStore>) {
        let sessions = Arc::new(InMemorySessionStore::new());
        let accounts = Accounts::new(Arc::new(InMemoryUserStore::new()), sessions.clone());
        (accounts, sessions)
    }

    #[tokio::test]
    async fn register_trims_and_rejects_blank_fields() {
        let (accounts, _) = accounts();
        let user = accounts.register("  alice ", "pw1").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw1");

        assert!(matches!(
            accounts.register("   ", "pw").await,
            Err(AccountError::MissingFields)
        ));
        assert!(matches!(
            accounts.register("bob", "").await,
            Err(AccountError::MissingFields)
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let (accounts, _) = accounts();
        accounts.register("alice", "pw1").await.unwrap();
        let err = accounts.register("alice", "other").await.unwrap_err();
        assert!(matches!(err, AccountError::Duplicate(ref u) if u == "alice"));
        // The original password still works.
        assert!(accounts.login("alice", "pw1").await.is_ok());
        assert!(accounts.login("alice", "other").await.is_err());
    }

    #[tokio::test]
    async fn failed_login_creates_no_session() {
        let (accounts, sessions) = accounts();
        accounts.register("alice", "pw1").await.unwrap();
        assert!(matches!(
            accounts.login("alice", "wrong").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.login("nobody", "pw1").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(sessions.is_empty().await);

        let session = accounts.login("alice", "pw1").await.unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (accounts, sessions) = accounts();
        accounts.register("alice", "pw1").await.unwrap();
        let session = accounts.login("alice", "pw1").await.unwrap();
        accounts.logout(Some(&session.token)).await.unwrap();
        accounts.logout(Some(&session.token)).await.unwrap();
        accounts.logout(None).await.unwrap();
        assert!(sessions.is_empty().await);
        assert!(accounts.session(&session.token).await.unwrap().is_none());
    }
}
