//! Traits for the account store, provider registry, session store, and job runner.

use crate::{JobRequest, JobResult, JobSubmission, NewProvider, Provider, Session, User};
use async_trait::async_trait;

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Must fail with `UserStoreError::Duplicate` when the
    /// username is taken; the check and the insert happen as one step.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> Result<User, UserStoreError>;

    /// Exact, case-sensitive lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserStoreError>;
}

/// Provider registry. Insert-only: no update or delete.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    async fn insert_provider(&self, provider: NewProvider) -> Result<Provider, ProviderStoreError>;

    /// All providers ordered by id.
    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderStoreError>;

    async fn get_provider(&self, id: i64) -> Result<Option<Provider>, ProviderStoreError>;
}

/// Session store keyed by opaque tokens.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for the user and return it (with a fresh token).
    async fn create(&self, user_id: i64, username: &str) -> Result<Session, SessionStoreError>;

    async fn get(&self, token: &str) -> Result<Option<Session>, SessionStoreError>;

    /// Remove the session if present. Returns whether one was removed.
    async fn remove(&self, token: &str) -> Result<bool, SessionStoreError>;
}

/// Remote job execution service.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Launch a job; one call, no retry.
    async fn submit_job(&self, req: &JobRequest) -> Result<JobSubmission, JobRunnerError>;

    /// Fetch phase and logs for a job, blocking up to the runner's log-tail timeout.
    async fn fetch_logs(&self, namespace: &str, job_id: &str) -> Result<JobResult, JobRunnerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("user already exists: {0}")]
    Duplicate(String),
    #[error("user store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderStoreError {
    #[error("provider store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum JobRunnerError {
    #[error("job runner unreachable: {0}")]
    Transport(String),
    #[error("job runner returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("invalid job runner response: {0}")]
    Decode(String),
}
