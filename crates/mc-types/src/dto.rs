//! Records and wire DTOs shared by the stores, the job runner client, and the API.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Stored account (id, username, argon2 hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Stored provider snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    /// CPU headroom in percent, 0..=100.
    pub cpu_free: f64,
    /// Free RAM (GiB).
    pub ram_free: f64,
    pub status: String,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Validated provider row waiting for an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProvider {
    pub name: String,
    pub cpu_free: f64,
    pub ram_free: f64,
    pub status: String,
    pub ip_address: Option<String>,
}

/// Logged-in browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: String,
}

/// Body of `POST {runner}/submit-job`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub image: String,
    pub script: String,
    pub provider_label_value: String,
    pub namespace: String,
    pub env: BTreeMap<String, String>,
    pub backoff_limit: u32,
    pub ttl_seconds_after_finished: u32,
}

/// Job runner answer to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub job_name: String,
    pub namespace: String,
}

/// Job runner answer to a log fetch, tagged with the job it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub namespace: String,
    #[serde(default)]
    pub pod: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phase: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: String,
}

/// Reads a string field that the sender may set to `null` (a pod that has not
/// started has no phase and no logs yet).
pub fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

/// Response envelope used by every JSON endpoint. `code` mirrors the HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    #[serde(default = "default_code")]
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn default_code() -> i32 {
    200
}

impl<T> BaseResponse<T> {
    pub fn ok(code: i32, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Credentials posted by the register/login form and JSON endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}
