//! View models: the only fields handlers expose from stored records.

use mc_types::{JobResult, Provider, Session, User};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub id: i64,
    pub name: String,
    pub cpu_free: f64,
    pub ram_free: f64,
    pub status: String,
}

impl From<&Provider> for ProviderSummary {
    fn from(p: &Provider) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            cpu_free: p.cpu_free,
            ram_free: p.ram_free,
            status: p.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderDetail {
    pub id: i64,
    pub name: String,
    pub cpu_free: f64,
    pub ram_free: f64,
    pub status: String,
    pub ip_address: Option<String>,
}

impl From<Provider> for ProviderDetail {
    fn from(p: Provider) -> Self {
        Self {
            id: p.id,
            name: p.name,
            cpu_free: p.cpu_free,
            ram_free: p.ram_free,
            status: p.status,
            ip_address: p.ip_address,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub user_id: i64,
    pub username: String,
}

impl From<&Session> for UserView {
    fn from(s: &Session) -> Self {
        Self {
            user_id: s.user_id,
            username: s.username.clone(),
        }
    }
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            user_id: u.id,
            username: u.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexView {
    pub user: Option<UserView>,
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResultView {
    pub namespace: String,
    pub job_id: String,
    pub pod: Option<String>,
    pub phase: String,
    pub logs: String,
}

impl From<JobResult> for JobResultView {
    fn from(r: JobResult) -> Self {
        Self {
            namespace: r.namespace,
            job_id: r.job_id,
            pod: r.pod,
            phase: r.phase,
            logs: r.logs,
        }
    }
}

pub const REGISTER_PAGE: &str = r#"<!doctype html>
<form method="post" action="/register">
  <input name="username" placeholder="username">
  <input name="password" type="password" placeholder="password">
  <button type="submit">Register</button>
</form>
"#;

pub const LOGIN_PAGE: &str = r#"<!doctype html>
<form method="post" action="/login">
  <input name="username" placeholder="username">
  <input name="password" type="password" placeholder="password">
  <button type="submit">Log in</button>
</form>
"#;
