//! Job submission: form parsing, JobRequest construction, dispatch, result lookup.

use mc_types::{
    JobRequest, JobResult, JobRunner, JobRunnerError, JobSubmission, Provider, ProviderStore,
    ProviderStoreError, Session,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fixed parts of every JobRequest.
#[derive(Debug, Clone)]
pub struct JobDefaults {
    /// Used when the form leaves the image blank.
    pub image: String,
    pub namespace: String,
    pub backoff_limit: u32,
    pub ttl_seconds_after_finished: u32,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            image: "python:3.11-slim".to_string(),
            namespace: "mutualcloud".to_string(),
            backoff_limit: 0,
            ttl_seconds_after_finished: 300,
        }
    }
}

impl JobDefaults {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            image: non_empty("JOB_DEFAULT_IMAGE").unwrap_or(defaults.image),
            namespace: non_empty("JOB_NAMESPACE").unwrap_or(defaults.namespace),
            ..defaults
        }
    }
}

/// Fields posted by the job submission form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobForm {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub script: String,
    /// `KEY=VALUE` per line.
    #[serde(default)]
    pub env: String,
}

/// Parse a `KEY=VALUE` block. Blank lines, lines without `=`, and lines with an
/// empty key are skipped; the first `=` splits, so values keep any later `=`.
pub fn parse_env_block(block: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        env.insert(key.to_string(), value.trim().to_string());
    }
    env
}

pub fn build_job_request(form: &JobForm, provider: &Provider, defaults: &JobDefaults) -> JobRequest {
    let image = match form.image.trim() {
        "" => defaults.image.clone(),
        image => image.to_string(),
    };
    JobRequest {
        image,
        script: form.script.clone(),
        provider_label_value: provider.name.clone(),
        namespace: defaults.namespace.clone(),
        env: parse_env_block(&form.env),
        backoff_limit: defaults.backoff_limit,
        ttl_seconds_after_finished: defaults.ttl_seconds_after_finished,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobGatewayError {
    #[error("provider not found: {0}")]
    ProviderNotFound(i64),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("job submission failed: {0}")]
    Submit(JobRunnerError),
    #[error("job result unavailable: {0}")]
    Fetch(JobRunnerError),
    #[error("{0}")]
    Store(#[from] ProviderStoreError),
}

/// Forwards submissions and result queries to the Job Runner.
pub struct JobGateway {
    providers: Arc<dyn ProviderStore + Send + Sync>,
    runner: Arc<dyn JobRunner + Send + Sync>,
    defaults: JobDefaults,
}

impl JobGateway {
    pub fn new(
        providers: Arc<dyn ProviderStore + Send + Sync>,
        runner: Arc<dyn JobRunner + Send + Sync>,
        defaults: JobDefaults,
    ) -> Self {
        Self {
            providers,
            runner,
            defaults,
        }
    }

    pub fn defaults(&self) -> &JobDefaults {
        &self.defaults
    }

    /// Build a JobRequest for the provider and send it once.
    /// The session is the caller's proof of login.
    pub async fn submit(
        &self,
        session: &Session,
        provider_id: i64,
        form: &JobForm,
    ) -> Result<JobSubmission, JobGatewayError> {
        let provider = self
            .providers
            .get_provider(provider_id)
            .await?
            .ok_or(JobGatewayError::ProviderNotFound(provider_id))?;
        let req = build_job_request(form, &provider, &self.defaults);
        match self.runner.submit_job(&req).await {
            Ok(sub) => {
                tracing::info!(
                    user_id = session.user_id,
                    provider = %provider.name,
                    job_name = %sub.job_name,
                    namespace = %sub.namespace,
                    "job submitted"
                );
                Ok(sub)
            }
            Err(e) => {
                tracing::warn!(user_id = session.user_id, provider = %provider.name, error = %e, "job submission failed");
                Err(JobGatewayError::Submit(e))
            }
        }
    }

    /// Fetch phase and logs. Nothing is cached; every call goes to the runner.
    pub async fn result(&self, namespace: &str, job_id: &str) -> Result<JobResult, JobGatewayError> {
        self.runner
            .fetch_logs(namespace, job_id)
            .await
            .map_err(|e| match e {
                JobRunnerError::NotFound(id) => JobGatewayError::JobNotFound(id),
                e => {
                    tracing::warn!(namespace, job_id, error = %e, "job result fetch failed");
                    JobGatewayError::Fetch(e)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_runner::MockJobRunner;
    use mc_store::InMemoryProviderStore;
    use mc_types::NewProvider;

    fn provider(name: &str) -> Provider {
        Provider {
            id: 1,
            name: name.to_string(),
            cpu_free: 50.0,
            ram_free: 4.0,
            status: "normal".to_string(),
            ip_address: None,
        }
    }

    fn session() -> Session {
        Session {
            token: "t".to_string(),
            user_id: 1,
            username: "alice".to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn env_block_skips_blank_and_malformed_lines() {
        let env = parse_env_block("A=1\nB=two=2\n\nBAD");
        let expected: BTreeMap<String, String> = [("A", "1"), ("B", "two=2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(env, expected);
    }

    #[test]
    fn env_block_handles_crlf_and_empty_keys() {
        let env = parse_env_block("X = y \r\n=novalue\r\nEMPTY=\r\n");
        assert_eq!(env.len(), 2);
        assert_eq!(env["X"], "y");
        assert_eq!(env["EMPTY"], "");
    }

    #[test]
    fn blank_image_falls_back_to_default() {
        let defaults = JobDefaults::default();
        let form = JobForm {
            image: "   ".to_string(),
            script: "echo hi".to_string(),
            env: "K=V".to_string(),
        };
        let req = build_job_request(&form, &provider("node-2"), &defaults);
        assert_eq!(req.image, "python:3.11-slim");
        assert_eq!(req.script, "echo hi");
        assert_eq!(req.provider_label_value, "node-2");
        assert_eq!(req.namespace, "mutualcloud");
        assert_eq!(req.backoff_limit, 0);
        assert_eq!(req.ttl_seconds_after_finished, 300);
        assert_eq!(req.env["K"], "V");

        let form = JobForm {
            image: "alpine:3".to_string(),
            ..JobForm::default()
        };
        assert_eq!(build_job_request(&form, &provider("n"), &defaults).image, "alpine:3");
    }

    #[tokio::test]
    async fn submit_forwards_provider_name_once() {
        let providers = Arc::new(InMemoryProviderStore::new());
        let p = providers
            .insert_provider(NewProvider {
                name: "node-7".to_string(),
                cpu_free: 10.0,
                ram_free: 1.0,
                status: "normal".to_string(),
                ip_address: None,
            })
            .await
            .unwrap();
        let runner = Arc::new(MockJobRunner::new());
        let gw = JobGateway::new(providers, runner.clone(), JobDefaults::default());

        let sub = gw.submit(&session(), p.id, &JobForm::default()).await.unwrap();
        assert_eq!(sub.namespace, "mutualcloud");
        let sent = runner.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].provider_label_value, "node-7");

        let err = gw.submit(&session(), 999, &JobForm::default()).await.unwrap_err();
        assert!(matches!(err, JobGatewayError::ProviderNotFound(999)));
        assert_eq!(runner.submitted().len(), 1);
    }

    #[tokio::test]
    async fn upstream_failures_are_surfaced() {
        let providers = Arc::new(InMemoryProviderStore::new());
        let p = providers
            .insert_provider(NewProvider {
                name: "node-1".to_string(),
                cpu_free: 10.0,
                ram_free: 1.0,
                status: "normal".to_string(),
                ip_address: None,
            })
            .await
            .unwrap();
        let gw = JobGateway::new(
            providers,
            Arc::new(MockJobRunner::failing(503)),
            JobDefaults::default(),
        );
        let err = gw.submit(&session(), p.id, &JobForm::default()).await.unwrap_err();
        assert!(matches!(err, JobGatewayError::Submit(JobRunnerError::Status { status: 503, .. })));
        assert!(err.to_string().starts_with("job submission failed"));

        let err = gw.result("mutualcloud", "job-1").await.unwrap_err();
        assert!(matches!(err, JobGatewayError::Fetch(_)));
    }

    #[tokio::test]
    async fn result_maps_missing_job() {
        let gw = JobGateway::new(
            Arc::new(InMemoryProviderStore::new()),
            Arc::new(MockJobRunner::new()),
            JobDefaults::default(),
        );
        let ok = gw.result("mutualcloud", "job-1").await.unwrap();
        assert_eq!(ok.phase, "Succeeded");
        assert!(matches!(
            gw.result("mutualcloud", "missing").await,
            Err(JobGatewayError::JobNotFound(_))
        ));
    }
}
