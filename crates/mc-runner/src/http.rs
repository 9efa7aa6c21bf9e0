//! reqwest client for the Job Runner REST contract:
//! `POST /submit-job` and `GET /jobs/{namespace}/{job_id}/logs?timeout=N`.

use mc_types::{
    null_as_empty, JobRequest, JobResult, JobRunner, JobRunnerError, JobSubmission,
};
use serde::Deserialize;
use std::time::Duration;

/// Where the Job Runner lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    pub base_url: String,
    pub submit_timeout: Duration,
    /// Passed to the runner as `?timeout=`; the runner tails pod logs this long.
    pub log_wait_secs: u64,
    /// Extra client-side wait on top of `log_wait_secs`.
    pub log_margin: Duration,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            submit_timeout: Duration::from_secs(20),
            log_wait_secs: 120,
            log_margin: Duration::from_secs(10),
        }
    }
}

impl JobRunnerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: u64| -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            base_url: std::env::var("JOB_RUNNER_URL").unwrap_or(defaults.base_url),
            submit_timeout: Duration::from_secs(secs(
                "JOB_RUNNER_SUBMIT_TIMEOUT_SECS",
                defaults.submit_timeout.as_secs(),
            )),
            log_wait_secs: secs("JOB_RUNNER_LOG_WAIT_SECS", defaults.log_wait_secs),
            log_margin: Duration::from_secs(secs(
                "JOB_RUNNER_LOG_MARGIN_SECS",
                defaults.log_margin.as_secs(),
            )),
        }
    }

    /// Client timeout for the log fetch.
    pub fn log_timeout(&self) -> Duration {
        Duration::from_secs(self.log_wait_secs) + self.log_margin
    }
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    #[serde(default)]
    pod: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    phase: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    logs: String,
}

/// JobRunner over HTTP. One call per operation, no retry.
pub struct HttpJobRunner {
    client: reqwest::Client,
    config: JobRunnerConfig,
}

impl HttpJobRunner {
    pub fn new(config: JobRunnerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JobRunnerConfig::from_env())
    }

    pub fn config(&self) -> &JobRunnerConfig {
        &self.config
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, JobRunnerError> {
        let mut url = reqwest::Url::parse(&self.config.base_url).map_err(|e| {
            JobRunnerError::Transport(format!("invalid base url {}: {}", self.config.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                JobRunnerError::Transport(format!("invalid base url {}", self.config.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_body(res: reqwest::Response) -> Result<(reqwest::StatusCode, String), JobRunnerError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| JobRunnerError::Transport(e.to_string()))?;
    Ok((status, body))
}

#[async_trait::async_trait]
impl JobRunner for HttpJobRunner {
    async fn submit_job(&self, req: &JobRequest) -> Result<JobSubmission, JobRunnerError> {
        let url = self.url(&["submit-job"])?;
        let res = self
            .client
            .post(url)
            .json(req)
            .timeout(self.config.submit_timeout)
            .send()
            .await
            .map_err(|e| JobRunnerError::Transport(e.to_string()))?;
        let (status, body) = read_body(res).await?;
        if !status.is_success() {
            tracing::warn!(status = %status, "job runner rejected submission");
            return Err(JobRunnerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| JobRunnerError::Decode(e.to_string()))
    }

    async fn fetch_logs(&self, namespace: &str, job_id: &str) -> Result<JobResult, JobRunnerError> {
        let url = self.url(&["jobs", namespace, job_id, "logs"])?;
        let res = self
            .client
            .get(url)
            .query(&[("timeout", self.config.log_wait_secs)])
            .timeout(self.config.log_timeout())
            .send()
            .await
            .map_err(|e| JobRunnerError::Transport(e.to_string()))?;
        let (status, body) = read_body(res).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(JobRunnerError::NotFound(format!("{}/{}", namespace, job_id)));
        }
        if !status.is_success() {
            return Err(JobRunnerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: LogsResponse =
            serde_json::from_str(&body).map_err(|e| JobRunnerError::Decode(e.to_string()))?;
        Ok(JobResult {
            job_id: job_id.to_string(),
            namespace: namespace.to_string(),
            pod: parsed.pod,
            phase: parsed.phase,
            logs: parsed.logs,
        })
    }
}
