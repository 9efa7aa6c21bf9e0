//! Mock job runner for tests: records submissions, no network.

use mc_types::{JobRequest, JobResult, JobRunner, JobRunnerError, JobSubmission};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records every submitted JobRequest and answers with canned results.
/// `fail_with_status` makes both calls fail with that upstream status.
pub struct MockJobRunner {
    submitted: Mutex<Vec<JobRequest>>,
    log_calls: AtomicUsize,
    fail_with_status: Option<u16>,
    job_name: Option<String>,
}

impl MockJobRunner {
    pub fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            log_calls: AtomicUsize::new(0),
            fail_with_status: None,
            job_name: None,
        }
    }

    /// Every submission is answered with this job name.
    pub fn naming(job_name: impl Into<String>) -> Self {
        Self {
            job_name: Some(job_name.into()),
            ..Self::new()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::new()
        }
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.submitted
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Outbound calls of either kind.
    pub fn call_count(&self) -> usize {
        self.submitted().len() + self.log_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockJobRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl JobRunner for MockJobRunner {
    async fn submit_job(&self, req: &JobRequest) -> Result<JobSubmission, JobRunnerError> {
        let n = {
            let mut guard = self
                .submitted
                .lock()
                .map_err(|e| JobRunnerError::Transport(e.to_string()))?;
            guard.push(req.clone());
            guard.len()
        };
        if let Some(status) = self.fail_with_status {
            return Err(JobRunnerError::Status {
                status,
                body: "mock failure".to_string(),
            });
        }
        Ok(JobSubmission {
            job_name: self
                .job_name
                .clone()
                .unwrap_or_else(|| format!("job-{}", n)),
            namespace: req.namespace.clone(),
        })
    }

    async fn fetch_logs(&self, namespace: &str, job_id: &str) -> Result<JobResult, JobRunnerError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_with_status {
            return Err(JobRunnerError::Status {
                status,
                body: "mock failure".to_string(),
            });
        }
        if job_id == "missing" {
            return Err(JobRunnerError::NotFound(format!("{}/{}", namespace, job_id)));
        }
        Ok(JobResult {
            job_id: job_id.to_string(),
            namespace: namespace.to_string(),
            pod: Some(format!("{}-pod", job_id)),
            phase: "Succeeded".to_string(),
            logs: format!("hello from {}\n", job_id),
        })
    }
}
