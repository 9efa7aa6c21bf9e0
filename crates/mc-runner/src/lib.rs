//! Job Runner client: submit containerized jobs, fetch their logs.

mod http;
#[cfg(feature = "test-util")]
pub mod mock;

pub use http::{HttpJobRunner, JobRunnerConfig};
pub use mc_types::{JobRequest, JobResult, JobRunner, JobRunnerError, JobSubmission};

#[cfg(feature = "test-util")]
pub use mock::MockJobRunner;
