//! Gateway orchestration: accounts/sessions and job submission/result retrieval.

mod accounts;
mod jobs;

pub use accounts::{AccountError, Accounts};
pub use jobs::{build_job_request, parse_env_block, JobDefaults, JobForm, JobGateway, JobGatewayError};
