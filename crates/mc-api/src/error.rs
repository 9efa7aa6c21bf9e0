//! Mapping of domain errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mc_gateway::{AccountError, JobGatewayError};
use mc_types::{BaseResponse, ProviderStoreError, RegistrationError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Job Runner or storage failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body: BaseResponse<()> = BaseResponse::error(status.as_u16() as i32, self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::MissingFields => ApiError::BadRequest(e.to_string()),
            AccountError::Duplicate(_) => ApiError::Conflict(e.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AccountError::Hash(_) | AccountError::Store(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JobGatewayError> for ApiError {
    fn from(e: JobGatewayError) -> Self {
        match e {
            JobGatewayError::ProviderNotFound(_) => ApiError::NotFound("provider not found".to_string()),
            JobGatewayError::JobNotFound(_) => ApiError::NotFound("job not found".to_string()),
            JobGatewayError::Submit(_) | JobGatewayError::Fetch(_) | JobGatewayError::Store(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::AuthenticationFailed | RegistrationError::AddressMismatch => {
                ApiError::Forbidden(e.to_string())
            }
            RegistrationError::InvalidPayload(_)
            | RegistrationError::InvalidCpu
            | RegistrationError::InvalidRam => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<ProviderStoreError> for ApiError {
    fn from(e: ProviderStoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
