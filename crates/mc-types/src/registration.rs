//! Provider self-registration payload and its validation rules.

use crate::NewProvider;
use serde::Deserialize;
use serde_json::Value;
use std::net::IpAddr;

/// Status recorded when the provider does not report one.
pub const DEFAULT_PROVIDER_STATUS: &str = "unknown";

/// Payload of `POST /api/provider/register`.
///
/// `cpu_free` and `ram_free` are kept as raw JSON so that numeric strings
/// ("42.5") are accepted the same way numbers are.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRegistration {
    pub name: String,
    #[serde(default)]
    pub cpu_free: Value,
    #[serde(default)]
    pub ram_free: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("address mismatch")]
    AddressMismatch,
    #[error("invalid CPU value")]
    InvalidCpu,
    #[error("invalid RAM value")]
    InvalidRam,
}

/// Compare the presented pre-shared key against the configured one.
pub fn check_provider_key(presented: Option<&str>, expected: &str) -> Result<(), RegistrationError> {
    match presented {
        Some(key) if !expected.is_empty() && key == expected => Ok(()),
        _ => Err(RegistrationError::AuthenticationFailed),
    }
}

impl ProviderRegistration {
    /// Parse a raw request body. Only the shape is checked here.
    pub fn from_json(body: &[u8]) -> Result<Self, RegistrationError> {
        let reg: ProviderRegistration = serde_json::from_slice(body)
            .map_err(|e| RegistrationError::InvalidPayload(e.to_string()))?;
        if reg.name.trim().is_empty() {
            return Err(RegistrationError::InvalidPayload(
                "name must not be empty".to_string(),
            ));
        }
        Ok(reg)
    }

    /// Apply the address, CPU, and RAM checks in that order against the
    /// address the request actually came from.
    pub fn validate(self, observed: IpAddr) -> Result<NewProvider, RegistrationError> {
        let declared = self
            .ip_address
            .as_deref()
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .ok_or(RegistrationError::AddressMismatch)?;
        if declared.to_canonical() != observed.to_canonical() {
            return Err(RegistrationError::AddressMismatch);
        }

        let cpu_free = parse_number(&self.cpu_free)
            .filter(|v| (0.0..=100.0).contains(v))
            .ok_or(RegistrationError::InvalidCpu)?;
        let ram_free = parse_number(&self.ram_free)
            .filter(|v| *v >= 0.0)
            .ok_or(RegistrationError::InvalidRam)?;

        let status = self
            .status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER_STATUS.to_string());

        Ok(NewProvider {
            name: self.name.trim().to_string(),
            cpu_free,
            ram_free,
            status,
            ip_address: Some(declared.to_canonical().to_string()),
        })
    }
}

fn parse_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}
