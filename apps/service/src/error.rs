use thiserror::Error;
use uuid::Uuid;

use crate::database::StoreError;
use crate::validation::ValidationErrors;

/// Errors surfaced by [`crate::repository::DeviceRepository`]
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Invalid device id: {0}")]
    InvalidId(String),

    #[error("Device not found: {0}")]
    NotFound(Uuid),

    #[error("A device with IP address {0} already exists")]
    DuplicateIp(String),

    #[error("Device repository failure: {0}")]
    Repository(#[source] StoreError),
}

impl DeviceError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            DeviceError::Validation(_) => "VALIDATION_ERROR",
            DeviceError::InvalidId(_) => "INVALID_ID",
            DeviceError::NotFound(_) => "NOT_FOUND",
            DeviceError::DuplicateIp(_) => "DUPLICATE_IP",
            DeviceError::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

impl From<ValidationErrors> for DeviceError {
    fn from(errors: ValidationErrors) -> Self {
        DeviceError::Validation(errors)
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Hard failures of a single probe; unreachable targets are not errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Invalid probe target: {0}")]
    InvalidTarget(String),

    #[error("Prober misconfigured: {0}")]
    Misconfigured(String),
}

impl ProbeError {
    pub fn code(&self) -> &'static str {
        match self {
            ProbeError::InvalidTarget(_) => "INVALID_TARGET",
            ProbeError::Misconfigured(_) => "PROBER_MISCONFIGURED",
        }
    }
}

/// Failure of a manual status check
#[derive(Debug, Error)]
pub enum StatusCheckError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_distinguish_every_kind() {
        let id = Uuid::new_v4();
        let errors = [
            DeviceError::InvalidId("abc".into()),
            DeviceError::NotFound(id),
            DeviceError::DuplicateIp("10.0.0.1".into()),
            DeviceError::Repository(StoreError::Corrupt("bad".into())),
        ];
        let codes: Vec<&str> = errors.iter().map(DeviceError::code).collect();
        assert_eq!(codes, ["INVALID_ID", "NOT_FOUND", "DUPLICATE_IP", "REPOSITORY_ERROR"]);
        assert_eq!(
            DeviceError::DuplicateIp("10.0.0.1".into()).to_string(),
            "A device with IP address 10.0.0.1 already exists"
        );
    }
}
