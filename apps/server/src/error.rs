use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use netwatch_service::config::ConfigError;
use netwatch_service::error::{DeviceError, ProbeError, StatusCheckError};
use netwatch_service::validation::FieldError;
use thiserror::Error;

use crate::response;

/// Startup and shutdown failures of the server binary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database initialization failed: {0:#}")]
    Database(#[from] anyhow::Error),
}

/// Errors returned by request handlers, rendered as the error envelope
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("Invalid request payload: {0}")]
    Payload(String),
}

impl From<StatusCheckError> for ApiError {
    fn from(err: StatusCheckError) -> Self {
        match err {
            StatusCheckError::Device(e) => ApiError::Device(e),
            StatusCheckError::Probe(e) => ApiError::Probe(e),
        }
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Device(err) => match err {
                DeviceError::Validation(errors) => {
                    (StatusCode::BAD_REQUEST, err.code(), errors.to_string())
                }
                DeviceError::InvalidId(_) => {
                    (StatusCode::BAD_REQUEST, err.code(), "Invalid device id.".to_string())
                }
                DeviceError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, err.code(), "Device not found.".to_string())
                }
                DeviceError::DuplicateIp(_) => {
                    (StatusCode::CONFLICT, err.code(), "Duplicate IP address.".to_string())
                }
                DeviceError::Repository(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.code(),
                    "Device repository unavailable.".to_string(),
                ),
            },
            ApiError::Probe(err @ ProbeError::InvalidTarget(_)) => {
                (StatusCode::BAD_REQUEST, err.code(), err.to_string())
            }
            ApiError::Probe(err @ ProbeError::Misconfigured(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.code(),
                "Failed to check device status.".to_string(),
            ),
            ApiError::Payload(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string()),
        }
    }

    fn details(&self) -> Option<&[FieldError]> {
        match self {
            ApiError::Device(DeviceError::Validation(errors)) if !errors.fields().is_empty() => {
                Some(errors.fields())
            }
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        } else {
            tracing::info!(code, error = %self, "Rejected request");
        }
        response::error(status, message, code, self.details())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
