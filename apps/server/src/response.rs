//! Response envelope shared by every endpoint.
//!
//! Success: `{"status": "success", "message": ..., "data": ...}`.
//! Error: `{"status": "error", "message": ..., "code": ..., "details": ...}`.
//! `data` and `details` are omitted when absent.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SuccessBody<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<D: Serialize> {
    pub status: &'static str,
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<D>,
}

pub fn success<T: Serialize>(data: T) -> HttpResponse {
    with_status(StatusCode::OK, "ok", data)
}

pub fn with_status<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(SuccessBody {
        status: "success",
        message: message.to_string(),
        data: Some(data),
    })
}

pub fn error<D: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    code: &'static str,
    details: Option<D>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        status: "error",
        message: message.into(),
        code,
        details,
    })
}
