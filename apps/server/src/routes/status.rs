use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, web};

use crate::error::ApiResult;
use crate::response;
use crate::state::AppState;

/// Probe a device now and record the outcome
#[get("/devices/{id}/status")]
pub async fn check_device_status(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let report = state.checker.check(&id).await?;
    Ok(response::with_status(StatusCode::OK, "Status checked", report))
}
