use actix_web::{HttpResponse, get, web};
use serde::Serialize;

use crate::response;
use crate::state::AppState;

#[derive(Serialize)]
struct Health {
    uptime: bool,
    ping_enabled: bool,
}

#[derive(Serialize)]
struct Endpoint {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct Index {
    endpoints: &'static [Endpoint],
}

const ENDPOINTS: &[Endpoint] = &[
    Endpoint { method: "GET", path: "/api/health", description: "Health check" },
    Endpoint { method: "GET", path: "/api/devices", description: "List devices" },
    Endpoint { method: "POST", path: "/api/devices", description: "Create device" },
    Endpoint { method: "GET", path: "/api/devices/{id}", description: "Get device by id" },
    Endpoint { method: "PUT", path: "/api/devices/{id}", description: "Update device" },
    Endpoint { method: "PATCH", path: "/api/devices/{id}", description: "Update device" },
    Endpoint { method: "DELETE", path: "/api/devices/{id}", description: "Delete device" },
    Endpoint {
        method: "GET",
        path: "/api/devices/{id}/status",
        description: "Check device status now",
    },
];

/// Health check route
#[get("/health")]
pub async fn health_route(state: web::Data<AppState>) -> HttpResponse {
    response::success(Health { uptime: true, ping_enabled: state.ping_enabled })
}

#[get("")]
pub async fn index() -> HttpResponse {
    response::success(Index { endpoints: ENDPOINTS })
}
