use actix_web::http::StatusCode;
use actix_web::{HttpResponse, delete, get, post, route, web};
use netwatch_service::models::{DeviceFilter, DeviceInput};

use crate::error::ApiResult;
use crate::response;
use crate::state::AppState;

/// List devices; empty query values are ignored
#[get("/devices")]
pub async fn list_devices(
    state: web::Data<AppState>,
    filter: web::Query<DeviceFilter>,
) -> ApiResult<HttpResponse> {
    let devices = state.repository.list(&filter).await?;
    Ok(response::success(devices))
}

#[post("/devices")]
pub async fn create_device(
    state: web::Data<AppState>,
    input: web::Json<DeviceInput>,
) -> ApiResult<HttpResponse> {
    let device = state.repository.create(input.into_inner()).await?;
    Ok(response::with_status(StatusCode::CREATED, "Device created", device))
}

#[get("/devices/{id}")]
pub async fn get_device(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let device = state.repository.get(&id).await?;
    Ok(response::success(device))
}

/// PUT and PATCH both merge only the provided fields
#[route("/devices/{id}", method = "PUT", method = "PATCH")]
pub async fn update_device(
    state: web::Data<AppState>,
    id: web::Path<String>,
    input: web::Json<DeviceInput>,
) -> ApiResult<HttpResponse> {
    let device = state.repository.update(&id, input.into_inner()).await?;
    Ok(response::with_status(StatusCode::OK, "Device updated", device))
}

#[delete("/devices/{id}")]
pub async fn delete_device(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.repository.delete(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::routes::{routes, testing::test_state};

    fn router_payload(ip: &str) -> Value {
        json!({ "name": "r1", "ip_address": ip, "device_type": "router", "location": "lab" })
    }

    #[actix_web::test]
    async fn test_device_lifecycle() {
        let (state, _dir) = test_state().await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(router_payload("10.0.0.1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Device created");
        assert_eq!(body["data"]["status"], "unknown");
        assert!(body["data"]["last_ping"].is_null());
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(router_payload("10.0.0.1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "DUPLICATE_IP");

        let req = test::TestRequest::delete().uri(&format!("/api/devices/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(test::read_body(resp).await.is_empty());

        let req = test::TestRequest::get().uri(&format!("/api/devices/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_validation_errors_carry_details() {
        let (state, _dir) = test_state().await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(json!({ "name": "r1", "ip_address": "10.0.0", "device_type": "hub" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["ip_address", "device_type", "location"]);
    }

    #[actix_web::test]
    async fn test_malformed_json_is_rejected() {
        let (state, _dir) = test_state().await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[actix_web::test]
    async fn test_put_and_patch_merge_fields() {
        let (state, _dir) = test_state().await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(router_payload("10.0.0.5"))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::patch()
            .uri(&format!("/api/devices/{id}"))
            .set_json(json!({ "location": "rack 2" }))
            .to_request();
        let patched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(patched["message"], "Device updated");
        assert_eq!(patched["data"]["location"], "rack 2");
        assert_eq!(patched["data"]["name"], "r1");

        let req = test::TestRequest::put()
            .uri(&format!("/api/devices/{id}"))
            .set_json(json!({ "name": "edge" }))
            .to_request();
        let put: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(put["data"]["name"], "edge");
        assert_eq!(put["data"]["location"], "rack 2");

        let req = test::TestRequest::put()
            .uri(&format!("/api/devices/{id}"))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "No fields provided for update.");
    }

    #[actix_web::test]
    async fn test_list_filters_and_invalid_id() {
        let (state, _dir) = test_state().await;
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        for (name, ip, kind) in [("r1", "10.0.0.1", "router"), ("s1", "10.0.0.2", "switch")] {
            let req = test::TestRequest::post()
                .uri("/api/devices")
                .set_json(json!({ "name": name, "ip_address": ip, "device_type": kind, "location": "lab" }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/api/devices?device_type=switch&name=").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let devices = body["data"].as_array().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["name"], "s1");

        let req = test::TestRequest::get().uri("/api/devices/not-a-uuid").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_ID");
    }
}
