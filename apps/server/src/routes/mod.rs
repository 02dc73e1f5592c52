use actix_web::web;

use crate::error::ApiError;

pub mod devices;
pub mod health;
pub mod status;

/// Register every route under `/api`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Payload(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::Payload(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .service(health::index)
            .service(health::health_route)
            .service(devices::list_devices)
            .service(devices::create_device)
            .service(devices::get_device)
            .service(devices::update_device)
            .service(devices::delete_device)
            .service(status::check_device_status),
    );
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use netwatch_service::error::ProbeError;
    use netwatch_service::monitoring::{ProbeOutcome, Prober, StatusChecker, parse_target};
    use netwatch_service::open_repository;
    use tempfile::{TempDir, tempdir};

    use crate::state::AppState;

    /// Reports every well-formed target as unreachable
    pub(crate) struct UnreachableProber;

    #[async_trait]
    impl Prober for UnreachableProber {
        async fn probe(&self, ip_address: &str, _timeout: Duration) -> Result<ProbeOutcome, ProbeError> {
            parse_target(ip_address)?;
            Ok(ProbeOutcome::Offline)
        }
    }

    /// State over a fresh database; keep the directory alive for the test's duration.
    pub(crate) async fn test_state() -> (AppState, TempDir) {
        let dir = tempdir().unwrap();
        let repository = open_repository(dir.path().join("api.db"), 2).await.unwrap();
        let checker = Arc::new(StatusChecker::new(
            repository.clone(),
            Arc::new(UnreachableProber),
            Duration::from_millis(100),
        ));
        (AppState { repository, checker, ping_enabled: false }, dir)
    }
}
