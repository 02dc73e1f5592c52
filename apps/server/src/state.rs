use std::sync::Arc;

use netwatch_service::monitoring::StatusChecker;
use netwatch_service::repository::DeviceRepository;

/// Shared state handed to every handler through `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub repository: DeviceRepository,
    /// Manual status checks; runs independently of the sweep scheduler
    pub checker: Arc<StatusChecker>,
    pub ping_enabled: bool,
}
