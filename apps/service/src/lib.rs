//! Device directory and liveness monitor.
//!
//! The inventory lives behind [`repository::DeviceRepository`]; reachability is
//! checked on demand by [`monitoring::StatusChecker`] and periodically by
//! [`monitoring::LivenessScheduler`]. Nothing here depends on an HTTP
//! framework.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod pool;
pub mod repository;
pub mod validation;

use std::path::Path;
use std::sync::Arc;

use database::{DeviceStore, LibsqlDeviceStore};
use repository::DeviceRepository;

/// Open the device database at `path`, migrate it and wrap it in a repository
pub async fn open_repository(
    path: impl AsRef<Path>,
    pool_size: usize,
) -> anyhow::Result<DeviceRepository> {
    let pool = pool::open_pool(path, pool_size).await?;
    let conn = pool.get().await?;
    database::initialize_database(&conn).await?;
    drop(conn);

    let store: Arc<dyn DeviceStore> = Arc::new(LibsqlDeviceStore::new(pool));
    Ok(DeviceRepository::new(store))
}
