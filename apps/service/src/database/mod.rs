/// Device persistence
///
/// The [`DeviceStore`] trait is the boundary the repository talks to;
/// [`LibsqlDeviceStore`] implements it over a pooled local libsql database.
pub mod migrations;
pub mod models;
pub mod store;

pub use store::{DeviceStore, LibsqlDeviceStore, StoreError, StoreResult};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
