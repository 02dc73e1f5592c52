use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool::managed::{Object, PoolError};
use libsql::params::Params;
use libsql::{Connection, Value, params};
use thiserror::Error;
use uuid::Uuid;

use super::models::{DEVICE_COLUMNS, device_from_row, timestamp_now, timestamp_to_i64};
use crate::models::{Device, DeviceFilter, DevicePatch, NewDevice};
use crate::pool::{LibsqlManager, LibsqlPool};

const UNIQUE_VIOLATION: &str = "UNIQUE constraint failed: devices.";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {field}")]
    Conflict { field: String },

    #[error("device store unavailable: {0}")]
    Unavailable(#[source] libsql::Error),

    #[error("device store connection pool failed: {0}")]
    Pool(#[from] PoolError<libsql::Error>),

    #[error("corrupt device row: {0}")]
    Corrupt(String),
}

impl From<libsql::Error> for StoreError {
    fn from(err: libsql::Error) -> Self {
        let message = err.to_string();
        match message.find(UNIQUE_VIOLATION) {
            Some(at) => {
                let field = message[at + UNIQUE_VIOLATION.len()..]
                    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .next()
                    .unwrap_or_default()
                    .to_string();
                StoreError::Conflict { field }
            }
            None => StoreError::Unavailable(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary for device documents.
///
/// Every method is atomic for the single document it touches. Uniqueness of
/// `ip_address` is enforced here and reported as [`StoreError::Conflict`].
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// All devices matching every constraint of the filter
    async fn find(&self, filter: &DeviceFilter) -> StoreResult<Vec<Device>>;

    async fn find_one(&self, id: Uuid) -> StoreResult<Option<Device>>;

    /// Insert a new document; the store assigns `id` and bookkeeping timestamps
    async fn insert(&self, device: &NewDevice) -> StoreResult<Device>;

    /// Merge the set fields of `patch` into one document.
    ///
    /// A patch carrying `last_ping` only applies when the stored `last_ping`
    /// is absent or not newer; otherwise the document is returned unchanged.
    /// `None` means no document has this id.
    async fn update_one(&self, id: Uuid, patch: &DevicePatch) -> StoreResult<Option<Device>>;

    /// Hard delete; `false` when no document had this id
    async fn delete_one(&self, id: Uuid) -> StoreResult<bool>;
}

/// libsql-backed device store
pub struct LibsqlDeviceStore {
    pool: LibsqlPool,
}

impl LibsqlDeviceStore {
    pub fn new(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> StoreResult<Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

async fn fetch_one(conn: &Connection, id: Uuid) -> StoreResult<Option<Device>> {
    let mut rows = conn
        .query(&format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"), params![id.to_string()])
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(device_from_row(&row)?)),
        None => Ok(None),
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn stamp(time: DateTime<Utc>) -> Value {
    Value::Integer(timestamp_to_i64(time))
}

#[async_trait]
impl DeviceStore for LibsqlDeviceStore {
    async fn find(&self, filter: &DeviceFilter) -> StoreResult<Vec<Device>> {
        let conn = self.get_conn().await?;
        let constraints = filter.constraints();

        let mut sql = format!("SELECT {DEVICE_COLUMNS} FROM devices");
        if !constraints.is_empty() {
            let clauses: Vec<String> =
                constraints.iter().map(|(column, _)| format!("{column} = ?")).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at, id");

        let values = constraints.iter().map(|(_, value)| text(value)).collect();
        let mut rows = conn.query(&sql, Params::Positional(values)).await?;

        let mut devices = Vec::new();
        while let Some(row) = rows.next().await? {
            devices.push(device_from_row(&row)?);
        }
        Ok(devices)
    }

    async fn find_one(&self, id: Uuid) -> StoreResult<Option<Device>> {
        let conn = self.get_conn().await?;
        fetch_one(&conn, id).await
    }

    async fn insert(&self, device: &NewDevice) -> StoreResult<Device> {
        let conn = self.get_conn().await?;
        let now = timestamp_now();
        let stored = Device {
            id: Uuid::new_v4(),
            name: device.name.clone(),
            ip_address: device.ip_address.clone(),
            device_type: device.device_type,
            location: device.location.clone(),
            status: device.status,
            last_ping: None,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO devices (id, name, ip_address, device_type, location, status, last_ping, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)",
            params![
                stored.id.to_string(),
                stored.name.clone(),
                stored.ip_address.clone(),
                stored.device_type.to_string(),
                stored.location.clone(),
                stored.status.to_string(),
                timestamp_to_i64(now),
                timestamp_to_i64(now)
            ],
        )
        .await?;

        Ok(stored)
    }

    async fn update_one(&self, id: Uuid, patch: &DevicePatch) -> StoreResult<Option<Device>> {
        let conn = self.get_conn().await?;
        if patch.is_empty() {
            return fetch_one(&conn, id).await;
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(name) = &patch.name {
            assignments.push("name = ?");
            values.push(text(name));
        }
        if let Some(ip) = &patch.ip_address {
            assignments.push("ip_address = ?");
            values.push(text(ip));
        }
        if let Some(device_type) = patch.device_type {
            assignments.push("device_type = ?");
            values.push(text(device_type.as_str()));
        }
        if let Some(location) = &patch.location {
            assignments.push("location = ?");
            values.push(text(location));
        }
        if let Some(status) = patch.status {
            assignments.push("status = ?");
            values.push(text(status.as_str()));
        }
        if let Some(last_ping) = patch.last_ping {
            assignments.push("last_ping = ?");
            values.push(stamp(last_ping));
        }
        if patch.touches_details() {
            assignments.push("updated_at = ?");
            values.push(stamp(timestamp_now()));
        }

        let mut sql = format!("UPDATE devices SET {} WHERE id = ?", assignments.join(", "));
        values.push(text(&id.to_string()));
        if let Some(last_ping) = patch.last_ping {
            sql.push_str(" AND (last_ping IS NULL OR last_ping <= ?)");
            values.push(stamp(last_ping));
        }
        sql.push_str(&format!(" RETURNING {DEVICE_COLUMNS}"));

        let mut rows = conn.query(&sql, Params::Positional(values)).await?;
        let updated = match rows.next().await? {
            Some(row) => Some(device_from_row(&row)?),
            None => None,
        };
        drop(rows);

        match updated {
            Some(device) => Ok(Some(device)),
            // Either the id is unknown or a newer probe result already landed.
            None => fetch_one(&conn, id).await,
        }
    }

    async fn delete_one(&self, id: Uuid) -> StoreResult<bool> {
        let conn = self.get_conn().await?;
        let affected =
            conn.execute("DELETE FROM devices WHERE id = ?", params![id.to_string()]).await?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::initialize_database;
    use crate::models::{DeviceStatus, DeviceType};
    use crate::pool::open_pool;
    use chrono::Duration;
    use tempfile::{TempDir, tempdir};

    /// Fresh migrated store; keep the returned directory alive for the test's duration.
    pub(crate) async fn create_test_store() -> (LibsqlDeviceStore, TempDir) {
        let dir = tempdir().unwrap();
        let pool = open_pool(dir.path().join("devices.db"), 4).await.unwrap();
        let conn = pool.get().await.unwrap();
        initialize_database(&conn).await.unwrap();
        drop(conn);
        (LibsqlDeviceStore::new(pool), dir)
    }

    fn new_device(name: &str, ip: &str) -> NewDevice {
        NewDevice {
            name: name.to_string(),
            ip_address: ip.to_string(),
            device_type: DeviceType::Router,
            location: "lab".to_string(),
            status: DeviceStatus::Unknown,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let (store, _dir) = create_test_store().await;

        let inserted = store.insert(&new_device("r1", "10.0.0.1")).await.unwrap();
        let found = store.find_one(inserted.id).await.unwrap().unwrap();

        assert_eq!(found, inserted);
        assert!(found.last_ping.is_none());
        assert!(store.find_one(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_ip_is_conflict() {
        let (store, _dir) = create_test_store().await;

        store.insert(&new_device("r1", "10.0.0.1")).await.unwrap();
        let err = store.insert(&new_device("r2", "10.0.0.1")).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict { ref field } if field == "ip_address"));
        assert_eq!(store.find(&DeviceFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_applies_every_constraint() {
        let (store, _dir) = create_test_store().await;

        store.insert(&new_device("r1", "10.0.0.1")).await.unwrap();
        let mut switch = new_device("s1", "10.0.0.2");
        switch.device_type = DeviceType::Switch;
        store.insert(&switch).await.unwrap();

        let routers = store
            .find(&DeviceFilter { device_type: Some("router".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(routers.len(), 1);
        assert_eq!(routers[0].name, "r1");

        let none = store
            .find(&DeviceFilter {
                device_type: Some("switch".into()),
                location: Some("elsewhere".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_conflict_leaves_document_unchanged() {
        let (store, _dir) = create_test_store().await;

        let a = store.insert(&new_device("a", "10.0.0.1")).await.unwrap();
        store.insert(&new_device("c", "10.0.0.3")).await.unwrap();

        let patch = DevicePatch { ip_address: Some("10.0.0.3".into()), ..Default::default() };
        let err = store.update_one(a.id, &patch).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.find_one(a.id).await.unwrap().unwrap(), a);
    }

    #[tokio::test]
    async fn test_probe_patch_never_moves_last_ping_backwards() {
        let (store, _dir) = create_test_store().await;
        let device = store.insert(&new_device("r1", "10.0.0.1")).await.unwrap();

        let newer = timestamp_now();
        let older = newer - Duration::seconds(30);

        let applied = store
            .update_one(device.id, &DevicePatch::probe_result(DeviceStatus::Online, newer))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(applied.status, DeviceStatus::Online);
        assert_eq!(applied.last_ping, Some(newer));
        assert_eq!(applied.updated_at, device.updated_at);

        let stale = store
            .update_one(device.id, &DevicePatch::probe_result(DeviceStatus::Offline, older))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale, applied);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_none() {
        let (store, _dir) = create_test_store().await;
        let patch = DevicePatch::probe_result(DeviceStatus::Offline, timestamp_now());
        assert!(store.update_one(Uuid::new_v4(), &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_one_reports_absence() {
        let (store, _dir) = create_test_store().await;
        let device = store.insert(&new_device("r1", "10.0.0.1")).await.unwrap();

        assert!(store.delete_one(device.id).await.unwrap());
        assert!(!store.delete_one(device.id).await.unwrap());
    }
}
