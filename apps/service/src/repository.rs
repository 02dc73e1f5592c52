//! Business rules over the device store.
//!
//! Every caller (HTTP handlers, the manual status check and the sweep
//! scheduler) goes through [`DeviceRepository`]. Input is validated before the
//! store is touched, and store signals are translated into [`DeviceError`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};
use uuid::Uuid;

use crate::database::{DeviceStore, StoreError};
use crate::error::{DeviceError, DeviceResult};
use crate::models::{Device, DeviceFilter, DeviceInput, DevicePatch, DeviceStatus};
use crate::validation::{validate_create, validate_update};

/// Parse a caller-supplied device identifier
pub fn parse_device_id(id: &str) -> DeviceResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| DeviceError::InvalidId(id.to_string()))
}

#[derive(Clone)]
pub struct DeviceRepository {
    store: Arc<dyn DeviceStore>,
}

impl DeviceRepository {
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self { store }
    }

    fn store_error(err: StoreError, ip_address: Option<&str>) -> DeviceError {
        match err {
            StoreError::Conflict { .. } => {
                DeviceError::DuplicateIp(ip_address.unwrap_or_default().to_string())
            }
            other => {
                error!(error = %other, "Device store operation failed");
                DeviceError::Repository(other)
            }
        }
    }

    pub async fn list(&self, filter: &DeviceFilter) -> DeviceResult<Vec<Device>> {
        self.store.find(filter).await.map_err(|e| Self::store_error(e, None))
    }

    /// Validate and insert a new device; `status` defaults to `unknown`
    pub async fn create(&self, input: DeviceInput) -> DeviceResult<Device> {
        let device = validate_create(input)?;
        let created = self
            .store
            .insert(&device)
            .await
            .map_err(|e| Self::store_error(e, Some(&device.ip_address)))?;

        debug!(device_id = %created.id, ip = %created.ip_address, "Created device");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> DeviceResult<Device> {
        let id = parse_device_id(id)?;
        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> DeviceResult<Device> {
        self.store
            .find_one(id)
            .await
            .map_err(|e| Self::store_error(e, None))?
            .ok_or(DeviceError::NotFound(id))
    }

    /// Merge the provided fields into an existing device.
    ///
    /// Full and partial replacement share this path: only keys present in
    /// `input` change.
    pub async fn update(&self, id: &str, input: DeviceInput) -> DeviceResult<Device> {
        let id = parse_device_id(id)?;
        let patch = validate_update(input)?;

        let updated = self
            .store
            .update_one(id, &patch)
            .await
            .map_err(|e| Self::store_error(e, patch.ip_address.as_deref()))?
            .ok_or(DeviceError::NotFound(id))?;

        debug!(device_id = %id, "Updated device");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> DeviceResult<()> {
        let id = parse_device_id(id)?;
        let deleted = self.store.delete_one(id).await.map_err(|e| Self::store_error(e, None))?;
        if !deleted {
            return Err(DeviceError::NotFound(id));
        }

        debug!(device_id = %id, "Deleted device");
        Ok(())
    }

    /// Record the outcome of a completed probe.
    ///
    /// Only `status` and `last_ping` are written, in one conditional update.
    /// A result older than the stored `last_ping` is discarded and the current
    /// document returned. A device deleted meanwhile yields `NotFound`.
    pub async fn apply_probe_result(
        &self,
        id: Uuid,
        status: DeviceStatus,
        completed_at: DateTime<Utc>,
    ) -> DeviceResult<Device> {
        let patch = DevicePatch::probe_result(status, completed_at);
        let device = self
            .store
            .update_one(id, &patch)
            .await
            .map_err(|e| Self::store_error(e, None))?
            .ok_or(DeviceError::NotFound(id))?;

        if device.last_ping.is_some_and(|stored| stored > completed_at) {
            debug!(
                device_id = %id,
                %status,
                completed_at = %completed_at,
                "Discarded probe result older than the stored one"
            );
        }
        Ok(device)
    }
}
