use chrono::{DateTime, SubsecRound, Utc};
use libsql::Row;
use uuid::Uuid;

use super::store::{StoreError, StoreResult};
use crate::models::{Device, DeviceStatus, DeviceType};

/// Column list matching [`device_from_row`]
pub const DEVICE_COLUMNS: &str =
    "id, name, ip_address, device_type, location, status, last_ping, created_at, updated_at";

/// Current time at the precision the store keeps (milliseconds)
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Convert a timestamp to stored UNIX milliseconds
pub fn timestamp_to_i64(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Convert stored UNIX milliseconds back to a timestamp
pub fn i64_to_timestamp(millis: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {millis}")))
}

/// Decode one `devices` row selected with [`DEVICE_COLUMNS`]
pub fn device_from_row(row: &Row) -> StoreResult<Device> {
    let id: String = row.get(0)?;
    let device_type: String = row.get(3)?;
    let status: String = row.get(5)?;
    let last_ping: Option<i64> = row.get(6)?;

    Ok(Device {
        id: Uuid::parse_str(&id)
            .map_err(|e| StoreError::Corrupt(format!("invalid device id {id}: {e}")))?,
        name: row.get(1)?,
        ip_address: row.get(2)?,
        device_type: device_type.parse::<DeviceType>().map_err(|e| StoreError::Corrupt(e.to_string()))?,
        location: row.get(4)?,
        status: status.parse::<DeviceStatus>().map_err(|e| StoreError::Corrupt(e.to_string()))?,
        last_ping: last_ping.map(i64_to_timestamp).transpose()?,
        created_at: i64_to_timestamp(row.get(7)?)?,
        updated_at: i64_to_timestamp(row.get(8)?)?,
    })
}
