use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Raised when a string does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Kind of network device in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Router,
    Switch,
    Server,
    Other,
}

impl DeviceType {
    pub const ALL: [DeviceType; 4] =
        [DeviceType::Router, DeviceType::Switch, DeviceType::Server, DeviceType::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Router => "router",
            DeviceType::Switch => "switch",
            DeviceType::Server => "server",
            DeviceType::Other => "other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "device type", value: s.to_string() })
    }
}

/// Last known reachability of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 3] =
        [DeviceStatus::Online, DeviceStatus::Offline, DeviceStatus::Unknown];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "device status", value: s.to_string() })
    }
}

/// Canonical device document as stored and returned to every caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub ip_address: String,
    pub device_type: DeviceType,
    pub location: String,
    pub status: DeviceStatus,
    /// Completion time of the most recent probe, absent until first probed
    pub last_ping: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated device fields as received from a caller.
///
/// Absent keys are `None`. Used for both create (every required key must be
/// present) and update (only present keys are changed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInput {
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub device_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

impl DeviceInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ip_address.is_none()
            && self.device_type.is_none()
            && self.location.is_none()
            && self.status.is_none()
    }
}

/// Validated fields for a new device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub name: String,
    pub ip_address: String,
    pub device_type: DeviceType,
    pub location: String,
    pub status: DeviceStatus,
}

/// Validated partial update; `None` leaves the stored value untouched.
///
/// `last_ping` is only ever set by probe write-backs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub device_type: Option<DeviceType>,
    pub location: Option<String>,
    pub status: Option<DeviceStatus>,
    pub last_ping: Option<DateTime<Utc>>,
}

impl DevicePatch {
    /// Patch written back after a completed probe
    pub fn probe_result(status: DeviceStatus, completed_at: DateTime<Utc>) -> Self {
        Self { status: Some(status), last_ping: Some(completed_at), ..Self::default() }
    }

    /// True when any descriptive (non-probe) field is set
    pub fn touches_details(&self) -> bool {
        self.name.is_some()
            || self.ip_address.is_some()
            || self.device_type.is_some()
            || self.location.is_some()
            || (self.status.is_some() && self.last_ping.is_none())
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_details() && self.status.is_none() && self.last_ping.is_none()
    }
}

/// Exact-match list filters; `None` means no constraint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFilter {
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub device_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

impl DeviceFilter {
    /// Column/value pairs for every constrained field, empty values dropped
    pub fn constraints(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("ip_address", &self.ip_address),
            ("device_type", &self.device_type),
            ("location", &self.location),
            ("status", &self.status),
        ]
        .into_iter()
        .filter_map(|(column, value)| {
            value.as_deref().filter(|v| !v.is_empty()).map(|v| (column, v))
        })
        .collect()
    }
}
