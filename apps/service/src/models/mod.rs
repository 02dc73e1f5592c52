//! Device inventory data model shared by the store, repository and monitor.

pub mod device;

pub use device::{
    Device, DeviceFilter, DeviceInput, DevicePatch, DeviceStatus, DeviceType, NewDevice,
    UnknownVariant,
};
