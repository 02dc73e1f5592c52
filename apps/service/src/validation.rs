//! Normalisation and validation of caller-supplied device fields.
//!
//! Strings are trimmed, `name` and `location` are capped at
//! [`MAX_TEXT_LEN`] characters, and enum-valued fields are lower-cased before
//! any rule is checked. Every failing field is reported, not just the first.

use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::models::{DeviceInput, DevicePatch, DeviceStatus, DeviceType, NewDevice};

/// Maximum length of free-text fields after trimming
pub const MAX_TEXT_LEN: usize = 100;

/// Validation results with specific error messages
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { is_valid: false, error: Some(msg.into()) }
    }
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in one payload, in field order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    summary: &'static str,
    fields: Vec<FieldError>,
}

impl ValidationErrors {
    fn new(summary: &'static str) -> Self {
        Self { summary, fields: Vec::new() }
    }

    fn check(&mut self, field: &'static str, result: ValidationResult) -> bool {
        if result.is_valid {
            return true;
        }
        let message = result.error.unwrap_or_else(|| "Validation failed".to_string());
        self.fields.push(FieldError { field, message });
        false
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.field == name).map(|f| f.message.as_str())
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.fields.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary)?;
        for (i, error) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn clean_text(value: &str, max_len: Option<usize>) -> String {
    let trimmed = value.trim();
    match max_len {
        Some(max) if trimmed.chars().count() > max => {
            trimmed.chars().take(max).collect::<String>().trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Trim, truncate and lower-case the provided fields. Absent fields stay absent.
pub fn normalize(input: DeviceInput) -> DeviceInput {
    DeviceInput {
        name: input.name.map(|v| clean_text(&v, Some(MAX_TEXT_LEN))),
        ip_address: input.ip_address.map(|v| clean_text(&v, None)),
        device_type: input.device_type.map(|v| clean_text(&v, None).to_lowercase()),
        location: input.location.map(|v| clean_text(&v, Some(MAX_TEXT_LEN))),
        status: input.status.map(|v| clean_text(&v, None).to_lowercase()),
    }
}

/// Validate device name
pub fn validate_name(name: &str) -> ValidationResult {
    if name.is_empty() {
        return ValidationResult::err("Name is required and cannot be empty.");
    }
    ValidationResult::ok()
}

/// Validate IPv4 address syntax
pub fn validate_ip_address(ip: &str) -> ValidationResult {
    if ip.is_empty() {
        return ValidationResult::err("IP address is required and cannot be empty.");
    }
    if ip.parse::<Ipv4Addr>().is_err() {
        return ValidationResult::err("IP address must be a valid IPv4 address.");
    }
    ValidationResult::ok()
}

/// Validate device type membership
pub fn validate_device_type(device_type: &str) -> ValidationResult {
    if device_type.is_empty() {
        return ValidationResult::err("Device type is required and cannot be empty.");
    }
    if device_type.parse::<DeviceType>().is_err() {
        let allowed: Vec<&str> = DeviceType::ALL.iter().map(DeviceType::as_str).collect();
        return ValidationResult::err(format!(
            "Device type must be one of: {}.",
            allowed.join(", ")
        ));
    }
    ValidationResult::ok()
}

/// Validate device location
pub fn validate_location(location: &str) -> ValidationResult {
    if location.is_empty() {
        return ValidationResult::err("Location is required and cannot be empty.");
    }
    ValidationResult::ok()
}

/// Validate status membership
pub fn validate_status(status: &str) -> ValidationResult {
    if status.parse::<DeviceStatus>().is_err() {
        let allowed: Vec<&str> = DeviceStatus::ALL.iter().map(DeviceStatus::as_str).collect();
        return ValidationResult::err(format!("Status must be one of: {}.", allowed.join(", ")));
    }
    ValidationResult::ok()
}

/// Validated value of a field, or `None` when it failed (error already recorded)
fn checked<'a>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &'a str,
    rule: fn(&str) -> ValidationResult,
) -> Option<&'a str> {
    errors.check(field, rule(value)).then_some(value)
}

/// Validate a create payload: name, ip_address, device_type and location are required.
pub fn validate_create(input: DeviceInput) -> Result<NewDevice, ValidationErrors> {
    let input = normalize(input);
    let mut errors = ValidationErrors::new("Invalid device payload");

    let name = checked(&mut errors, "name", input.name.as_deref().unwrap_or(""), validate_name);
    let ip_address = checked(
        &mut errors,
        "ip_address",
        input.ip_address.as_deref().unwrap_or(""),
        validate_ip_address,
    );
    let device_type = checked(
        &mut errors,
        "device_type",
        input.device_type.as_deref().unwrap_or(""),
        validate_device_type,
    )
    .and_then(|v| v.parse::<DeviceType>().ok());
    let location =
        checked(&mut errors, "location", input.location.as_deref().unwrap_or(""), validate_location);
    let status = match input.status.as_deref() {
        Some(status) => {
            checked(&mut errors, "status", status, validate_status).and_then(|v| v.parse().ok())
        }
        None => Some(DeviceStatus::Unknown),
    };

    match (name, ip_address, device_type, location, status) {
        (Some(name), Some(ip_address), Some(device_type), Some(location), Some(status)) => {
            errors.into_result(NewDevice {
                name: name.to_string(),
                ip_address: ip_address.to_string(),
                device_type,
                location: location.to_string(),
                status,
            })
        }
        _ => Err(errors),
    }
}

/// Validate an update payload. Every field is optional but a provided field
/// must satisfy the same rule as on create.
pub fn validate_update(input: DeviceInput) -> Result<DevicePatch, ValidationErrors> {
    if input.is_empty() {
        return Err(ValidationErrors::new("No fields provided for update."));
    }

    let input = normalize(input);
    let mut errors = ValidationErrors::new("Invalid device update payload");
    let mut patch = DevicePatch::default();

    if let Some(name) = input.name.as_deref() {
        patch.name = checked(&mut errors, "name", name, validate_name).map(str::to_string);
    }
    if let Some(ip) = input.ip_address.as_deref() {
        patch.ip_address =
            checked(&mut errors, "ip_address", ip, validate_ip_address).map(str::to_string);
    }
    if let Some(device_type) = input.device_type.as_deref() {
        patch.device_type = checked(&mut errors, "device_type", device_type, validate_device_type)
            .and_then(|v| v.parse().ok());
    }
    if let Some(location) = input.location.as_deref() {
        patch.location =
            checked(&mut errors, "location", location, validate_location).map(str::to_string);
    }
    if let Some(status) = input.status.as_deref() {
        patch.status =
            checked(&mut errors, "status", status, validate_status).and_then(|v| v.parse().ok());
    }

    errors.into_result(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input() -> DeviceInput {
        DeviceInput {
            name: Some("  core-router  ".into()),
            ip_address: Some(" 10.0.0.1 ".into()),
            device_type: Some("Router".into()),
            location: Some("lab".into()),
            status: None,
        }
    }

    #[test]
    fn test_normalize_trims_and_lowercases() {
        let normalized = normalize(DeviceInput {
            name: Some(format!("  {}  ", "x".repeat(150))),
            device_type: Some(" SWITCH ".into()),
            status: Some("Online".into()),
            ..Default::default()
        });

        assert_eq!(normalized.name.as_deref().map(str::len), Some(MAX_TEXT_LEN));
        assert_eq!(normalized.device_type.as_deref(), Some("switch"));
        assert_eq!(normalized.status.as_deref(), Some("online"));
        assert!(normalized.location.is_none());
    }

    #[test]
    fn test_validate_create_success() {
        let device = validate_create(full_input()).unwrap();
        assert_eq!(device.name, "core-router");
        assert_eq!(device.ip_address, "10.0.0.1");
        assert_eq!(device.device_type, DeviceType::Router);
        assert_eq!(device.status, DeviceStatus::Unknown);
    }

    #[test]
    fn test_validate_create_reports_every_field() {
        let errors = validate_create(DeviceInput {
            ip_address: Some("300.1.1.1".into()),
            device_type: Some("firewall".into()),
            ..Default::default()
        })
        .unwrap_err();

        assert_eq!(errors.fields().len(), 4);
        assert!(errors.field("name").is_some());
        assert_eq!(errors.field("ip_address"), Some("IP address must be a valid IPv4 address."));
        assert!(errors.field("device_type").unwrap().contains("router"));
        assert!(errors.field("location").is_some());
        assert!(errors.to_string().starts_with("Invalid device payload: name:"));
    }

    #[test]
    fn test_ip_validation() {
        assert!(validate_ip_address("192.168.1.1").is_valid);
        assert!(validate_ip_address("0.0.0.0").is_valid);

        assert!(!validate_ip_address("").is_valid);
        assert!(!validate_ip_address("10.0.0").is_valid);
        assert!(!validate_ip_address("::1").is_valid);
        assert!(!validate_ip_address("router.local").is_valid);
    }

    #[test]
    fn test_validate_create_with_explicit_status() {
        let mut input = full_input();
        input.status = Some("OFFLINE".into());
        assert_eq!(validate_create(input).unwrap().status, DeviceStatus::Offline);

        let mut input = full_input();
        input.status = Some("sleeping".into());
        assert!(validate_create(input).unwrap_err().field("status").is_some());
    }

    #[test]
    fn test_validate_update_partial() {
        let patch = validate_update(DeviceInput {
            location: Some(" rack 4 ".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(patch.location.as_deref(), Some("rack 4"));
        assert!(patch.name.is_none());
        assert!(patch.ip_address.is_none());
        assert!(patch.last_ping.is_none());
    }

    #[test]
    fn test_validate_update_rejects_present_but_empty() {
        let errors = validate_update(DeviceInput {
            name: Some("   ".into()),
            ip_address: Some("10.0.0.256".into()),
            ..Default::default()
        })
        .unwrap_err();

        assert_eq!(errors.fields().len(), 2);
        assert!(errors.to_string().starts_with("Invalid device update payload"));
    }

    #[test]
    fn test_validate_update_requires_some_field() {
        let errors = validate_update(DeviceInput::default()).unwrap_err();
        assert_eq!(errors.to_string(), "No fields provided for update.");
        assert!(errors.fields().is_empty());
    }
}
