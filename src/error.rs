use std::path::PathBuf;

use thiserror::Error;

use crate::gatt::GattUuidError;

/// Errors returned while loading and validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read config `{}`", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config is not valid YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("`{field}` is not an integer: `{value}`")]
    InvalidInteger { field: &'static str, value: String },
    #[error("`{field}` must not be negative, got {value}")]
    NegativeInteger { field: &'static str, value: i64 },
    #[error("`{field}` value {value} exceeds the maximum {max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
    #[error("`{field}` is not valid hex")]
    InvalidHex {
        field: &'static str,
        source: hex::FromHexError,
    },
    #[error("`manufacturer_mac_label` must be exactly 6 bytes, got {actual}")]
    InvalidLabelLength { actual: usize },
    #[error("`{field}` contains an invalid UUID")]
    InvalidUuid {
        field: &'static str,
        source: GattUuidError,
    },
}

/// Errors returned by the host stack boundary.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host Bluetooth stack operation failed")]
    Bluez(#[from] bluer::Error),
    #[error("no Bluetooth adapter found")]
    AdapterNotFound,
    #[error("application registration was rejected: {reason}")]
    ApplicationRejected { reason: String },
    #[error("advertisement registration was rejected: {reason}")]
    AdvertisementRejected { reason: String },
    #[error("nothing is registered at `{path}`")]
    NotRegistered { path: String },
}

/// Errors returned by the fake host script parser.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ScriptError {
    #[error("fake host script step `{step}` is not one of notify, stop, read, write, release")]
    UnknownStep { step: String },
    #[error("fake host script step `{step}` is missing a field")]
    MissingField { step: String },
    #[error("fake host script step `{step}` has an invalid UUID")]
    InvalidUuid { step: String },
    #[error("fake host script step `{step}` has invalid hex")]
    InvalidHex { step: String },
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub(crate) enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
