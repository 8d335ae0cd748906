//! YAML configuration for the emulator.
//!
//! The file is parsed into a permissive raw document first and then validated
//! into an immutable [`EmulatorConfig`]. Every validation failure is fatal;
//! the only fallback is the host-derived manufacturer label, which is applied
//! later when the advertisement is built.

use std::io;
use std::path::Path;

use bon::Builder;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::ConfigError;
use crate::gatt::{GattUuid, MAC_LABEL_LEN, MacLabel};
use crate::handlers::FirmwareVersion;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dock-emulator/config.yml";

const ROOT_KEY_DEFAULT_ADAPTER: &str = "hci0";
const DEFAULT_LOCAL_NAME: &str = "WoS1MB";
const DEFAULT_COMPANY_ID: u16 = 0x0969;
const DEFAULT_FW_MAJOR: u32 = 1;
const DEFAULT_FW_MINOR: u32 = 0;
const DEFAULT_SERVICE_DATA_UUID: GattUuid = GattUuid::short(0xFD3D);
const DEFAULT_SERVICE_DATA_HEX: &str = "00";

/// Service data advertised under one 16-bit UUID.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ServiceData {
    uuid: GattUuid,
    payload: Vec<u8>,
}

impl ServiceData {
    #[must_use]
    pub fn new(uuid: GattUuid, payload: Vec<u8>) -> Self {
        Self { uuid, payload }
    }

    #[must_use]
    pub fn uuid(&self) -> GattUuid {
        self.uuid
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Validated emulator configuration.
#[derive(Debug, Clone, Eq, PartialEq, Builder)]
pub struct EmulatorConfig {
    #[builder(into, default = ROOT_KEY_DEFAULT_ADAPTER.to_string())]
    adapter: String,
    #[builder(into, default = DEFAULT_LOCAL_NAME.to_string())]
    local_name: String,
    #[builder(default = FirmwareVersion::new(DEFAULT_FW_MAJOR, DEFAULT_FW_MINOR))]
    firmware: FirmwareVersion,
    #[builder(default = DEFAULT_COMPANY_ID)]
    company_id: u16,
    manufacturer_label: Option<MacLabel>,
    #[builder(default = true)]
    include_tx_power: bool,
    service_data: Option<ServiceData>,
    #[builder(default)]
    advertised_service_uuids: Vec<GattUuid>,
}

impl EmulatorConfig {
    /// Preferred host adapter name, e.g. `hci0`.
    #[must_use]
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[must_use]
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    #[must_use]
    pub fn company_id(&self) -> u16 {
        self.company_id
    }

    /// Configured manufacturer label; `None` selects the host-derived fallback.
    #[must_use]
    pub fn manufacturer_label(&self) -> Option<MacLabel> {
        self.manufacturer_label
    }

    #[must_use]
    pub fn include_tx_power(&self) -> bool {
        self.include_tx_power
    }

    /// Service data to advertise; `None` when disabled.
    #[must_use]
    pub fn service_data(&self) -> Option<&ServiceData> {
        self.service_data.as_ref()
    }

    #[must_use]
    pub fn advertised_service_uuids(&self) -> &[GattUuid] {
        &self.advertised_service_uuids
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::builder()
            .service_data(ServiceData::new(
                DEFAULT_SERVICE_DATA_UUID,
                vec![0x00],
            ))
            .build()
    }
}

/// Loads and validates the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when the file does not exist, and another
/// [`ConfigError`] when it cannot be read or fails validation.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<EmulatorConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let config = parse_config(&raw)?;
    debug!(?config, "config: loaded");
    Ok(config)
}

/// Parses and validates configuration from YAML text.
///
/// An empty document, or one without the `dock_emulator` root key, yields the
/// defaults. The legacy `k10_emulator` root key and the `fd3d_` spellings of
/// the service data keys are accepted as well. Unknown keys are rejected.
///
/// ```
/// let config = dock_emulator::parse_config("dock_emulator:\n  fw_major: 3\n")?;
/// assert_eq!(3, config.firmware().major());
/// assert_eq!("hci0", config.adapter());
/// # Ok::<(), dock_emulator::ConfigError>(())
/// ```
///
/// # Errors
///
/// Returns an error when the YAML is malformed or a value fails validation.
pub fn parse_config(raw: &str) -> Result<EmulatorConfig, ConfigError> {
    if raw.trim().is_empty() {
        return RawSettings::default().validate();
    }

    let document: Option<RawDocument> = serde_yaml::from_str(raw)?;
    document
        .and_then(|document| document.dock_emulator)
        .unwrap_or_default()
        .validate()
}

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default, alias = "k10_emulator")]
    dock_emulator: Option<RawSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    adapter: Option<String>,
    local_name: Option<String>,
    fw_major: Option<IntLike>,
    fw_minor: Option<IntLike>,
    company_id: Option<IntLike>,
    manufacturer_mac_label: Option<String>,
    include_tx_power: Option<bool>,
    #[serde(alias = "advertise_fd3d_service_data")]
    advertise_service_data: Option<bool>,
    service_data_uuid: Option<String>,
    #[serde(alias = "fd3d_service_data_hex")]
    service_data_hex: Option<String>,
    advertise_service_uuids: Option<Vec<String>>,
}

/// An integer written either as a YAML number or as a decimal/`0x` string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IntLike {
    Number(i64),
    Text(String),
}

impl RawSettings {
    fn validate(self) -> Result<EmulatorConfig, ConfigError> {
        let fw_major = optional_int("fw_major", self.fw_major, u32::MAX.into())?
            .map_or(DEFAULT_FW_MAJOR, narrow_u32);
        let fw_minor = optional_int("fw_minor", self.fw_minor, u32::MAX.into())?
            .map_or(DEFAULT_FW_MINOR, narrow_u32);
        let company_id = optional_int("company_id", self.company_id, u16::MAX.into())?
            .map_or(DEFAULT_COMPANY_ID, narrow_u16);

        let manufacturer_label = self
            .manufacturer_mac_label
            .filter(|label| !label.trim().is_empty())
            .map(|label| parse_mac_label(&label))
            .transpose()?;

        let service_data = if self.advertise_service_data.unwrap_or(true) {
            let uuid = match self.service_data_uuid {
                Some(value) => parse_uuid("service_data_uuid", &value)?,
                None => DEFAULT_SERVICE_DATA_UUID,
            };
            let hex = self
                .service_data_hex
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICE_DATA_HEX.to_string());
            Some(ServiceData::new(uuid, parse_hex("service_data_hex", &hex)?))
        } else {
            None
        };

        let advertised_service_uuids = self
            .advertise_service_uuids
            .unwrap_or_default()
            .iter()
            .map(|value| parse_uuid("advertise_service_uuids", value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EmulatorConfig::builder()
            .adapter(
                self.adapter
                    .unwrap_or_else(|| ROOT_KEY_DEFAULT_ADAPTER.to_string()),
            )
            .local_name(
                self.local_name
                    .unwrap_or_else(|| DEFAULT_LOCAL_NAME.to_string()),
            )
            .firmware(FirmwareVersion::new(fw_major, fw_minor))
            .company_id(company_id)
            .maybe_manufacturer_label(manufacturer_label)
            .include_tx_power(self.include_tx_power.unwrap_or(true))
            .maybe_service_data(service_data)
            .advertised_service_uuids(advertised_service_uuids)
            .build())
    }
}

fn optional_int(
    field: &'static str,
    value: Option<IntLike>,
    max: u64,
) -> Result<Option<u64>, ConfigError> {
    value.map(|value| parse_int(field, value, max)).transpose()
}

fn parse_int(field: &'static str, value: IntLike, max: u64) -> Result<u64, ConfigError> {
    let parsed = match value {
        IntLike::Number(number) => {
            u64::try_from(number).map_err(|_| ConfigError::NegativeInteger {
                field,
                value: number,
            })?
        }
        IntLike::Text(text) => {
            let normalised = text.trim().to_ascii_lowercase();
            let result = match normalised.strip_prefix("0x") {
                Some(digits) => u64::from_str_radix(digits, 16),
                None => normalised.parse::<u64>(),
            };
            result.map_err(|_| ConfigError::InvalidInteger { field, value: text })?
        }
    };

    if parsed > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: parsed,
            max,
        });
    }
    Ok(parsed)
}

// Callers have already bounded the value by the target type's maximum.
fn narrow_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn narrow_u16(value: u64) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Decodes hex with optional `:`, `-` or whitespace separators.
fn parse_hex(field: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != ':' && *c != '-' && !c.is_whitespace())
        .collect();
    hex::decode(cleaned).map_err(|source| ConfigError::InvalidHex { field, source })
}

fn parse_mac_label(value: &str) -> Result<MacLabel, ConfigError> {
    let bytes = parse_hex("manufacturer_mac_label", value)?;
    let label: [u8; MAC_LABEL_LEN] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ConfigError::InvalidLabelLength {
            actual: bytes.len(),
        })?;
    Ok(MacLabel::new(label))
}

fn parse_uuid(field: &'static str, value: &str) -> Result<GattUuid, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidUuid { field, source })
}
