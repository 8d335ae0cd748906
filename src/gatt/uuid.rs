use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde_with::SerializeDisplay;
use thiserror::Error;
use uuid::Uuid;

/// Bluetooth base UUID `00000000-0000-1000-8000-00805F9B34FB`.
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Errors returned when parsing UUID strings.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("invalid GATT UUID `{value}`; expected 4 hex digits or a 128-bit UUID")]
pub struct GattUuidError {
    value: String,
}

/// A GATT UUID declared either in 16-bit short form or as a full 128-bit value.
///
/// Equality and hashing compare the expanded 128-bit value, so `B000` equals
/// `0000b000-0000-1000-8000-00805f9b34fb`. Display keeps the declared form.
#[derive(Debug, Clone, Copy, SerializeDisplay)]
pub struct GattUuid {
    uuid: Uuid,
    short: Option<u16>,
}

impl GattUuid {
    /// Creates a UUID from its 16-bit assigned-number form.
    ///
    /// ```
    /// let uuid = dock_emulator::GattUuid::short(0xB000);
    /// assert_eq!("B000", uuid.to_string());
    /// assert_eq!("0000b000-0000-1000-8000-00805f9b34fb", uuid.as_uuid().to_string());
    /// ```
    #[must_use]
    pub const fn short(value: u16) -> Self {
        Self {
            uuid: Uuid::from_u128(BLUETOOTH_BASE_UUID | ((value as u128) << 96)),
            short: Some(value),
        }
    }

    /// Creates a UUID from its full 128-bit form.
    #[must_use]
    pub const fn full(value: u128) -> Self {
        Self {
            uuid: Uuid::from_u128(value),
            short: None,
        }
    }

    /// Returns the expanded 128-bit UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.uuid
    }
}

impl PartialEq for GattUuid {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for GattUuid {}

impl Hash for GattUuid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl PartialOrd for GattUuid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GattUuid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.uuid.cmp(&other.uuid)
    }
}

impl fmt::Display for GattUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.short {
            Some(value) => write!(f, "{value:04X}"),
            None => write!(f, "{:X}", self.uuid.hyphenated()),
        }
    }
}

impl FromStr for GattUuid {
    type Err = GattUuidError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || GattUuidError {
            value: value.to_string(),
        };

        if trimmed.len() == 4 {
            // from_str_radix tolerates a leading sign
            if !trimmed.bytes().all(|byte| byte.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            return u16::from_str_radix(trimmed, 16)
                .map(Self::short)
                .map_err(|_| invalid());
        }

        Uuid::parse_str(trimmed)
            .map(|uuid| Self {
                uuid,
                short: None,
            })
            .map_err(|_| invalid())
    }
}
