use std::collections::BTreeMap;
use std::fmt;

use serde_with::SerializeDisplay;
use strum_macros::Display;
use tracing::{debug, info};

use super::properties::{AdvertisementProperties, InterfaceProperties, ObjectPath};
use super::uuid::GattUuid;
use crate::config::{EmulatorConfig, ServiceData};
use crate::utils::format_mac_label;

/// Length of a MAC-style manufacturer label.
pub const MAC_LABEL_LEN: usize = 6;

const TX_POWER_INCLUDE: &str = "tx-power";

/// Advertisement type announced to the host stack.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, SerializeDisplay)]
pub enum AdvertisementType {
    #[strum(to_string = "peripheral")]
    Peripheral,
}

/// Six-byte label carried in the manufacturer data.
#[derive(Debug, Clone, Copy, Eq, PartialEq, derive_more::From, derive_more::Into)]
pub struct MacLabel([u8; MAC_LABEL_LEN]);

impl MacLabel {
    #[must_use]
    pub const fn new(bytes: [u8; MAC_LABEL_LEN]) -> Self {
        Self(bytes)
    }

    /// Derives a label from a host identifier, zero-padded or truncated to 6 bytes.
    ///
    /// ```
    /// use dock_emulator::MacLabel;
    ///
    /// assert_eq!(*b"dock\0\0", MacLabel::from_host_identifier(b"dock").as_bytes());
    /// assert_eq!(*b"raspbe", MacLabel::from_host_identifier(b"raspberrypi").as_bytes());
    /// ```
    #[must_use]
    pub fn from_host_identifier(identifier: &[u8]) -> Self {
        let mut bytes = [0u8; MAC_LABEL_LEN];
        let len = identifier.len().min(MAC_LABEL_LEN);
        bytes[..len].copy_from_slice(&identifier[..len]);
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(self) -> [u8; MAC_LABEL_LEN] {
        self.0
    }
}

impl fmt::Display for MacLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_mac_label(&self.0))
    }
}

/// Where the advertised manufacturer label came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub enum LabelSource {
    #[strum(to_string = "configured")]
    Configured,
    #[strum(to_string = "host")]
    DerivedFromHost,
}

/// Reads the local host identifier used for fallback labels.
///
/// An unreadable hostname yields an empty identifier, which derives an
/// all-zero label.
#[must_use]
pub fn local_host_identifier() -> Vec<u8> {
    match hostname::get() {
        Ok(hostname) => host_identifier_from(&hostname.to_string_lossy()),
        Err(error) => {
            debug!(?error, "adv: hostname unavailable for label fallback");
            Vec::new()
        }
    }
}

fn host_identifier_from(hostname: &str) -> Vec<u8> {
    hostname.trim().as_bytes().to_vec()
}

/// The immutable advertisement broadcast by the emulated dock.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Advertisement {
    path: ObjectPath,
    advertisement_type: AdvertisementType,
    local_name: String,
    service_uuids: Vec<GattUuid>,
    company_id: u16,
    manufacturer_label: MacLabel,
    label_source: LabelSource,
    service_data: Option<ServiceData>,
    include_tx_power: bool,
}

impl Advertisement {
    /// Builds the advertisement from validated configuration.
    ///
    /// `host_identifier` is only consulted when no manufacturer label is configured.
    #[must_use]
    pub fn new(path: impl Into<String>, config: &EmulatorConfig, host_identifier: &[u8]) -> Self {
        let (manufacturer_label, label_source) = match config.manufacturer_label() {
            Some(label) => (label, LabelSource::Configured),
            None => (
                MacLabel::from_host_identifier(host_identifier),
                LabelSource::DerivedFromHost,
            ),
        };

        Self {
            path: ObjectPath::new(path),
            advertisement_type: AdvertisementType::Peripheral,
            local_name: config.local_name().to_string(),
            service_uuids: config.advertised_service_uuids().to_vec(),
            company_id: config.company_id(),
            manufacturer_label,
            label_source,
            service_data: config.service_data().cloned(),
            include_tx_power: config.include_tx_power(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    #[must_use]
    pub fn advertisement_type(&self) -> AdvertisementType {
        self.advertisement_type
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[must_use]
    pub fn service_uuids(&self) -> &[GattUuid] {
        &self.service_uuids
    }

    #[must_use]
    pub fn company_id(&self) -> u16 {
        self.company_id
    }

    #[must_use]
    pub fn manufacturer_label(&self) -> MacLabel {
        self.manufacturer_label
    }

    #[must_use]
    pub fn label_source(&self) -> LabelSource {
        self.label_source
    }

    #[must_use]
    pub fn service_data(&self) -> Option<&ServiceData> {
        self.service_data.as_ref()
    }

    #[must_use]
    pub fn include_tx_power(&self) -> bool {
        self.include_tx_power
    }

    /// Manufacturer data keyed by company identifier.
    #[must_use]
    pub fn manufacturer_data(&self) -> BTreeMap<u16, Vec<u8>> {
        BTreeMap::from([(self.company_id, self.manufacturer_label.as_bytes().to_vec())])
    }

    /// Renders the `LEAdvertisement1` properties.
    #[must_use]
    pub fn properties(&self) -> AdvertisementProperties {
        AdvertisementProperties {
            advertisement_type: self.advertisement_type,
            local_name: self.local_name.clone(),
            service_uuids: self.service_uuids.clone(),
            manufacturer_data: self.manufacturer_data(),
            service_data: self
                .service_data
                .as_ref()
                .map(|data| BTreeMap::from([(data.uuid(), data.payload().to_vec())])),
            includes: if self.include_tx_power {
                vec![TX_POWER_INCLUDE]
            } else {
                Vec::new()
            },
        }
    }

    /// Renders the properties keyed by interface name.
    #[must_use]
    pub fn interface_properties(&self) -> InterfaceProperties {
        InterfaceProperties::Advertisement(self.properties())
    }

    /// Handles the host revoking the advertisement. Nothing is held on this side.
    pub fn released(&self) {
        info!(path = %self.path, "adv: released by host");
    }
}
