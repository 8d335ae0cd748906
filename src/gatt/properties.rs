//! Typed property records and the wire-shaped maps built from them.
//!
//! The host stack discovers the application through a map of
//! `object path -> interface name -> properties`. Each entity renders its own
//! record on demand; serialising an [`InterfaceProperties`] yields exactly the
//! `interface name -> properties` level of that map.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_with::hex::Hex;
use serde_with::serde_as;

use super::advertisement::AdvertisementType;
use super::characteristic::CharacteristicFlag;
use super::uuid::GattUuid;

pub const GATT_SERVICE_INTERFACE: &str = "org.bluez.GattService1";
pub const GATT_CHARACTERISTIC_INTERFACE: &str = "org.bluez.GattCharacteristic1";
pub const LE_ADVERTISEMENT_INTERFACE: &str = "org.bluez.LEAdvertisement1";

/// An object path, unique within the exposed object tree.
#[derive(
    Debug,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
#[serde(transparent)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns a child path `{self}/{segment}`.
    pub(crate) fn child(&self, segment: &str) -> Self {
        Self(format!("{}/{segment}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether `self` lies strictly below `parent` in the tree.
    #[must_use]
    pub fn is_under(&self, parent: &ObjectPath) -> bool {
        self.0
            .strip_prefix(parent.as_str())
            .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
    }
}

/// Properties of one exported interface, keyed by interface name when serialised.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub enum InterfaceProperties {
    #[serde(rename = "org.bluez.GattService1")]
    Service(ServiceProperties),
    #[serde(rename = "org.bluez.GattCharacteristic1")]
    Characteristic(CharacteristicProperties),
    #[serde(rename = "org.bluez.LEAdvertisement1")]
    Advertisement(AdvertisementProperties),
}

impl InterfaceProperties {
    /// Returns the interface name this record is exported under.
    #[must_use]
    pub fn interface_name(&self) -> &'static str {
        match self {
            Self::Service(_) => GATT_SERVICE_INTERFACE,
            Self::Characteristic(_) => GATT_CHARACTERISTIC_INTERFACE,
            Self::Advertisement(_) => LE_ADVERTISEMENT_INTERFACE,
        }
    }
}

/// Flattened `object path -> interface properties` map of an application.
pub type ManagedObjects = BTreeMap<ObjectPath, InterfaceProperties>;

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ServiceProperties {
    #[serde(rename = "UUID")]
    pub uuid: GattUuid,
    #[serde(rename = "Primary")]
    pub primary: bool,
    #[serde(rename = "Characteristics")]
    pub characteristics: Vec<ObjectPath>,
}

#[serde_as]
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CharacteristicProperties {
    #[serde(rename = "Service")]
    pub service: ObjectPath,
    #[serde(rename = "UUID")]
    pub uuid: GattUuid,
    #[serde(rename = "Flags")]
    pub flags: Vec<CharacteristicFlag>,
    #[serde(rename = "Value")]
    #[serde_as(as = "Hex")]
    pub value: Vec<u8>,
}

#[serde_as]
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AdvertisementProperties {
    #[serde(rename = "Type")]
    pub advertisement_type: AdvertisementType,
    #[serde(rename = "LocalName")]
    pub local_name: String,
    #[serde(rename = "ServiceUUIDs")]
    pub service_uuids: Vec<GattUuid>,
    #[serde(rename = "ManufacturerData")]
    #[serde_as(as = "BTreeMap<_, Hex>")]
    pub manufacturer_data: BTreeMap<u16, Vec<u8>>,
    #[serde(rename = "ServiceData", skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<BTreeMap<_, Hex>>")]
    pub service_data: Option<BTreeMap<GattUuid, Vec<u8>>>,
    #[serde(rename = "Includes", skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<&'static str>,
}

/// A value change on one characteristic, forwarded to the host stack as a
/// properties-changed signal.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PropertyChanged {
    path: ObjectPath,
    value: Vec<u8>,
}

impl PropertyChanged {
    pub(crate) fn new(path: ObjectPath, value: Vec<u8>) -> Self {
        Self { path, value }
    }

    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Interface whose `Value` property changed.
    #[must_use]
    pub fn interface(&self) -> &'static str {
        GATT_CHARACTERISTIC_INTERFACE
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}
