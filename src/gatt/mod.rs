//! GATT object model exposed to the host Bluetooth stack.

mod advertisement;
mod application;
mod characteristic;
mod properties;
mod service;
mod topology;
mod uuid;

pub use self::advertisement::{
    Advertisement, AdvertisementType, LabelSource, MAC_LABEL_LEN, MacLabel, local_host_identifier,
};
pub use self::application::Application;
pub use self::characteristic::{
    Characteristic, CharacteristicFlag, NotifyOutcome, SignalReceiver, SignalSender,
    signal_channel,
};
pub use self::properties::{
    AdvertisementProperties, CharacteristicProperties, GATT_CHARACTERISTIC_INTERFACE,
    GATT_SERVICE_INTERFACE, InterfaceProperties, LE_ADVERTISEMENT_INTERFACE, ManagedObjects,
    ObjectPath, PropertyChanged, ServiceProperties,
};
pub use self::service::Service;
pub use self::topology::{ADVERTISEMENT_PATH, APPLICATION_PATH, DockEndpoints, build_application};
pub use self::uuid::{GattUuid, GattUuidError};
