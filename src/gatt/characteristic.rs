use serde_with::SerializeDisplay;
use strum_macros::{Display, EnumIter};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use super::properties::{CharacteristicProperties, ObjectPath, PropertyChanged};
use super::uuid::GattUuid;
use crate::utils::hex_field;

/// Sender half of the property-changed signal stream.
pub type SignalSender = mpsc::UnboundedSender<PropertyChanged>;

/// Receiver half of the property-changed signal stream.
pub type SignalReceiver = mpsc::UnboundedReceiver<PropertyChanged>;

/// Creates a property-changed signal stream.
#[must_use]
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    mpsc::unbounded_channel()
}

/// Operations a characteristic declares to remote centrals.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, EnumIter, Display, SerializeDisplay,
)]
pub enum CharacteristicFlag {
    #[strum(to_string = "read")]
    Read,
    #[strum(to_string = "write")]
    Write,
    #[strum(to_string = "write-without-response")]
    WriteWithoutResponse,
    #[strum(to_string = "notify")]
    Notify,
}

/// Result of [`Characteristic::set_value_and_notify`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NotifyOutcome {
    /// A property-changed signal was emitted.
    Signalled,
    /// The value was stored but nobody is subscribed, so no signal was emitted.
    SkippedNoSubscriber,
}

/// One GATT characteristic of the emulated peripheral.
#[derive(Debug)]
pub struct Characteristic {
    path: ObjectPath,
    service_path: ObjectPath,
    uuid: GattUuid,
    flags: Vec<CharacteristicFlag>,
    value: Vec<u8>,
    notifying: bool,
    signals: SignalSender,
}

impl Characteristic {
    pub(crate) fn new(
        path: ObjectPath,
        service_path: ObjectPath,
        uuid: GattUuid,
        flags: &[CharacteristicFlag],
        signals: SignalSender,
    ) -> Self {
        Self {
            path,
            service_path,
            uuid,
            flags: flags.to_vec(),
            value: Vec::new(),
            notifying: false,
            signals,
        }
    }

    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    #[must_use]
    pub fn service_path(&self) -> &ObjectPath {
        &self.service_path
    }

    #[must_use]
    pub fn uuid(&self) -> GattUuid {
        self.uuid
    }

    #[must_use]
    pub fn flags(&self) -> &[CharacteristicFlag] {
        &self.flags
    }

    /// Returns whether `flag` is among the declared operations.
    #[must_use]
    pub fn supports(&self, flag: CharacteristicFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Returns whether a central is currently subscribed to notifications.
    #[must_use]
    pub fn is_notifying(&self) -> bool {
        self.notifying
    }

    /// Returns the stored value without side effects.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Serves a read request from the host stack.
    pub fn read_value(&self) -> Vec<u8> {
        debug!(uuid = %self.uuid, path = %self.path, len = self.value.len(), "gatt: read");
        self.value.clone()
    }

    /// Accepts a write from the host stack.
    ///
    /// Writes are not checked against the declared flags and never change the
    /// stored value; protocol handling for command characteristics happens in
    /// the dock handler.
    pub fn write_value(&self, data: &[u8], writer: Option<&str>) {
        info!(
            uuid = %self.uuid,
            device = writer.unwrap_or("?"),
            len = data.len(),
            hex = %hex_field(data),
            "gatt: write"
        );
    }

    /// Marks the characteristic as subscribed. Idempotent.
    pub fn start_notify(&mut self) {
        self.notifying = true;
        info!(uuid = %self.uuid, "gatt: notify start");
    }

    /// Marks the characteristic as unsubscribed. Idempotent.
    pub fn stop_notify(&mut self) {
        self.notifying = false;
        info!(uuid = %self.uuid, "gatt: notify stop");
    }

    /// Replaces the stored value and signals the change when subscribed.
    ///
    /// Missed notifications are not queued: an unsubscribed update only keeps
    /// the latest value, which is not replayed on a later subscription.
    #[instrument(skip(self, value), level = "debug", fields(uuid = %self.uuid, len = value.len()))]
    pub fn set_value_and_notify(&mut self, value: Vec<u8>) -> NotifyOutcome {
        self.value = value;

        if !self.notifying {
            debug!("gatt: value updated without subscriber");
            return NotifyOutcome::SkippedNoSubscriber;
        }

        let change = PropertyChanged::new(self.path.clone(), self.value.clone());
        if self.signals.send(change).is_err() {
            debug!("gatt: property-changed stream is closed");
        }
        NotifyOutcome::Signalled
    }

    /// Renders the characteristic's interface properties.
    #[must_use]
    pub fn properties(&self) -> CharacteristicProperties {
        CharacteristicProperties {
            service: self.service_path.clone(),
            uuid: self.uuid,
            flags: self.flags.clone(),
            value: self.value.clone(),
        }
    }
}
