use super::characteristic::{Characteristic, CharacteristicFlag, SignalSender};
use super::properties::{ObjectPath, ServiceProperties};
use super::uuid::GattUuid;

/// A GATT service and its characteristics, in declaration order.
#[derive(Debug)]
pub struct Service {
    path: ObjectPath,
    uuid: GattUuid,
    primary: bool,
    characteristics: Vec<Characteristic>,
    signals: SignalSender,
}

impl Service {
    pub(crate) fn new(path: ObjectPath, uuid: GattUuid, primary: bool, signals: SignalSender) -> Self {
        Self {
            path,
            uuid,
            primary,
            characteristics: Vec::new(),
            signals,
        }
    }

    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    #[must_use]
    pub fn uuid(&self) -> GattUuid {
        self.uuid
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    #[must_use]
    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    /// Appends a characteristic at `{service path}/char{index}` and returns its path.
    pub fn add_characteristic(
        &mut self,
        uuid: GattUuid,
        flags: &[CharacteristicFlag],
    ) -> ObjectPath {
        let index = self.characteristics.len();
        let path = self.path.child(&format!("char{index}"));
        self.characteristics.push(Characteristic::new(
            path.clone(),
            self.path.clone(),
            uuid,
            flags,
            self.signals.clone(),
        ));
        path
    }

    pub(crate) fn characteristic(&self, path: &ObjectPath) -> Option<&Characteristic> {
        self.characteristics
            .iter()
            .find(|characteristic| characteristic.path() == path)
    }

    pub(crate) fn characteristic_mut(&mut self, path: &ObjectPath) -> Option<&mut Characteristic> {
        self.characteristics
            .iter_mut()
            .find(|characteristic| characteristic.path() == path)
    }

    #[must_use]
    pub fn properties(&self) -> ServiceProperties {
        ServiceProperties {
            uuid: self.uuid,
            primary: self.primary,
            characteristics: self
                .characteristics
                .iter()
                .map(|characteristic| characteristic.path().clone())
                .collect(),
        }
    }
}
