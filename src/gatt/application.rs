use super::characteristic::{Characteristic, SignalSender};
use super::properties::{InterfaceProperties, ManagedObjects, ObjectPath};
use super::service::Service;
use super::uuid::GattUuid;

/// The full object tree exposed to the host stack.
#[derive(Debug)]
pub struct Application {
    path: ObjectPath,
    services: Vec<Service>,
    signals: SignalSender,
}

impl Application {
    /// Creates an empty application rooted at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, signals: SignalSender) -> Self {
        Self {
            path: ObjectPath::new(path),
            services: Vec::new(),
            signals,
        }
    }

    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Appends a service at `{application path}/service{index}`.
    pub fn add_service(&mut self, uuid: GattUuid, primary: bool) -> &mut Service {
        let index = self.services.len();
        let path = self.path.child(&format!("service{index}"));
        self.services
            .push(Service::new(path, uuid, primary, self.signals.clone()));
        let last = self.services.len() - 1;
        &mut self.services[last]
    }

    /// Iterates every characteristic of every service.
    pub fn characteristics(&self) -> impl Iterator<Item = &Characteristic> {
        self.services
            .iter()
            .flat_map(|service| service.characteristics().iter())
    }

    #[must_use]
    pub fn characteristic(&self, path: &ObjectPath) -> Option<&Characteristic> {
        self.services
            .iter()
            .find_map(|service| service.characteristic(path))
    }

    pub fn characteristic_mut(&mut self, path: &ObjectPath) -> Option<&mut Characteristic> {
        self.services
            .iter_mut()
            .find_map(|service| service.characteristic_mut(path))
    }

    /// Builds the flattened object map answered to the host's discovery query.
    ///
    /// Recomputed on every call so current characteristic values are reported.
    #[must_use]
    pub fn managed_objects(&self) -> ManagedObjects {
        let mut objects = ManagedObjects::new();
        for service in &self.services {
            objects.insert(
                service.path().clone(),
                InterfaceProperties::Service(service.properties()),
            );
            for characteristic in service.characteristics() {
                objects.insert(
                    characteristic.path().clone(),
                    InterfaceProperties::Characteristic(characteristic.properties()),
                );
            }
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::gatt::{CharacteristicFlag, signal_channel};

    fn application(service_sizes: &[usize]) -> Application {
        let (signals, _receiver) = signal_channel();
        let mut application = Application::new("/app", signals);
        for (service_index, size) in service_sizes.iter().enumerate() {
            let service = application.add_service(GattUuid::short(service_index as u16), true);
            for char_index in 0..*size {
                service.add_characteristic(
                    GattUuid::short(0x1000 + char_index as u16),
                    &[CharacteristicFlag::Read],
                );
            }
        }
        application
    }

    #[test]
    fn managed_objects_list_every_characteristic_once() {
        let topologies: [&[usize]; 6] = [&[], &[0], &[1], &[2, 4], &[3, 0, 5], &[11]];
        for sizes in topologies {
            let application = application(sizes);
            let objects = application.managed_objects();

            let characteristic_entries = objects
                .values()
                .filter(|record| matches!(record, InterfaceProperties::Characteristic(_)))
                .count();
            let total: usize = sizes.iter().sum();
            assert_eq!(total, characteristic_entries);
            assert_eq!(total + sizes.len(), objects.len());
            for characteristic in application.characteristics() {
                assert!(objects.contains_key(characteristic.path()));
            }
        }
    }

    #[test]
    fn managed_objects_reflect_current_values() {
        let mut application = application(&[1]);
        let path = ObjectPath::new("/app/service0/char0");
        let characteristic = application
            .characteristic_mut(&path)
            .expect("characteristic should exist");
        characteristic.set_value_and_notify(vec![0x42]);

        let Some(InterfaceProperties::Characteristic(record)) =
            application.managed_objects().remove(&path)
        else {
            panic!("characteristic record should be present");
        };
        assert_eq!(vec![0x42], record.value);
    }
}
