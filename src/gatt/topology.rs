use super::application::Application;
use super::characteristic::SignalSender;
use super::properties::ObjectPath;
use crate::protocol::{EndpointId, endpoint_metadata};

/// Object path the GATT application is registered under.
pub const APPLICATION_PATH: &str = "/org/bluez/dock_emulator";

/// Object path the advertisement is registered under.
pub const ADVERTISEMENT_PATH: &str = "/org/bluez/dock_emulator/advertisement0";

const DOCK_SERVICE_CHARACTERISTICS: [EndpointId; 2] =
    [EndpointId::DockResponse, EndpointId::DockCommand];

const SWEEPER_SERVICE_CHARACTERISTICS: [EndpointId; 4] = [
    EndpointId::SweeperB001,
    EndpointId::SweeperB002,
    EndpointId::SweeperB003,
    EndpointId::SweeperB004,
];

/// Paths of the characteristics the dock protocol reads and writes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DockEndpoints {
    pub command: ObjectPath,
    pub response: ObjectPath,
}

/// Builds the fixed dock topology: the app-facing dock service followed by
/// the sweeper placeholder service, both primary.
#[must_use]
pub fn build_application(signals: SignalSender) -> (Application, DockEndpoints) {
    let mut application = Application::new(APPLICATION_PATH, signals);

    let dock = application.add_service(endpoint_metadata(EndpointId::DockService).uuid(), true);
    let dock_paths = DOCK_SERVICE_CHARACTERISTICS.map(|endpoint| {
        let metadata = endpoint_metadata(endpoint);
        dock.add_characteristic(metadata.uuid(), metadata.flags())
    });

    let sweeper =
        application.add_service(endpoint_metadata(EndpointId::SweeperService).uuid(), true);
    for endpoint in SWEEPER_SERVICE_CHARACTERISTICS {
        let metadata = endpoint_metadata(endpoint);
        sweeper.add_characteristic(metadata.uuid(), metadata.flags());
    }

    let [response, command] = dock_paths;
    (application, DockEndpoints { command, response })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::gatt::{CharacteristicFlag, GattUuid, InterfaceProperties, signal_channel};

    #[test]
    fn dock_topology_has_two_services_and_six_characteristics() {
        let (signals, _receiver) = signal_channel();
        let (application, endpoints) = build_application(signals);

        let services = application.services();
        assert_eq!(2, services.len());
        assert_eq!(
            "CBA20D00-224D-11E6-9FB8-0002A5D5C51B",
            services[0].uuid().to_string()
        );
        assert_eq!(GattUuid::short(0xB000), services[1].uuid());
        assert!(services.iter().all(|service| service.is_primary()));
        assert_eq!(6, application.characteristics().count());

        assert_eq!(
            "/org/bluez/dock_emulator/service0/char0",
            endpoints.response.as_str()
        );
        assert_eq!(
            "/org/bluez/dock_emulator/service0/char1",
            endpoints.command.as_str()
        );
    }

    #[test]
    fn dock_endpoints_declare_expected_flags() {
        let (signals, _receiver) = signal_channel();
        let (application, endpoints) = build_application(signals);

        let response = application
            .characteristic(&endpoints.response)
            .expect("response characteristic should exist");
        assert!(response.supports(CharacteristicFlag::Notify));
        let command = application
            .characteristic(&endpoints.command)
            .expect("command characteristic should exist");
        assert!(command.supports(CharacteristicFlag::Write));
        assert!(!command.supports(CharacteristicFlag::Notify));
    }

    #[test]
    fn every_object_lives_under_the_application_path() {
        let (signals, _receiver) = signal_channel();
        let (application, _endpoints) = build_application(signals);

        let objects = application.managed_objects();
        assert_eq!(8, objects.len());
        for (path, record) in &objects {
            assert!(path.is_under(application.path()));
            if let InterfaceProperties::Characteristic(properties) = record {
                assert!(path.is_under(&properties.service));
            }
        }
    }
}
