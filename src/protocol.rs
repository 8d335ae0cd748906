use std::collections::HashMap;
use std::sync::LazyLock;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::gatt::{CharacteristicFlag, GattUuid};

/// Endpoints exposed by the emulated dock.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Display)]
pub enum EndpointId {
    /// App-facing dock service.
    #[strum(to_string = "dock_service")]
    DockService,
    /// Dock response characteristic, notified with response frames.
    #[strum(to_string = "dock_response")]
    DockResponse,
    /// Dock command characteristic, written with command frames.
    #[strum(to_string = "dock_command")]
    DockCommand,
    /// Sweeper-facing discovery placeholder service.
    #[strum(to_string = "sweeper_service")]
    SweeperService,
    #[strum(to_string = "sweeper_b001")]
    SweeperB001,
    #[strum(to_string = "sweeper_b002")]
    SweeperB002,
    #[strum(to_string = "sweeper_b003")]
    SweeperB003,
    #[strum(to_string = "sweeper_b004")]
    SweeperB004,
}

/// Endpoint category in GATT.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub(crate) enum EndpointKind {
    #[strum(to_string = "service")]
    Service,
    #[strum(to_string = "characteristic")]
    Characteristic,
}

/// Descriptive metadata for one endpoint.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct EndpointMetadata {
    name: &'static str,
    uuid: GattUuid,
    kind: EndpointKind,
    flags: &'static [CharacteristicFlag],
}

impl EndpointMetadata {
    /// Human-readable endpoint name.
    pub(crate) fn name(self) -> &'static str {
        self.name
    }

    /// Endpoint UUID as it is declared to the host stack.
    pub(crate) fn uuid(self) -> GattUuid {
        self.uuid
    }

    pub(crate) fn kind(self) -> EndpointKind {
        self.kind
    }

    /// Permitted operations; empty for services.
    pub(crate) fn flags(self) -> &'static [CharacteristicFlag] {
        self.flags
    }
}

/// Endpoint metadata keyed by typed endpoint IDs.
pub(crate) static ENDPOINTS_BY_ID: LazyLock<HashMap<EndpointId, EndpointMetadata>> =
    LazyLock::new(|| {
        EndpointId::iter()
            .map(|endpoint| (endpoint, metadata_for(endpoint)))
            .collect()
    });

/// Returns metadata for one endpoint.
pub(crate) fn endpoint_metadata(endpoint: EndpointId) -> EndpointMetadata {
    *ENDPOINTS_BY_ID
        .get(&endpoint)
        .unwrap_or(&metadata_for(endpoint))
}

/// Resolves a declared UUID back to its endpoint.
pub(crate) fn endpoint_for_uuid(uuid: GattUuid) -> Option<EndpointId> {
    EndpointId::iter().find(|endpoint| endpoint_metadata(*endpoint).uuid() == uuid)
}

const DOCK_COMMAND_FLAGS: &[CharacteristicFlag] = &[
    CharacteristicFlag::Write,
    CharacteristicFlag::WriteWithoutResponse,
];
const NOTIFY_WRITE_FLAGS: &[CharacteristicFlag] = &[
    CharacteristicFlag::Notify,
    CharacteristicFlag::Write,
    CharacteristicFlag::WriteWithoutResponse,
];
const READ_WRITE_FLAGS: &[CharacteristicFlag] = &[
    CharacteristicFlag::Read,
    CharacteristicFlag::Write,
    CharacteristicFlag::WriteWithoutResponse,
];

fn metadata_for(endpoint: EndpointId) -> EndpointMetadata {
    match endpoint {
        EndpointId::DockService => EndpointMetadata {
            name: "dock service",
            uuid: GattUuid::full(0xCBA2_0D00_224D_11E6_9FB8_0002_A5D5_C51B),
            kind: EndpointKind::Service,
            flags: &[],
        },
        EndpointId::DockResponse => EndpointMetadata {
            name: "dock response",
            uuid: GattUuid::full(0xCBA2_0003_224D_11E6_9FB8_0002_A5D5_C51B),
            kind: EndpointKind::Characteristic,
            flags: NOTIFY_WRITE_FLAGS,
        },
        EndpointId::DockCommand => EndpointMetadata {
            name: "dock command",
            uuid: GattUuid::full(0xCBA2_0002_224D_11E6_9FB8_0002_A5D5_C51B),
            kind: EndpointKind::Characteristic,
            flags: DOCK_COMMAND_FLAGS,
        },
        EndpointId::SweeperService => EndpointMetadata {
            name: "sweeper placeholder service",
            uuid: GattUuid::short(0xB000),
            kind: EndpointKind::Service,
            flags: &[],
        },
        EndpointId::SweeperB001 => EndpointMetadata {
            name: "sweeper placeholder read/write",
            uuid: GattUuid::short(0xB001),
            kind: EndpointKind::Characteristic,
            flags: READ_WRITE_FLAGS,
        },
        EndpointId::SweeperB002 => EndpointMetadata {
            name: "sweeper placeholder read/write",
            uuid: GattUuid::short(0xB002),
            kind: EndpointKind::Characteristic,
            flags: READ_WRITE_FLAGS,
        },
        EndpointId::SweeperB003 => EndpointMetadata {
            name: "sweeper placeholder notify/write",
            uuid: GattUuid::short(0xB003),
            kind: EndpointKind::Characteristic,
            flags: NOTIFY_WRITE_FLAGS,
        },
        EndpointId::SweeperB004 => EndpointMetadata {
            name: "sweeper placeholder notify/write",
            uuid: GattUuid::short(0xB004),
            kind: EndpointKind::Characteristic,
            flags: NOTIFY_WRITE_FLAGS,
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn endpoint_metadata_contains_expected_names() {
        let command = endpoint_metadata(EndpointId::DockCommand);
        assert_eq!("dock command", command.name());
        assert_eq!(EndpointKind::Characteristic, command.kind());

        let service = endpoint_metadata(EndpointId::SweeperService);
        assert_eq!("B000", service.uuid().to_string());
        assert!(service.flags().is_empty());
    }

    #[test]
    fn endpoint_for_uuid_resolves_declared_uuids() {
        let response = "cba20003-224d-11e6-9fb8-0002a5d5c51b"
            .parse()
            .expect("uuid should parse");
        assert_eq!(Some(EndpointId::DockResponse), endpoint_for_uuid(response));
        assert_eq!(
            Some(EndpointId::SweeperB004),
            endpoint_for_uuid(GattUuid::short(0xB004))
        );
        assert_eq!(None, endpoint_for_uuid(GattUuid::short(0xFFFF)));
    }

    #[test]
    fn dock_uuids_render_in_full_form() {
        assert_eq!(
            "CBA20D00-224D-11E6-9FB8-0002A5D5C51B",
            endpoint_metadata(EndpointId::DockService).uuid().to_string()
        );
    }
}
