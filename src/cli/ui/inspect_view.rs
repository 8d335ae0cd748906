use std::fmt::{self, Display, Formatter};

use strum::IntoEnumIterator;

use crate::gatt::{Advertisement, Application, InterfaceProperties};
use crate::protocol::{self, EndpointId};

use super::painter::Painter;
use super::table::Table;

/// Renders the advertisement, the endpoint catalogue and the object tree.
pub(crate) struct InspectView<'a> {
    application: &'a Application,
    advertisement: &'a Advertisement,
    painter: &'a Painter,
}

impl<'a> InspectView<'a> {
    pub(crate) fn new(
        application: &'a Application,
        advertisement: &'a Advertisement,
        painter: &'a Painter,
    ) -> Self {
        Self {
            application,
            advertisement,
            painter,
        }
    }

    fn advertisement_table(&self) -> Table {
        let painter = self.painter;
        let advertisement = self.advertisement;
        let service_data = match advertisement.service_data() {
            Some(data) => format!(
                "{}: {}",
                painter.uuid(data.uuid()),
                painter.bytes(data.payload())
            ),
            None => painter.absent("<disabled>"),
        };

        let mut table = Table::settings();
        table
            .push_setting(painter, "path", painter.value(advertisement.path().as_str()))
            .push_setting(
                painter,
                "type",
                painter.value(advertisement.advertisement_type().to_string()),
            )
            .push_setting(painter, "local name", painter.value(advertisement.local_name()))
            .push_setting(
                painter,
                "company id",
                painter.value(format!("0x{:04X}", advertisement.company_id())),
            )
            .push_setting(
                painter,
                "manufacturer label",
                format!(
                    "{} {}",
                    painter.value(advertisement.manufacturer_label().to_string()),
                    painter.label_source(advertisement.label_source())
                ),
            )
            .push_setting(
                painter,
                "service uuids",
                painter.list(advertisement.service_uuids(), "<none>"),
            )
            .push_setting(painter, "service data", service_data)
            .push_setting(
                painter,
                "tx power",
                painter.switch(advertisement.include_tx_power(), "included", "omitted"),
            );
        table
    }

    fn endpoints_table(&self) -> Table {
        let mut table = Table::new(["uuid", "kind", "name", "flags"]);
        for endpoint in EndpointId::iter() {
            let metadata = protocol::endpoint_metadata(endpoint);
            table.push_row([
                self.painter.uuid(metadata.uuid()),
                self.painter.field(&metadata.kind().to_string()),
                self.painter.value(metadata.name()),
                self.painter.list(metadata.flags(), "-"),
            ]);
        }
        table
    }

    fn objects_table(&self) -> Table {
        let mut table = Table::new(["path", "interface", "uuid", "endpoint", "detail"]);
        for (path, record) in &self.application.managed_objects() {
            let (uuid, detail) = match record {
                InterfaceProperties::Service(service) => (
                    Some(service.uuid),
                    self.painter.switch(service.primary, "primary", "secondary"),
                ),
                InterfaceProperties::Characteristic(characteristic) => (
                    Some(characteristic.uuid),
                    self.painter.list(&characteristic.flags, "-"),
                ),
                InterfaceProperties::Advertisement(advertisement) => {
                    (None, self.painter.value(&advertisement.local_name))
                }
            };
            let endpoint = uuid
                .and_then(protocol::endpoint_for_uuid)
                .map(|endpoint| protocol::endpoint_metadata(endpoint).name());
            table.push_row([
                self.painter.value(path.as_str()),
                self.painter.field(record.interface_name()),
                uuid.map_or_else(|| self.painter.absent("-"), |uuid| self.painter.uuid(uuid)),
                endpoint.map_or_else(|| self.painter.absent("-"), |name| self.painter.value(name)),
                detail,
            ]);
        }
        table
    }
}

impl Display for InspectView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.painter.heading("Advertisement:"))?;
        write!(f, "\n{}", self.advertisement_table())?;
        writeln!(f)?;
        write!(f, "\n{}", self.painter.heading("Dock endpoints:"))?;
        write!(f, "\n{}", self.endpoints_table())?;
        writeln!(f)?;
        write!(f, "\n{}", self.painter.heading("GATT objects:"))?;
        write!(f, "\n{}", self.objects_table())
    }
}
