use std::fmt::{self, Display, Formatter};

use crate::cli::config::ConfigReport;

use super::painter::Painter;
use super::table::Table;

/// Renders the `config get` report, one row per YAML setting.
pub(crate) struct ConfigView<'a> {
    report: &'a ConfigReport<'a>,
    painter: &'a Painter,
}

impl<'a> ConfigView<'a> {
    pub(crate) fn new(report: &'a ConfigReport<'a>, painter: &'a Painter) -> Self {
        Self { report, painter }
    }

    fn optional(&self, value: Option<&String>, placeholder: &str) -> String {
        value.map_or_else(
            || self.painter.absent(placeholder),
            |value| self.painter.value(value),
        )
    }
}

impl Display for ConfigView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let painter = self.painter;
        let report = self.report;

        let mut table = Table::settings();
        table
            .push_setting(painter, "adapter", painter.value(report.adapter))
            .push_setting(painter, "local_name", painter.value(report.local_name))
            .push_setting(painter, "fw_major", painter.value(report.fw_major.to_string()))
            .push_setting(painter, "fw_minor", painter.value(report.fw_minor.to_string()))
            .push_setting(painter, "company_id", painter.value(&report.company_id))
            .push_setting(
                painter,
                "manufacturer_mac_label",
                self.optional(report.manufacturer_mac_label.as_ref(), "<from hostname>"),
            )
            .push_setting(
                painter,
                "include_tx_power",
                painter.switch(report.include_tx_power, "true", "false"),
            )
            .push_setting(
                painter,
                "advertise_service_data",
                painter.switch(report.advertise_service_data, "true", "false"),
            )
            .push_setting(
                painter,
                "service_data_uuid",
                self.optional(report.service_data_uuid.as_ref(), "-"),
            )
            .push_setting(
                painter,
                "service_data_hex",
                self.optional(report.service_data_hex.as_ref(), "-"),
            )
            .push_setting(
                painter,
                "advertise_service_uuids",
                painter.list(&report.advertise_service_uuids, "<none>"),
            );

        write!(f, "{}", painter.heading("Configuration:"))?;
        write!(f, "\n{table}")
    }
}
