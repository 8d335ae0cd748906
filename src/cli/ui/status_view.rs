use std::fmt::{self, Display, Formatter};

use crate::cli::status::StatusReport;

use super::painter::Painter;
use super::table::Table;

/// Renders the `status` report.
pub(crate) struct StatusView<'a> {
    report: &'a StatusReport<'a>,
    painter: &'a Painter,
}

impl<'a> StatusView<'a> {
    pub(crate) fn new(report: &'a StatusReport<'a>, painter: &'a Painter) -> Self {
        Self { report, painter }
    }

    fn adapter_table(&self) -> Table {
        let painter = self.painter;
        let report = self.report;
        let adapter = &report.adapter;
        let advertising = if report.advertising {
            painter.value(format!(
                "{} of {} slots in use",
                adapter.active_advertisements, adapter.supported_advertisements
            ))
        } else {
            painter.absent("idle")
        };

        let mut table = Table::settings();
        table
            .push_setting(
                painter,
                "config",
                painter.value(report.config.display().to_string()),
            )
            .push_setting(
                painter,
                "adapter",
                painter.adapter(&adapter.name, report.configured_adapter),
            )
            .push_setting(painter, "address", painter.value(&adapter.address))
            .push_setting(painter, "powered", painter.switch(adapter.powered, "yes", "no"))
            .push_setting(
                painter,
                "discoverable",
                painter.switch(adapter.discoverable, "yes", "no"),
            )
            .push_setting(painter, "advertising", advertising);
        table
    }
}

impl Display for StatusView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.painter.heading("Host adapter:"))?;
        write!(f, "\n{}", self.adapter_table())?;
        if self.report.is_fallback() {
            let note = "configured adapter is missing; `run` falls back to the one above";
            write!(f, "\n{}", self.painter.absent(note))?;
        }
        Ok(())
    }
}
