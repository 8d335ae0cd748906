use std::io;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::instrument;

use crate::cli::{OutputArgs, OutputFormat};
use crate::config::EmulatorConfig;
use crate::utils::hex_field;

use super::ui::{ConfigView, Painter};

/// Arguments for the `config` command.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

impl ConfigArgs {
    /// Creates config arguments for one action.
    ///
    /// ```
    /// use dock_emulator::{ConfigAction, ConfigArgs, OutputArgs};
    ///
    /// let args = ConfigArgs::new(ConfigAction::Get(OutputArgs::new(None)));
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(action: ConfigAction) -> Self {
        Self { action }
    }

    #[must_use]
    pub fn action(&self) -> &ConfigAction {
        &self.action
    }
}

/// Action performed by the `config` command.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Print the validated configuration with defaults applied.
    Get(OutputArgs),
}

/// Effective configuration, keyed the way the YAML file spells its settings.
///
/// The JSON form can be pasted under the `dock_emulator` root key as is.
#[derive(Debug, Serialize)]
pub(crate) struct ConfigReport<'a> {
    pub(crate) adapter: &'a str,
    pub(crate) local_name: &'a str,
    pub(crate) fw_major: u32,
    pub(crate) fw_minor: u32,
    pub(crate) company_id: String,
    pub(crate) manufacturer_mac_label: Option<String>,
    pub(crate) include_tx_power: bool,
    pub(crate) advertise_service_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) service_data_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) service_data_hex: Option<String>,
    pub(crate) advertise_service_uuids: Vec<String>,
}

impl<'a> From<&'a EmulatorConfig> for ConfigReport<'a> {
    fn from(config: &'a EmulatorConfig) -> Self {
        let service_data = config.service_data();
        Self {
            adapter: config.adapter(),
            local_name: config.local_name(),
            fw_major: config.firmware().major(),
            fw_minor: config.firmware().minor(),
            company_id: format!("0x{:04X}", config.company_id()),
            manufacturer_mac_label: config.manufacturer_label().map(|label| label.to_string()),
            include_tx_power: config.include_tx_power(),
            advertise_service_data: service_data.is_some(),
            service_data_uuid: service_data.map(|data| data.uuid().to_string()),
            service_data_hex: service_data.map(|data| hex_field(data.payload())),
            advertise_service_uuids: config
                .advertised_service_uuids()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Executes the `config get` command.
#[instrument(skip(config, out), level = "info", fields(?output_format))]
pub(crate) fn run_get<W>(
    config: &EmulatorConfig,
    out: &mut W,
    output_format: OutputFormat,
    use_colour: bool,
) -> Result<()>
where
    W: io::Write,
{
    let report = ConfigReport::from(config);

    match output_format {
        OutputFormat::Pretty => {
            let painter = Painter::new(use_colour);
            writeln!(out, "{}", ConfigView::new(&report, &painter))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{ServiceData, parse_config};
    use crate::gatt::{GattUuid, MacLabel};

    #[test]
    fn default_report_spells_out_every_setting() {
        let mut out = Vec::new();
        run_get(&EmulatorConfig::default(), &mut out, OutputFormat::Json, false)
            .expect("config get should render");

        let report: serde_json::Value =
            serde_json::from_slice(&out).expect("output should be JSON");
        assert_eq!(
            serde_json::json!({
                "adapter": "hci0",
                "local_name": "WoS1MB",
                "fw_major": 1,
                "fw_minor": 0,
                "company_id": "0x0969",
                "manufacturer_mac_label": null,
                "include_tx_power": true,
                "advertise_service_data": true,
                "service_data_uuid": "FD3D",
                "service_data_hex": "00",
                "advertise_service_uuids": [],
            }),
            report
        );
    }

    #[test]
    fn report_feeds_back_into_the_parser() {
        let config = EmulatorConfig::builder()
            .adapter("hci1")
            .company_id(0x1234)
            .manufacturer_label(MacLabel::new([1, 2, 3, 4, 5, 6]))
            .service_data(ServiceData::new(GattUuid::short(0xFD3D), vec![0xAB, 0xCD]))
            .advertised_service_uuids(vec![GattUuid::short(0xB000)])
            .build();
        let json = serde_json::to_string(&ConfigReport::from(&config))
            .expect("report should serialise");

        let reparsed = parse_config(&format!("dock_emulator: {json}\n"))
            .expect("report should be a valid settings block");
        assert_eq!(config, reparsed);
    }

    #[test]
    fn disabled_service_data_omits_its_keys() {
        let config = EmulatorConfig::builder().build();

        let report = serde_json::to_value(ConfigReport::from(&config))
            .expect("report should serialise");
        assert_eq!(false, report["advertise_service_data"]);
        assert!(report.get("service_data_uuid").is_none());
        assert!(report.get("service_data_hex").is_none());
    }
}
