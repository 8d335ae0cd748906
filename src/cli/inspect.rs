use std::collections::BTreeMap;
use std::io;

use anyhow::Result;
use serde::Serialize;
use tracing::instrument;

use crate::cli::OutputFormat;
use crate::config::EmulatorConfig;
use crate::emulator::Emulator;
use crate::gatt::{InterfaceProperties, ManagedObjects, ObjectPath, local_host_identifier};

use super::ui::{InspectView, Painter};

/// JSON shape of the `inspect` command.
#[derive(Debug, Serialize)]
struct InspectReport {
    objects: ManagedObjects,
    advertisement: BTreeMap<ObjectPath, InterfaceProperties>,
}

impl From<&Emulator> for InspectReport {
    fn from(emulator: &Emulator) -> Self {
        let advertisement = emulator.advertisement();
        Self {
            objects: emulator.application().managed_objects(),
            advertisement: BTreeMap::from([(
                advertisement.path().clone(),
                advertisement.interface_properties(),
            )]),
        }
    }
}

/// Executes the `inspect` command.
#[instrument(skip(config, out), level = "info", fields(?output_format))]
pub(crate) fn run<W>(
    config: &EmulatorConfig,
    out: &mut W,
    output_format: OutputFormat,
    use_colour: bool,
) -> Result<()>
where
    W: io::Write,
{
    let emulator = Emulator::new(config, &local_host_identifier());

    match output_format {
        OutputFormat::Pretty => {
            let painter = Painter::new(use_colour);
            writeln!(
                out,
                "{}",
                InspectView::new(emulator.application(), emulator.advertisement(), &painter)
            )?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &InspectReport::from(&emulator))?;
            writeln!(out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn json_report_lists_objects_and_advertisement() {
        let mut out = Vec::new();
        run(&EmulatorConfig::default(), &mut out, OutputFormat::Json, false)
            .expect("inspect should render");

        let report: serde_json::Value =
            serde_json::from_slice(&out).expect("output should be JSON");
        let objects = report["objects"]
            .as_object()
            .expect("objects should be a map");
        assert_eq!(8, objects.len());
        assert_eq!(
            "CBA20003-224D-11E6-9FB8-0002A5D5C51B",
            objects["/org/bluez/dock_emulator/service0/char0"]["org.bluez.GattCharacteristic1"]
                ["UUID"]
        );
        assert_eq!(
            "WoS1MB",
            report["advertisement"]["/org/bluez/dock_emulator/advertisement0"]
                ["org.bluez.LEAdvertisement1"]["LocalName"]
        );
    }

    #[test]
    fn pretty_report_is_plain_without_colour() {
        let mut out = Vec::new();
        run(&EmulatorConfig::default(), &mut out, OutputFormat::Pretty, false)
            .expect("inspect should render");

        let rendered = String::from_utf8(out).expect("output should be UTF-8");
        assert!(rendered.starts_with("Advertisement:"));
        assert!(!rendered.contains('\u{1b}'));
    }
}
