use std::path::PathBuf;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

fn write_config(name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("dock-emulator-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn full_file_is_loaded_and_validated() -> anyhow::Result<()> {
    let path = write_config(
        "full.yml",
        r#"
dock_emulator:
  adapter: hci1
  local_name: Dock-Test
  fw_major: "0x02"
  fw_minor: 7
  company_id: "2409"
  manufacturer_mac_label: "01-02-03-04-05-06"
  include_tx_power: false
  service_data_uuid: fd3d
  service_data_hex: "00 11"
  advertise_service_uuids:
    - CBA20D00-224D-11E6-9FB8-0002A5D5C51B
"#,
    )?;

    let config = dock_emulator::load_config(&path)?;

    assert_eq!("hci1", config.adapter());
    assert_eq!("Dock-Test", config.local_name());
    assert_eq!(dock_emulator::FirmwareVersion::new(2, 7), config.firmware());
    assert_eq!(0x0969, config.company_id());
    assert_eq!(
        Some(dock_emulator::MacLabel::new([1, 2, 3, 4, 5, 6])),
        config.manufacturer_label()
    );
    assert!(!config.include_tx_power());
    let service_data = config.service_data().expect("service data should be enabled");
    assert_eq!("FD3D", service_data.uuid().to_string());
    assert_eq!(&[0x00, 0x11], service_data.payload());
    assert_eq!(
        vec!["CBA20D00-224D-11E6-9FB8-0002A5D5C51B".to_string()],
        config
            .advertised_service_uuids()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    );

    Ok(())
}

#[test]
fn empty_file_yields_defaults() -> anyhow::Result<()> {
    let path = write_config("empty.yml", "")?;

    let config = dock_emulator::load_config(&path)?;

    assert_eq!("hci0", config.adapter());
    assert_eq!("WoS1MB", config.local_name());
    assert_eq!(dock_emulator::FirmwareVersion::new(1, 0), config.firmware());
    assert_eq!(None, config.manufacturer_label());

    Ok(())
}

#[test]
fn missing_file_is_not_found() {
    let path = std::env::temp_dir().join("dock-emulator-config-does-not-exist.yml");

    let result = dock_emulator::load_config(&path);

    assert_matches!(result, Err(dock_emulator::ConfigError::NotFound { path: missing }) if missing == path);
}

#[test]
fn bad_label_length_is_rejected_from_file() -> anyhow::Result<()> {
    let path = write_config(
        "short-label.yml",
        "dock_emulator:\n  manufacturer_mac_label: \"AA:BB:CC\"\n",
    )?;

    let result = dock_emulator::load_config(&path);

    assert_matches!(
        result,
        Err(dock_emulator::ConfigError::InvalidLabelLength { actual: 3 })
    );

    Ok(())
}
