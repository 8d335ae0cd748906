use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;
use pretty_assertions::assert_eq;

#[derive(Debug, Default)]
struct FakeTerminalClient;

impl dock_emulator::TerminalClient for FakeTerminalClient {
    fn stdout_is_terminal(&self) -> bool {
        false
    }

    fn stderr_is_terminal(&self) -> bool {
        false
    }
}

fn config_file(name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("dock-emulator-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

async fn run_with_argv<const N: usize>(argv: [&str; N]) -> anyhow::Result<String> {
    let args = dock_emulator::Args::try_parse_from(argv)?;
    let mut output = Vec::new();
    dock_emulator::run_with_terminal(args, &mut output, &FakeTerminalClient).await?;
    Ok(String::from_utf8(output)?)
}

#[tokio::test]
async fn inspect_prints_json_when_stdout_is_piped() -> anyhow::Result<()> {
    let path = config_file("inspect.yml", "dock_emulator:\n  local_name: Bench\n")?;
    let path = path.to_string_lossy().into_owned();

    let stdout = run_with_argv(["dock-emulator", "--config", path.as_str(), "inspect"]).await?;

    let report: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(
        "Bench",
        report["advertisement"]["/org/bluez/dock_emulator/advertisement0"]
            ["org.bluez.LEAdvertisement1"]["LocalName"]
    );
    assert_eq!(
        true,
        report["objects"]["/org/bluez/dock_emulator/service0"]["org.bluez.GattService1"]
            ["Primary"]
    );

    Ok(())
}

#[tokio::test]
async fn inspect_pretty_format_renders_tables() -> anyhow::Result<()> {
    let path = config_file("pretty.yml", "")?;
    let path = path.to_string_lossy().into_owned();

    let stdout = run_with_argv([
        "dock-emulator",
        "inspect",
        "--format",
        "pretty",
        "--config",
        path.as_str(),
    ])
    .await?;

    assert!(stdout.starts_with("Advertisement:"));
    assert!(stdout.contains("GATT objects:"));
    assert!(stdout.contains("/org/bluez/dock_emulator/service0/char1"));

    Ok(())
}

#[tokio::test]
async fn fake_run_completes_after_script() -> anyhow::Result<()> {
    let path = config_file("run.yml", "dock_emulator:\n  fw_major: 4\n")?;
    let path = path.to_string_lossy().into_owned();

    let stdout = run_with_argv([
        "dock-emulator",
        "--config",
        path.as_str(),
        "--fake",
        "--fake-script",
        "notify:CBA20003-224D-11E6-9FB8-0002A5D5C51B;write:CBA20002-224D-11E6-9FB8-0002A5D5C51B:570100",
        "run",
    ])
    .await?;

    assert_eq!("", stdout);

    Ok(())
}

#[tokio::test]
async fn fake_status_reports_the_fake_adapter() -> anyhow::Result<()> {
    let path = config_file("status.yml", "dock_emulator:\n  adapter: hci1\n")?;
    let path = path.to_string_lossy().into_owned();

    let stdout =
        run_with_argv(["dock-emulator", "--config", path.as_str(), "--fake", "status"]).await?;

    let report: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(path.as_str(), report["config"]);
    assert_eq!("hci1", report["configured_adapter"]);
    assert_eq!("fake0", report["adapter"]["name"]);
    assert_eq!(false, report["advertising"]);

    Ok(())
}

#[tokio::test]
async fn config_get_prints_effective_settings() -> anyhow::Result<()> {
    let path = config_file(
        "config-get.yml",
        "k10_emulator:\n  fd3d_service_data_hex: \"0A0B\"\n  fw_minor: 7\n",
    )?;
    let path = path.to_string_lossy().into_owned();

    let stdout =
        run_with_argv(["dock-emulator", "--config", path.as_str(), "config", "get"]).await?;

    let report: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(7, report["fw_minor"]);
    assert_eq!("0a0b", report["service_data_hex"]);
    assert_eq!("WoS1MB", report["local_name"]);

    Ok(())
}

#[tokio::test]
async fn config_get_pretty_lists_settings() -> anyhow::Result<()> {
    let path = config_file("config-pretty.yml", "")?;
    let path = path.to_string_lossy().into_owned();

    let stdout = run_with_argv([
        "dock-emulator",
        "config",
        "get",
        "--format",
        "pretty",
        "--config",
        path.as_str(),
    ])
    .await?;

    assert!(stdout.starts_with("Configuration:"));
    assert!(stdout.contains("include_tx_power"));

    Ok(())
}

#[tokio::test]
async fn unknown_config_key_exits_with_code_one() -> anyhow::Result<()> {
    let path = config_file("unknown-key.yml", "dock_emulator:\n  fw_patch: 1\n")?;
    let path = path.to_string_lossy().into_owned();

    let error = run_with_argv(["dock-emulator", "--config", path.as_str(), "config", "get"])
        .await
        .expect_err("unknown keys should be rejected");

    assert_eq!(dock_emulator::EXIT_FAILURE, dock_emulator::exit_code_for(&error));
    Ok(())
}

#[tokio::test]
async fn missing_config_exits_with_code_two() {
    let error = run_with_argv([
        "dock-emulator",
        "--config",
        "/nonexistent/dock-emulator/config.yml",
        "--fake",
    ])
    .await
    .expect_err("missing config should fail");

    assert_eq!(dock_emulator::EXIT_CONFIG_NOT_FOUND, dock_emulator::exit_code_for(&error));
    assert!(format!("{error:#}").contains("config not found"));
}

#[tokio::test]
async fn malformed_config_exits_with_code_one() -> anyhow::Result<()> {
    let path = config_file("malformed.yml", "dock_emulator:\n  company_id: 0x10000\n")?;
    let path = path.to_string_lossy().into_owned();

    let error = run_with_argv(["dock-emulator", "--config", path.as_str(), "inspect"])
        .await
        .expect_err("out-of-range company id should fail");

    assert_eq!(dock_emulator::EXIT_FAILURE, dock_emulator::exit_code_for(&error));

    Ok(())
}

#[tokio::test]
async fn rejected_registration_exits_with_code_one() -> anyhow::Result<()> {
    let path = config_file("rejected.yml", "")?;
    let path = path.to_string_lossy().into_owned();

    let error = run_with_argv([
        "dock-emulator",
        "--config",
        path.as_str(),
        "--fake",
        "--fake-reject",
        "application",
    ])
    .await
    .expect_err("rejected application should fail");

    assert_eq!(dock_emulator::EXIT_FAILURE, dock_emulator::exit_code_for(&error));
    assert!(format!("{error:#}").contains("rejected"));

    Ok(())
}

#[test]
fn fake_reject_requires_fake_mode() {
    let error = dock_emulator::Args::try_parse_from(["dock-emulator", "--fake-reject", "advertisement"])
        .expect_err("--fake-reject should require --fake");

    assert_eq!(ErrorKind::MissingRequiredArgument, error.kind());
}

#[test]
fn unknown_subcommand_is_rejected() {
    let error = dock_emulator::Args::try_parse_from(["dock-emulator", "scan"])
        .expect_err("unknown subcommand should fail");

    assert_eq!(ErrorKind::InvalidSubcommand, error.kind());
}
