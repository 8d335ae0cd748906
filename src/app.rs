use std::io;

use anyhow::Result;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{info, instrument, warn};

use crate::cli::{Args, Command, ConfigAction, LogLevel, OutputArgs, OutputFormat};
use crate::config::{EmulatorConfig, load_config};
use crate::emulator::{Emulator, RunSummary};
use crate::error::ConfigError;
use crate::gatt::local_host_identifier;
use crate::host::{FakeHostConfig, HostBackend, host_stack_from_backend};
use crate::telemetry;
use crate::terminal::{SystemTerminalClient, TerminalClient};

const SERVICE_NAME: &str = "dock-emulator";

/// Exit status for a successful run or a clean shutdown.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status for every failure other than a missing configuration file.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when the configuration file does not exist.
pub const EXIT_CONFIG_NOT_FOUND: u8 = 2;

/// Runs the parsed command against the real standard streams.
///
/// ```no_run
/// # async fn run() -> anyhow::Result<()> {
/// use clap::Parser;
///
/// let args = dock_emulator::Args::try_parse_from(["dock-emulator", "inspect"])?;
/// dock_emulator::run(args, &mut std::io::stdout()).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, the configuration is
/// missing or invalid, the host stack refuses registration, or output writing
/// fails.
pub async fn run<W>(args: Args, out: &mut W) -> Result<()>
where
    W: io::Write,
{
    run_with_terminal(args, out, &SystemTerminalClient).await
}

/// Runs the parsed command with an injected terminal client.
///
/// ```
/// # async fn run() -> anyhow::Result<()> {
/// struct Piped;
/// impl dock_emulator::TerminalClient for Piped {
///     fn stdout_is_terminal(&self) -> bool { false }
///     fn stderr_is_terminal(&self) -> bool { false }
/// }
///
/// let path = std::env::temp_dir().join("dock-emulator-doctest.yml");
/// std::fs::write(&path, "dock_emulator:\n  local_name: Doc\n")?;
///
/// let args = dock_emulator::Args::new(dock_emulator::Command::Run)
///     .with_config(&path)
///     .with_fake("notify:CBA20003-224D-11E6-9FB8-0002A5D5C51B".parse()?);
/// let mut out = Vec::new();
/// dock_emulator::run_with_terminal(args, &mut out, &Piped).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, the configuration is
/// missing or invalid, the host stack refuses registration, or output writing
/// fails.
#[instrument(
    skip(args, out, terminal_client),
    level = "info",
    fields(config = %args.config_path().display())
)]
pub async fn run_with_terminal<W>(
    args: Args,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
) -> Result<()>
where
    W: io::Write,
{
    let log_level = args
        .log_level()
        .map_or(LevelFilter::INFO, LogLevel::as_level_filter);
    telemetry::initialise_tracing(
        SERVICE_NAME,
        log_level,
        args.log_format(),
        terminal_client.stderr_is_terminal(),
    )?;

    let config_path = args.config_path().to_path_buf();
    let config = load_config(&config_path)?;
    let (command, fake_config) = args.into_command_and_fake_config();
    info!(command = command.name(), fake = fake_config.is_some(), "emulator: starting");
    let use_colour = terminal_client.stdout_is_terminal();

    match command {
        Command::Run => {
            run_emulator(&config, fake_config).await?;
            Ok(())
        }
        Command::Inspect(output_args) => {
            let format = resolve_output_format(&output_args, terminal_client);
            crate::cli::inspect::run(&config, out, format, use_colour)
        }
        Command::Status(output_args) => {
            let format = resolve_output_format(&output_args, terminal_client);
            let backend = host_backend(&config, fake_config);
            crate::cli::status::run(&config_path, &config, &backend, out, format, use_colour)
                .await
        }
        Command::Config(config_args) => match config_args.action() {
            ConfigAction::Get(output_args) => {
                let format = resolve_output_format(output_args, terminal_client);
                crate::cli::config::run_get(&config, out, format, use_colour)
            }
        },
    }
}

/// Maps a failed run to the process exit status.
///
/// ```
/// let error = anyhow::Error::new(dock_emulator::ConfigError::NotFound {
///     path: "/missing.yml".into(),
/// });
/// assert_eq!(dock_emulator::EXIT_CONFIG_NOT_FOUND, dock_emulator::exit_code_for(&error));
/// ```
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<ConfigError>() {
        Some(ConfigError::NotFound { .. }) => EXIT_CONFIG_NOT_FOUND,
        _ => EXIT_FAILURE,
    }
}

/// Picks the scripted fake host when fake settings were given, BlueZ otherwise.
fn host_backend(config: &EmulatorConfig, fake_config: Option<FakeHostConfig>) -> HostBackend {
    match fake_config {
        Some(fake_config) => HostBackend::Fake(fake_config),
        None => HostBackend::Bluez {
            adapter: config.adapter().to_owned(),
        },
    }
}

async fn run_emulator(
    config: &EmulatorConfig,
    fake_config: Option<FakeHostConfig>,
) -> Result<RunSummary> {
    let backend = host_backend(config, fake_config);
    let mut host = host_stack_from_backend(backend).await?;

    let shutdown = CancellationToken::new();
    let listener = spawn_shutdown_listener(shutdown.clone());
    let emulator = Emulator::new(config, &local_host_identifier());
    let result = emulator.run(host.as_mut(), shutdown).await;
    listener.abort();

    Ok(result?)
}

fn resolve_output_format(
    args: &OutputArgs,
    terminal_client: &dyn TerminalClient,
) -> OutputFormat {
    args.format().unwrap_or(if terminal_client.stdout_is_terminal() {
        OutputFormat::Pretty
    } else {
        OutputFormat::Json
    })
}

/// Cancels `shutdown` on the first SIGINT or SIGTERM.
///
/// Later signals are ignored; the token only ever transitions once.
fn spawn_shutdown_listener(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_termination().await {
            Ok(signal_name) => {
                info!(signal = signal_name, "emulator: termination signal received");
                shutdown.cancel();
            }
            Err(error) => warn!(%error, "emulator: signal handlers unavailable"),
        }
    })
}

async fn wait_for_termination() -> io::Result<&'static str> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::error::HostError;

    struct FixedTerminal {
        stdout: bool,
        stderr: bool,
    }

    impl TerminalClient for FixedTerminal {
        fn stdout_is_terminal(&self) -> bool {
            self.stdout
        }

        fn stderr_is_terminal(&self) -> bool {
            self.stderr
        }
    }

    #[rstest]
    #[case(None, true, OutputFormat::Pretty)]
    #[case(None, false, OutputFormat::Json)]
    #[case(Some(OutputFormat::Json), true, OutputFormat::Json)]
    #[case(Some(OutputFormat::Pretty), false, OutputFormat::Pretty)]
    fn output_format_follows_flag_then_terminal(
        #[case] requested: Option<OutputFormat>,
        #[case] is_terminal: bool,
        #[case] expected: OutputFormat,
    ) {
        let args = OutputArgs::new(requested);

        assert_eq!(
            expected,
            resolve_output_format(
                &args,
                &FixedTerminal {
                    stdout: is_terminal,
                    stderr: is_terminal,
                }
            )
        );
    }

    #[rstest]
    #[case(false, true, OutputFormat::Json)]
    #[case(true, false, OutputFormat::Pretty)]
    fn output_format_ignores_stderr_styling(
        #[case] stdout: bool,
        #[case] stderr: bool,
        #[case] expected: OutputFormat,
    ) {
        let args = OutputArgs::new(None);

        assert_eq!(
            expected,
            resolve_output_format(&args, &FixedTerminal { stdout, stderr })
        );
    }

    #[test]
    fn host_backend_uses_configured_adapter_without_fake_settings() {
        let config = EmulatorConfig::builder().adapter("hci3").build();

        assert_matches!(
            host_backend(&config, None),
            HostBackend::Bluez { adapter } if adapter == "hci3"
        );
        assert_matches!(
            host_backend(&config, Some(FakeHostConfig::builder().build())),
            HostBackend::Fake(_)
        );
    }

    #[test]
    fn missing_config_maps_to_exit_code_two() {
        let error = anyhow::Error::new(ConfigError::NotFound {
            path: "/nowhere/config.yml".into(),
        });

        assert_eq!(EXIT_CONFIG_NOT_FOUND, exit_code_for(&error));
    }

    #[rstest]
    #[case(anyhow::Error::new(ConfigError::InvalidLabelLength { actual: 3 }))]
    #[case(anyhow::Error::new(HostError::AdapterNotFound))]
    #[case(anyhow::anyhow!("output closed"))]
    fn other_failures_map_to_exit_code_one(#[case] error: anyhow::Error) {
        assert_eq!(EXIT_FAILURE, exit_code_for(&error));
    }
}
