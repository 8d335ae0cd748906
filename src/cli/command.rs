use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use super::config::{ConfigAction, ConfigArgs};
use crate::config::DEFAULT_CONFIG_PATH;
use crate::host::{FakeHostConfig, FakeHostScript, FakeRejection};

/// Command-line options for the dock emulator.
#[derive(Debug, Parser)]
#[command(
    name = "dock-emulator",
    about = "Emulate a BLE dock peripheral on a BlueZ host."
)]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    /// Log record format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
    /// Uses the scripted fake host instead of BlueZ.
    #[arg(long, global = true)]
    fake: bool,
    /// Fake host steps: `notify:<uuid>`, `stop:<uuid>`, `read:<uuid>`,
    /// `write:<uuid>:<hex>` or `release`, separated by `;`.
    #[arg(long, global = true, requires = "fake")]
    fake_script: Option<FakeHostScript>,
    /// Makes the fake host refuse one registration.
    #[arg(long, global = true, value_enum, requires = "fake")]
    fake_reject: Option<FakeRejection>,
    #[command(subcommand)]
    command: Option<Command>,
}

impl Args {
    /// Creates argument values directly without CLI parsing.
    ///
    /// ```
    /// use dock_emulator::{Args, Command};
    ///
    /// let args = Args::new(Command::Run).with_config("/tmp/dock.yml");
    /// assert_eq!(std::path::Path::new("/tmp/dock.yml"), args.config_path());
    /// ```
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            log_level: None,
            log_format: LogFormat::Pretty,
            fake: false,
            fake_script: None,
            fake_reject: None,
            command: Some(command),
        }
    }

    /// Overrides the configuration file path.
    #[must_use]
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = path.into();
        self
    }

    /// Enables fake host mode with a pre-parsed script.
    #[must_use]
    pub fn with_fake(mut self, script: FakeHostScript) -> Self {
        self.fake = true;
        self.fake_script = Some(script);
        self
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config
    }

    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Splits parsed arguments into the command and optional fake-host settings.
    ///
    /// `run` is selected when no subcommand is given.
    #[must_use]
    pub fn into_command_and_fake_config(self) -> (Command, Option<FakeHostConfig>) {
        let Args {
            fake,
            fake_script,
            fake_reject,
            command,
            ..
        } = self;

        let fake_config = fake.then(|| {
            FakeHostConfig::builder()
                .script(fake_script.unwrap_or_default())
                .maybe_reject(fake_reject)
                .build()
        });

        (command.unwrap_or(Command::Run), fake_config)
    }
}

/// Supported CLI commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register the dock with the host stack and serve it until interrupted.
    Run,
    /// Print the GATT tree and advertisement built from the configuration.
    Inspect(OutputArgs),
    /// Report the Bluetooth adapter the dock would be served on.
    Status(OutputArgs),
    /// Show the validated configuration.
    Config(ConfigArgs),
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Inspect(_args) => "inspect",
            Self::Status(_args) => "status",
            Self::Config(args) => match args.action() {
                ConfigAction::Get(_args) => "config get",
            },
        }
    }
}

/// Output options shared by the reporting commands.
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct OutputArgs {
    /// Output format; defaults to pretty on a terminal and JSON otherwise.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl OutputArgs {
    #[must_use]
    pub fn new(format: Option<OutputFormat>) -> Self {
        Self { format }
    }

    #[must_use]
    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }
}

/// Log verbosity accepted on the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

/// Log record format.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Command output format on stdout.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn run_is_the_default_command() {
        let args = Args::try_parse_from(["dock-emulator"]).expect("no arguments should parse");

        assert_eq!(Path::new(DEFAULT_CONFIG_PATH), args.config_path());
        let (command, fake_config) = args.into_command_and_fake_config();
        assert_matches!(command, Command::Run);
        assert_matches!(fake_config, None);
    }

    #[test]
    fn fake_script_requires_fake_mode() {
        let result = Args::try_parse_from(["dock-emulator", "--fake-script", "notify:B003"]);

        let error = result.expect_err("--fake-script should require --fake");
        assert_eq!(ErrorKind::MissingRequiredArgument, error.kind());
    }

    #[test]
    fn malformed_fake_script_is_rejected() {
        let result =
            Args::try_parse_from(["dock-emulator", "--fake", "--fake-script", "poke:B003"]);

        let error = result.expect_err("unknown step should fail parsing");
        assert_eq!(ErrorKind::ValueValidation, error.kind());
    }

    #[test]
    fn fake_mode_builds_fake_settings() {
        let args = Args::try_parse_from([
            "dock-emulator",
            "--fake",
            "--fake-script",
            "notify:B003;read:B001",
            "run",
        ])
        .expect("valid fake arguments should parse");

        let (command, fake_config) = args.into_command_and_fake_config();
        assert_matches!(command, Command::Run);
        assert_matches!(fake_config, Some(_));
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let args = Args::try_parse_from([
            "dock-emulator",
            "inspect",
            "--format",
            "json",
            "--config",
            "/tmp/dock.yml",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])
        .expect("inspect arguments should parse");

        assert_eq!(Path::new("/tmp/dock.yml"), args.config_path());
        assert_eq!(Some(LogLevel::Debug), args.log_level());
        assert_eq!(LogFormat::Json, args.log_format());
        let (command, _fake_config) = args.into_command_and_fake_config();
        assert_matches!(
            command,
            Command::Inspect(inspect) if inspect.format() == Some(OutputFormat::Json)
        );
    }

    #[test]
    fn status_accepts_an_output_format() {
        let args = Args::try_parse_from(["dock-emulator", "--fake", "status", "--format", "json"])
            .expect("status arguments should parse");

        let (command, fake_config) = args.into_command_and_fake_config();
        assert_eq!("status", command.name());
        assert_matches!(
            command,
            Command::Status(output) if output.format() == Some(OutputFormat::Json)
        );
        assert_matches!(fake_config, Some(_));
    }

    #[test]
    fn config_get_is_a_nested_subcommand() {
        let args = Args::try_parse_from(["dock-emulator", "config", "get", "--format", "pretty"])
            .expect("config get should parse");

        let (command, _fake_config) = args.into_command_and_fake_config();
        assert_eq!("config get", command.name());
        assert_matches!(
            command,
            Command::Config(config) if matches!(
                config.action(),
                ConfigAction::Get(output) if output.format() == Some(OutputFormat::Pretty)
            )
        );
    }

    #[test]
    fn config_requires_an_action() {
        let result = Args::try_parse_from(["dock-emulator", "config"]);

        let error = result.expect_err("bare config should fail parsing");
        assert_eq!(
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand,
            error.kind()
        );
    }

    #[test]
    fn config_set_is_not_offered() {
        let result = Args::try_parse_from(["dock-emulator", "config", "set", "fw_major", "2"]);

        let error = result.expect_err("config is read-only");
        assert_eq!(ErrorKind::InvalidSubcommand, error.kind());
    }

    #[rstest]
    #[case(LogLevel::Error, LevelFilter::ERROR)]
    #[case(LogLevel::Info, LevelFilter::INFO)]
    #[case(LogLevel::Trace, LevelFilter::TRACE)]
    fn log_level_maps_to_filter(#[case] level: LogLevel, #[case] expected: LevelFilter) {
        assert_eq!(expected, level.as_level_filter());
    }
}
