pub(crate) mod command;
pub(crate) mod config;
pub(crate) mod inspect;
pub(crate) mod status;
pub(crate) mod ui;

pub use self::command::{Args, Command, LogFormat, LogLevel, OutputArgs, OutputFormat};
pub use self::config::{ConfigAction, ConfigArgs};
