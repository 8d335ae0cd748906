mod app;
mod cli;
mod config;
mod emulator;
mod error;
mod gatt;
mod handlers;
mod host;
mod protocol;
mod telemetry;
mod terminal;
mod utils;

pub use app::{
    EXIT_CONFIG_NOT_FOUND, EXIT_FAILURE, EXIT_SUCCESS, exit_code_for, run, run_with_terminal,
};
pub use cli::{
    Args, Command, ConfigAction, ConfigArgs, LogFormat, LogLevel, OutputArgs, OutputFormat,
};
pub use config::{DEFAULT_CONFIG_PATH, EmulatorConfig, ServiceData, load_config, parse_config};
pub use emulator::{Emulator, RunSummary, StopReason};
pub use error::{ConfigError, HostError, ScriptError};
pub use gatt::{
    ADVERTISEMENT_PATH, APPLICATION_PATH, Advertisement, AdvertisementProperties,
    AdvertisementType, Application, Characteristic, CharacteristicFlag, CharacteristicProperties,
    DockEndpoints, GattUuid, GattUuidError, InterfaceProperties, LabelSource, MAC_LABEL_LEN,
    MacLabel, ManagedObjects, NotifyOutcome, ObjectPath, PropertyChanged, Service,
    ServiceProperties, build_application, local_host_identifier, signal_channel,
};
pub use handlers::{
    DockCommand, DockOutcome, DockProtocolHandler, FirmwareVersion, FrameCodec,
    GET_INFO_COMMAND, GET_INFO_RESPONSE_LEN,
};
pub use host::{
    AdapterStatus, FakeHostConfig, FakeHostRecorder, FakeHostScript, FakeRejection, HostBackend,
    HostCall, HostEvent, HostStack, ScriptStep, adapter_status, host_stack_from_backend,
};
pub use protocol::EndpointId;
pub use terminal::{SystemTerminalClient, TerminalClient};
