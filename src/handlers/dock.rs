use tracing::{info, instrument, warn};

use crate::gatt::{Application, DockEndpoints, NotifyOutcome, ObjectPath};
use crate::utils::hex_field;

use super::{DockCommand, FirmwareVersion, FrameCodec};

/// What a command write led to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DockOutcome {
    /// A response was stored and signalled to the subscriber.
    Responded,
    /// A response was stored but nobody is subscribed to receive it.
    ResponseSkipped,
    /// The frame was not recognised; nothing changed.
    Ignored,
}

/// State machine answering writes to the dock command characteristic.
#[derive(Debug, Clone)]
pub struct DockProtocolHandler {
    endpoints: DockEndpoints,
    firmware: FirmwareVersion,
}

impl DockProtocolHandler {
    #[must_use]
    pub fn new(endpoints: DockEndpoints, firmware: FirmwareVersion) -> Self {
        Self {
            endpoints,
            firmware,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &DockEndpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    /// Returns whether writes to `path` are intercepted by the dock protocol.
    #[must_use]
    pub fn intercepts(&self, path: &ObjectPath) -> bool {
        *path == self.endpoints.command
    }

    /// Handles one write to the command characteristic.
    ///
    /// Never fails: unrecognised frames are logged and dropped, and a missing
    /// subscriber only suppresses the signal while the response value is
    /// still stored.
    #[instrument(skip(self, application, data), level = "debug", fields(len = data.len()))]
    pub fn on_command_write(
        &self,
        application: &mut Application,
        data: &[u8],
        writer: Option<&str>,
    ) -> DockOutcome {
        let command = FrameCodec::decode_command(data);
        info!(
            device = writer.unwrap_or("?"),
            len = data.len(),
            hex = %hex_field(data),
            "dock: write ({})",
            command.label()
        );

        match command {
            DockCommand::GetInfo => self.respond_get_info(application),
            DockCommand::Unrecognised(_) => DockOutcome::Ignored,
        }
    }

    fn respond_get_info(&self, application: &mut Application) -> DockOutcome {
        let response = FrameCodec::encode_get_info_response(self.firmware);

        let Some(characteristic) = application.characteristic_mut(&self.endpoints.response) else {
            warn!(path = %self.endpoints.response, "dock: response characteristic missing");
            return DockOutcome::Ignored;
        };

        match characteristic.set_value_and_notify(response.to_vec()) {
            NotifyOutcome::Signalled => {
                info!(
                    hex = %hex_field(&response),
                    firmware = %self.firmware,
                    "dock: response notified"
                );
                DockOutcome::Responded
            }
            NotifyOutcome::SkippedNoSubscriber => {
                info!("dock: response skipped, no subscriber");
                DockOutcome::ResponseSkipped
            }
        }
    }
}
