//! Event loop that connects the GATT model to the host stack.

use serde::Serialize;
use strum_macros::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::EmulatorConfig;
use crate::error::HostError;
use crate::gatt::{
    ADVERTISEMENT_PATH, Advertisement, Application, SignalReceiver, build_application,
    signal_channel,
};
use crate::handlers::DockProtocolHandler;
use crate::host::{HostEvent, HostStack};
use crate::utils::format_hex;

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The shutdown token was cancelled, e.g. by SIGINT or SIGTERM.
    #[strum(to_string = "interrupted")]
    Interrupted,
    /// The host event stream ended.
    #[strum(to_string = "host closed")]
    HostClosed,
}

/// Counters reported when the event loop returns.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct RunSummary {
    events_handled: usize,
    notifications_emitted: usize,
    stop_reason: StopReason,
}

impl RunSummary {
    #[must_use]
    pub fn events_handled(&self) -> usize {
        self.events_handled
    }

    #[must_use]
    pub fn notifications_emitted(&self) -> usize {
        self.notifications_emitted
    }

    #[must_use]
    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }
}

/// The emulated dock: its object tree, advertisement and protocol handler.
pub struct Emulator {
    application: Application,
    advertisement: Advertisement,
    dock: DockProtocolHandler,
    signals: SignalReceiver,
}

impl Emulator {
    /// Builds the fixed dock topology and the advertisement from `config`.
    ///
    /// `host_identifier` feeds the manufacturer label fallback.
    #[must_use]
    pub fn new(config: &EmulatorConfig, host_identifier: &[u8]) -> Self {
        let (sender, signals) = signal_channel();
        let (application, endpoints) = build_application(sender);
        let advertisement = Advertisement::new(ADVERTISEMENT_PATH, config, host_identifier);

        Self {
            application,
            advertisement,
            dock: DockProtocolHandler::new(endpoints, config.firmware()),
            signals,
        }
    }

    #[must_use]
    pub fn application(&self) -> &Application {
        &self.application
    }

    #[must_use]
    pub fn advertisement(&self) -> &Advertisement {
        &self.advertisement
    }

    /// Registers with the host, serves events until `shutdown` is cancelled or
    /// the host goes away, then unregisters.
    ///
    /// Unregistration runs exactly once and its failures are logged, never
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error when the application or advertisement is rejected.
    #[instrument(skip_all, level = "info", name = "emulator")]
    pub async fn run(
        mut self,
        host: &mut dyn HostStack,
        shutdown: CancellationToken,
    ) -> Result<RunSummary, HostError> {
        self.register(host).await?;

        let mut events_handled = 0usize;
        let mut notifications_emitted = 0usize;
        let stop_reason = loop {
            let event = tokio::select! {
                biased;
                () = shutdown.cancelled() => break StopReason::Interrupted,
                event = host.next_event() => event,
            };
            let Some(event) = event else {
                break StopReason::HostClosed;
            };

            debug!(event = event.label(), "emulator: host event");
            let ack = self.handle_event(event);
            events_handled += 1;
            notifications_emitted += self.forward_signals(host).await;
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        };

        info!(reason = %stop_reason, "emulator: shutdown requested");
        unregister(host).await;
        info!(events_handled, notifications_emitted, "emulator: stopped");

        Ok(RunSummary {
            events_handled,
            notifications_emitted,
            stop_reason,
        })
    }

    async fn register(&self, host: &mut dyn HostStack) -> Result<(), HostError> {
        if let Err(error) = host.register_application(&self.application).await {
            error!(%error, "gatt: application registration failed");
            return Err(error);
        }
        info!(path = %self.application.path(), "gatt: application registered");

        if let Err(error) = host.register_advertisement(&self.advertisement).await {
            error!(%error, "adv: registration failed");
            if let Err(release_error) = host.unregister_application().await {
                warn!(error = %release_error, "gatt: release after advertisement failure failed");
            }
            return Err(error);
        }
        let uuids: Vec<String> = self
            .advertisement
            .service_uuids()
            .iter()
            .map(ToString::to_string)
            .collect();
        info!(
            local_name = self.advertisement.local_name(),
            company_id = %format!("0x{:04X}", self.advertisement.company_id()),
            label = %self.advertisement.manufacturer_label(),
            label_source = %self.advertisement.label_source(),
            uuids = ?uuids,
            "adv: registered"
        );
        Ok(())
    }

    /// Applies one host event to the model. Returns the write acknowledgement
    /// to complete once resulting signals are forwarded.
    fn handle_event(&mut self, event: HostEvent) -> Option<tokio::sync::oneshot::Sender<()>> {
        match event {
            HostEvent::Read { path, reply } => {
                let value = self
                    .application
                    .characteristic(&path)
                    .map(|characteristic| characteristic.read_value());
                if value.is_none() {
                    warn!(%path, "gatt: read for unknown characteristic");
                }
                let _ = reply.send(value);
                None
            }
            HostEvent::Write {
                path,
                value,
                device,
                ack,
            } => {
                if self.dock.intercepts(&path) {
                    self.dock
                        .on_command_write(&mut self.application, &value, device.as_deref());
                } else if let Some(characteristic) = self.application.characteristic(&path) {
                    characteristic.write_value(&value, device.as_deref());
                } else {
                    warn!(%path, bytes = %format_hex(&value), "gatt: write for unknown characteristic");
                }
                ack
            }
            HostEvent::StartNotify { path } => {
                match self.application.characteristic_mut(&path) {
                    Some(characteristic) => characteristic.start_notify(),
                    None => warn!(%path, "gatt: notify start for unknown characteristic"),
                }
                None
            }
            HostEvent::StopNotify { path } => {
                match self.application.characteristic_mut(&path) {
                    Some(characteristic) => characteristic.stop_notify(),
                    None => warn!(%path, "gatt: notify stop for unknown characteristic"),
                }
                None
            }
            HostEvent::AdvertisementReleased => {
                self.advertisement.released();
                None
            }
        }
    }

    /// Forwards queued property-changed signals in emission order.
    async fn forward_signals(&mut self, host: &mut dyn HostStack) -> usize {
        let mut forwarded = 0;
        while let Ok(change) = self.signals.try_recv() {
            match host.emit_property_changed(&change).await {
                Ok(()) => forwarded += 1,
                Err(error) => warn!(path = %change.path(), %error, "gatt: signal not delivered"),
            }
        }
        forwarded
    }
}

/// Unregisters the advertisement, then the application. Failures are logged.
async fn unregister(host: &mut dyn HostStack) {
    if let Err(error) = host.unregister_advertisement().await {
        warn!(%error, "adv: unregister failed");
    }
    if let Err(error) = host.unregister_application().await {
        warn!(%error, "gatt: unregister failed");
    }
}
