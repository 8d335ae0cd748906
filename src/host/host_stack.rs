use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::info;

use super::bluez_backend::{self, BluezHost};
use super::fake_backend::{self, FakeHost, FakeHostConfig};
use crate::error::HostError;
use crate::gatt::{Advertisement, Application, ObjectPath, PropertyChanged};

/// Inbound request from the host stack, delivered to the event loop in order.
#[derive(Debug)]
pub enum HostEvent {
    /// A central read a characteristic. `None` is answered for unknown paths.
    Read {
        path: ObjectPath,
        reply: oneshot::Sender<Option<Vec<u8>>>,
    },
    /// A central wrote a characteristic.
    ///
    /// `ack`, when present, is completed once the write has been fully handled.
    Write {
        path: ObjectPath,
        value: Vec<u8>,
        device: Option<String>,
        ack: Option<oneshot::Sender<()>>,
    },
    /// A central subscribed to notifications.
    StartNotify { path: ObjectPath },
    /// A central unsubscribed from notifications.
    StopNotify { path: ObjectPath },
    /// The host revoked the advertisement.
    AdvertisementReleased,
}

impl HostEvent {
    /// Short label used in log records.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::StartNotify { .. } => "start-notify",
            Self::StopNotify { .. } => "stop-notify",
            Self::AdvertisementReleased => "advertisement-released",
        }
    }
}

/// Registration boundary between the core model and the host Bluetooth stack.
#[async_trait]
pub trait HostStack: Send {
    /// Exposes the application's object tree to the host.
    async fn register_application(&mut self, application: &Application) -> Result<(), HostError>;

    /// Starts broadcasting the advertisement.
    async fn register_advertisement(
        &mut self,
        advertisement: &Advertisement,
    ) -> Result<(), HostError>;

    /// Stops broadcasting the advertisement.
    async fn unregister_advertisement(&mut self) -> Result<(), HostError>;

    /// Withdraws the application's object tree.
    async fn unregister_application(&mut self) -> Result<(), HostError>;

    /// Forwards one property-changed signal to subscribed centrals.
    async fn emit_property_changed(&mut self, change: &PropertyChanged) -> Result<(), HostError>;

    /// Waits for the next inbound event. `None` means the host went away.
    ///
    /// Must be cancel-safe: it is polled inside `tokio::select!`.
    async fn next_event(&mut self) -> Option<HostEvent>;
}

/// Runtime host stack selection.
#[derive(Debug)]
pub enum HostBackend {
    /// The system BlueZ daemon, preferring the named adapter.
    Bluez { adapter: String },
    /// The scripted in-process host.
    Fake(FakeHostConfig),
}

/// Builds the host stack for the selected backend.
///
/// # Errors
///
/// Returns an error when the BlueZ session cannot be opened or no adapter exists.
pub async fn host_stack_from_backend(
    backend: HostBackend,
) -> Result<Box<dyn HostStack>, HostError> {
    let host: Box<dyn HostStack> = match backend {
        HostBackend::Bluez { adapter } => Box::new(BluezHost::connect(&adapter).await?),
        HostBackend::Fake(config) => {
            info!("host: using fake host stack");
            Box::new(FakeHost::new(config))
        }
    };

    Ok(host)
}

/// Read-only snapshot of the adapter a backend would serve on.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AdapterStatus {
    /// Adapter actually selected, e.g. `hci0`.
    pub name: String,
    pub address: String,
    pub powered: bool,
    pub discoverable: bool,
    /// Advertisements currently registered with the adapter by any process.
    pub active_advertisements: u8,
    pub supported_advertisements: u8,
}

impl AdapterStatus {
    /// Whether any process currently advertises on this adapter.
    #[must_use]
    pub fn is_advertising(&self) -> bool {
        self.active_advertisements > 0
    }
}

/// Reports the adapter the backend would select, without changing its state.
///
/// Unlike [`host_stack_from_backend`] this never powers the adapter on.
///
/// # Errors
///
/// Returns an error when the BlueZ session cannot be opened or no adapter exists.
pub async fn adapter_status(backend: &HostBackend) -> Result<AdapterStatus, HostError> {
    match backend {
        HostBackend::Bluez { adapter } => bluez_backend::adapter_status(adapter).await,
        HostBackend::Fake(_config) => Ok(fake_backend::adapter_status()),
    }
}
