use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use bluer::adv::{Advertisement as LeAdvertisement, AdvertisementHandle, Feature, Type};
use bluer::gatt::local::{
    Application as GattApplication, ApplicationHandle, Characteristic as GattCharacteristic,
    CharacteristicNotifier, CharacteristicNotify, CharacteristicNotifyMethod, CharacteristicRead,
    CharacteristicReadRequest, CharacteristicWrite, CharacteristicWriteMethod,
    CharacteristicWriteRequest, ReqError, Service as GattService,
};
use bluer::{Adapter, Session};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::host_stack::{AdapterStatus, HostEvent, HostStack};
use crate::error::HostError;
use crate::gatt::{
    Advertisement, AdvertisementType, Application, Characteristic, CharacteristicFlag, ObjectPath,
    PropertyChanged,
};

const NOTIFY_BUFFER: usize = 16;

/// Host stack backed by the system BlueZ daemon.
pub(crate) struct BluezHost {
    _session: Session,
    adapter: Adapter,
    events_tx: mpsc::UnboundedSender<HostEvent>,
    events_rx: mpsc::UnboundedReceiver<HostEvent>,
    notifiers: HashMap<ObjectPath, broadcast::Sender<Vec<u8>>>,
    application: Option<ApplicationHandle>,
    advertisement: Option<AdvertisementHandle>,
}

impl BluezHost {
    /// Opens a BlueZ session and selects an adapter.
    ///
    /// The `preferred` adapter is used when present; otherwise the first
    /// adapter the host exposes.
    #[instrument(level = "debug")]
    pub(crate) async fn connect(preferred: &str) -> Result<Self, HostError> {
        let session = Session::new().await?;
        let adapter = select_adapter(&session, preferred).await?;

        if !adapter.is_powered().await? {
            info!(adapter = adapter.name(), "host: powering on adapter");
            adapter.set_powered(true).await?;
        }
        info!(adapter = adapter.name(), "host: using adapter");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            _session: session,
            adapter,
            events_tx,
            events_rx,
            notifiers: HashMap::new(),
            application: None,
            advertisement: None,
        })
    }
}

/// Maps a characteristic's flags to `bluer` read, write and notify declarations.
///
/// Notify-capable characteristics get a broadcast sender in `notifiers` through
/// which property changes reach open notification sessions.
fn characteristic_declaration(
    events: &mpsc::UnboundedSender<HostEvent>,
    notifiers: &mut HashMap<ObjectPath, broadcast::Sender<Vec<u8>>>,
    characteristic: &Characteristic,
) -> GattCharacteristic {
    let path = characteristic.path();
    let writable = characteristic.supports(CharacteristicFlag::Write)
        || characteristic.supports(CharacteristicFlag::WriteWithoutResponse);

    let read = characteristic
        .supports(CharacteristicFlag::Read)
        .then(|| read_declaration(events.clone(), path.clone()));
    let write = writable.then(|| {
        write_declaration(
            events.clone(),
            path.clone(),
            characteristic.supports(CharacteristicFlag::Write),
            characteristic.supports(CharacteristicFlag::WriteWithoutResponse),
        )
    });
    let notify = characteristic.supports(CharacteristicFlag::Notify).then(|| {
        let (values, _) = broadcast::channel(NOTIFY_BUFFER);
        notifiers.insert(path.clone(), values.clone());
        notify_declaration(events.clone(), path.clone(), values)
    });

    GattCharacteristic {
        uuid: characteristic.uuid().as_uuid(),
        read,
        write,
        notify,
        ..Default::default()
    }
}

/// Reads the selected adapter's state over a fresh session.
#[instrument(level = "debug")]
pub(crate) async fn adapter_status(preferred: &str) -> Result<AdapterStatus, HostError> {
    let session = Session::new().await?;
    let adapter = select_adapter(&session, preferred).await?;

    Ok(AdapterStatus {
        name: adapter.name().to_owned(),
        address: adapter.address().await?.to_string(),
        powered: adapter.is_powered().await?,
        discoverable: adapter.is_discoverable().await?,
        active_advertisements: adapter.active_advertising_instances().await?,
        supported_advertisements: adapter.supported_advertising_instances().await?,
    })
}

async fn select_adapter(session: &Session, preferred: &str) -> Result<Adapter, HostError> {
    let names = session.adapter_names().await?;
    let name = names
        .iter()
        .find(|name| name.as_str() == preferred)
        .or_else(|| names.first())
        .ok_or(HostError::AdapterNotFound)?;

    if name != preferred {
        warn!(
            preferred,
            selected = %name,
            "host: preferred adapter not found, falling back"
        );
    }
    Ok(session.adapter(name)?)
}

fn read_declaration(
    events: mpsc::UnboundedSender<HostEvent>,
    path: ObjectPath,
) -> CharacteristicRead {
    CharacteristicRead {
        read: true,
        fun: Box::new(move |_request: CharacteristicReadRequest| {
            let events = events.clone();
            let path = path.clone();
            Box::pin(async move {
                let (reply, response) = oneshot::channel();
                events
                    .send(HostEvent::Read { path, reply })
                    .map_err(|_| ReqError::Failed)?;
                response
                    .await
                    .ok()
                    .flatten()
                    .ok_or(ReqError::Failed)
            })
        }),
        ..Default::default()
    }
}

fn write_declaration(
    events: mpsc::UnboundedSender<HostEvent>,
    path: ObjectPath,
    write: bool,
    write_without_response: bool,
) -> CharacteristicWrite {
    CharacteristicWrite {
        write,
        write_without_response,
        method: CharacteristicWriteMethod::Fun(Box::new(
            move |value: Vec<u8>, request: CharacteristicWriteRequest| {
                let events = events.clone();
                let path = path.clone();
                Box::pin(async move {
                    let (ack, done) = oneshot::channel();
                    events
                        .send(HostEvent::Write {
                            path,
                            value,
                            device: Some(request.device_address.to_string()),
                            ack: Some(ack),
                        })
                        .map_err(|_| ReqError::Failed)?;
                    done.await.map_err(|_| ReqError::Failed)
                })
            },
        )),
        ..Default::default()
    }
}

fn notify_declaration(
    events: mpsc::UnboundedSender<HostEvent>,
    path: ObjectPath,
    values: broadcast::Sender<Vec<u8>>,
) -> CharacteristicNotify {
    CharacteristicNotify {
        notify: true,
        method: CharacteristicNotifyMethod::Fun(Box::new(move |notifier| {
            let events = events.clone();
            let path = path.clone();
            let receiver = values.subscribe();
            Box::pin(forward_notifications(events, path, receiver, notifier))
        })),
        ..Default::default()
    }
}

/// Runs one notification session: marks the characteristic subscribed, then
/// pushes each signalled value until the central unsubscribes.
async fn forward_notifications(
    events: mpsc::UnboundedSender<HostEvent>,
    path: ObjectPath,
    mut values: broadcast::Receiver<Vec<u8>>,
    mut notifier: CharacteristicNotifier,
) {
    if events
        .send(HostEvent::StartNotify { path: path.clone() })
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            () = notifier.stopped() => break,
            value = values.recv() => match value {
                Ok(value) => {
                    if let Err(error) = notifier.notify(value).await {
                        debug!(%path, ?error, "host: notification delivery failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%path, skipped, "host: notification session lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    let _ = events.send(HostEvent::StopNotify { path });
}

fn advertisement_declaration(advertisement: &Advertisement) -> LeAdvertisement {
    let advertisement_type = match advertisement.advertisement_type() {
        AdvertisementType::Peripheral => Type::Peripheral,
    };
    let service_data = advertisement
        .service_data()
        .map(|data| BTreeMap::from([(data.uuid().as_uuid(), data.payload().to_vec())]))
        .unwrap_or_default();
    let system_includes = if advertisement.include_tx_power() {
        BTreeSet::from([Feature::TxPower])
    } else {
        BTreeSet::new()
    };

    LeAdvertisement {
        advertisement_type,
        local_name: Some(advertisement.local_name().to_string()),
        service_uuids: advertisement
            .service_uuids()
            .iter()
            .map(|uuid| uuid.as_uuid())
            .collect(),
        manufacturer_data: advertisement.manufacturer_data(),
        service_data,
        system_includes,
        ..Default::default()
    }
}

#[async_trait]
impl HostStack for BluezHost {
    #[instrument(skip(self, application), level = "debug", fields(path = %application.path()))]
    async fn register_application(&mut self, application: &Application) -> Result<(), HostError> {
        let mut services = Vec::with_capacity(application.services().len());
        for service in application.services() {
            let characteristics = service
                .characteristics()
                .iter()
                .map(|characteristic| {
                    characteristic_declaration(&self.events_tx, &mut self.notifiers, characteristic)
                })
                .collect();
            services.push(GattService {
                uuid: service.uuid().as_uuid(),
                primary: service.is_primary(),
                characteristics,
                ..Default::default()
            });
        }

        let handle = self
            .adapter
            .serve_gatt_application(GattApplication {
                services,
                ..Default::default()
            })
            .await
            .map_err(|error| HostError::ApplicationRejected {
                reason: error.to_string(),
            })?;
        self.application = Some(handle);
        Ok(())
    }

    #[instrument(skip(self, advertisement), level = "debug", fields(path = %advertisement.path()))]
    async fn register_advertisement(
        &mut self,
        advertisement: &Advertisement,
    ) -> Result<(), HostError> {
        match self
            .adapter
            .advertise(advertisement_declaration(advertisement))
            .await
        {
            Ok(handle) => {
                self.advertisement = Some(handle);
                Ok(())
            }
            Err(error) => Err(HostError::AdvertisementRejected {
                reason: error.to_string(),
            }),
        }
    }

    async fn unregister_advertisement(&mut self) -> Result<(), HostError> {
        match self.advertisement.take() {
            Some(handle) => {
                drop(handle);
                Ok(())
            }
            None => Err(HostError::NotRegistered {
                path: "advertisement".to_string(),
            }),
        }
    }

    async fn unregister_application(&mut self) -> Result<(), HostError> {
        self.notifiers.clear();
        match self.application.take() {
            Some(handle) => {
                drop(handle);
                Ok(())
            }
            None => Err(HostError::NotRegistered {
                path: "application".to_string(),
            }),
        }
    }

    async fn emit_property_changed(&mut self, change: &PropertyChanged) -> Result<(), HostError> {
        let Some(values) = self.notifiers.get(change.path()) else {
            debug!(path = %change.path(), "host: no notify declaration for signal");
            return Ok(());
        };
        if values.send(change.value().to_vec()).is_err() {
            debug!(path = %change.path(), "host: no open notification session");
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<HostEvent> {
        self.events_rx.recv().await
    }
}
