use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bon::Builder;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::host_stack::{AdapterStatus, HostEvent, HostStack};
use crate::error::{HostError, ScriptError};
use crate::gatt::{
    Advertisement, AdvertisementProperties, Application, GattUuid, ObjectPath, PropertyChanged,
};

const FAKE_CENTRAL: &str = "fake-central";
const FAKE_ADAPTER: &str = "fake0";
const FAKE_ADAPTER_ADDRESS: &str = "00:00:00:00:00:00";

/// One scripted host interaction, addressed by characteristic UUID.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ScriptStep {
    Notify(GattUuid),
    Stop(GattUuid),
    Read(GattUuid),
    Write(GattUuid, Vec<u8>),
    Release,
}

impl FromStr for ScriptStep {
    type Err = ScriptError;

    fn from_str(raw_step: &str) -> Result<Self, Self::Err> {
        let step = raw_step.trim();
        let mut fields = step.splitn(3, ':').map(str::trim);
        let kind = fields.next().unwrap_or_default();
        if kind == "release" {
            return Ok(Self::Release);
        }

        let missing = || ScriptError::MissingField {
            step: step.to_string(),
        };
        let uuid = fields
            .next()
            .filter(|field| !field.is_empty())
            .ok_or_else(missing)?
            .parse::<GattUuid>()
            .map_err(|_| ScriptError::InvalidUuid {
                step: step.to_string(),
            })?;

        match kind {
            "notify" => Ok(Self::Notify(uuid)),
            "stop" => Ok(Self::Stop(uuid)),
            "read" => Ok(Self::Read(uuid)),
            "write" => {
                let payload = fields.next().ok_or_else(missing)?;
                let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
                let value = hex::decode(cleaned).map_err(|_| ScriptError::InvalidHex {
                    step: step.to_string(),
                })?;
                Ok(Self::Write(uuid, value))
            }
            _ => Err(ScriptError::UnknownStep {
                step: step.to_string(),
            }),
        }
    }
}

/// Parsed `;`-separated fake host script.
///
/// ```
/// let script: dock_emulator::FakeHostScript = "notify:CBA20003-224D-11E6-9FB8-0002A5D5C51B;\
///     write:CBA20002-224D-11E6-9FB8-0002A5D5C51B:570100"
///     .parse()?;
/// assert_eq!(2, script.steps().len());
/// # Ok::<(), dock_emulator::ScriptError>(())
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FakeHostScript {
    steps: Vec<ScriptStep>,
}

impl FakeHostScript {
    #[must_use]
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }
}

impl FromStr for FakeHostScript {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let steps = value
            .split(';')
            .filter(|step| !step.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }
}

/// Host call observed by the fake host, in call order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum HostCall {
    RegisterApplication(ObjectPath),
    RegisterAdvertisement(ObjectPath),
    UnregisterAdvertisement,
    UnregisterApplication,
}

/// Which registration the fake host refuses.
#[derive(Debug, Clone, Copy, Eq, PartialEq, clap::ValueEnum)]
pub enum FakeRejection {
    Application,
    Advertisement,
}

#[derive(Debug, Default)]
struct FakeHostLog {
    calls: Vec<HostCall>,
    advertisement: Option<AdvertisementProperties>,
    signals: Vec<PropertyChanged>,
    reads: Vec<(ObjectPath, Option<Vec<u8>>)>,
    acknowledged_writes: usize,
}

/// Shared view of everything the fake host observed.
#[derive(Debug, Clone, Default)]
pub struct FakeHostRecorder {
    log: Arc<Mutex<FakeHostLog>>,
}

impl FakeHostRecorder {
    fn lock(&self) -> MutexGuard<'_, FakeHostLog> {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Registration calls in the order they were made.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().calls.clone()
    }

    /// Properties of the last registered advertisement.
    #[must_use]
    pub fn advertisement(&self) -> Option<AdvertisementProperties> {
        self.lock().advertisement.clone()
    }

    /// Property-changed signals forwarded by the event loop.
    #[must_use]
    pub fn signals(&self) -> Vec<PropertyChanged> {
        self.lock().signals.clone()
    }

    /// Answers received for scripted reads.
    #[must_use]
    pub fn reads(&self) -> Vec<(ObjectPath, Option<Vec<u8>>)> {
        self.lock().reads.clone()
    }

    /// Number of scripted writes the event loop acknowledged.
    #[must_use]
    pub fn acknowledged_writes(&self) -> usize {
        self.lock().acknowledged_writes
    }
}

/// Settings for constructing a fake host.
#[derive(Debug, Builder)]
pub struct FakeHostConfig {
    #[builder(default)]
    script: FakeHostScript,
    #[builder(default)]
    recorder: FakeHostRecorder,
    reject: Option<FakeRejection>,
    /// Keeps the event stream open after the script instead of ending the run.
    #[builder(default)]
    hold_open: bool,
}

/// Adapter state reported by the fake backend: powered and idle.
pub(crate) fn adapter_status() -> AdapterStatus {
    AdapterStatus {
        name: FAKE_ADAPTER.to_owned(),
        address: FAKE_ADAPTER_ADDRESS.to_owned(),
        powered: true,
        discoverable: false,
        active_advertisements: 0,
        supported_advertisements: 1,
    }
}

enum PendingReply {
    Read(ObjectPath, oneshot::Receiver<Option<Vec<u8>>>),
    Write(oneshot::Receiver<()>),
}

/// Scripted in-process host used in tests and without Bluetooth hardware.
pub(crate) struct FakeHost {
    steps: VecDeque<ScriptStep>,
    recorder: FakeHostRecorder,
    reject: Option<FakeRejection>,
    hold_open: bool,
    paths: HashMap<GattUuid, ObjectPath>,
    pending: Vec<PendingReply>,
}

impl FakeHost {
    pub(crate) fn new(config: FakeHostConfig) -> Self {
        Self {
            steps: config.script.steps.into(),
            recorder: config.recorder,
            reject: config.reject,
            hold_open: config.hold_open,
            paths: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Records answers the event loop has completed since the last step.
    fn collect_replies(&mut self) {
        let mut log = self.recorder.lock();
        self.pending.retain_mut(|pending| match pending {
            PendingReply::Read(path, receiver) => match receiver.try_recv() {
                Ok(value) => {
                    log.reads.push((path.clone(), value));
                    false
                }
                Err(oneshot::error::TryRecvError::Empty) => true,
                Err(oneshot::error::TryRecvError::Closed) => {
                    log.reads.push((path.clone(), None));
                    false
                }
            },
            PendingReply::Write(receiver) => match receiver.try_recv() {
                Ok(()) => {
                    log.acknowledged_writes += 1;
                    false
                }
                Err(oneshot::error::TryRecvError::Empty) => true,
                Err(oneshot::error::TryRecvError::Closed) => false,
            },
        });
    }

    fn path_for(&self, uuid: GattUuid) -> Option<ObjectPath> {
        let path = self.paths.get(&uuid).cloned();
        if path.is_none() {
            warn!(%uuid, "host: fake script addresses an unknown characteristic");
        }
        path
    }

    fn event_for(&mut self, step: ScriptStep) -> Option<HostEvent> {
        let event = match step {
            ScriptStep::Notify(uuid) => HostEvent::StartNotify {
                path: self.path_for(uuid)?,
            },
            ScriptStep::Stop(uuid) => HostEvent::StopNotify {
                path: self.path_for(uuid)?,
            },
            ScriptStep::Read(uuid) => {
                let path = self.path_for(uuid)?;
                let (reply, receiver) = oneshot::channel();
                self.pending
                    .push(PendingReply::Read(path.clone(), receiver));
                HostEvent::Read { path, reply }
            }
            ScriptStep::Write(uuid, value) => {
                let path = self.path_for(uuid)?;
                let (ack, receiver) = oneshot::channel();
                self.pending.push(PendingReply::Write(receiver));
                HostEvent::Write {
                    path,
                    value,
                    device: Some(FAKE_CENTRAL.to_string()),
                    ack: Some(ack),
                }
            }
            ScriptStep::Release => HostEvent::AdvertisementReleased,
        };
        Some(event)
    }
}

#[async_trait]
impl HostStack for FakeHost {
    async fn register_application(&mut self, application: &Application) -> Result<(), HostError> {
        if self.reject == Some(FakeRejection::Application) {
            return Err(HostError::ApplicationRejected {
                reason: "rejected by fake host".to_string(),
            });
        }

        for characteristic in application.characteristics() {
            self.paths
                .entry(characteristic.uuid())
                .or_insert_with(|| characteristic.path().clone());
        }
        self.recorder
            .lock()
            .calls
            .push(HostCall::RegisterApplication(application.path().clone()));
        Ok(())
    }

    async fn register_advertisement(
        &mut self,
        advertisement: &Advertisement,
    ) -> Result<(), HostError> {
        if self.reject == Some(FakeRejection::Advertisement) {
            return Err(HostError::AdvertisementRejected {
                reason: "rejected by fake host".to_string(),
            });
        }

        let mut log = self.recorder.lock();
        log.calls
            .push(HostCall::RegisterAdvertisement(advertisement.path().clone()));
        log.advertisement = Some(advertisement.properties());
        Ok(())
    }

    async fn unregister_advertisement(&mut self) -> Result<(), HostError> {
        self.recorder
            .lock()
            .calls
            .push(HostCall::UnregisterAdvertisement);
        Ok(())
    }

    async fn unregister_application(&mut self) -> Result<(), HostError> {
        self.collect_replies();
        self.recorder
            .lock()
            .calls
            .push(HostCall::UnregisterApplication);
        Ok(())
    }

    async fn emit_property_changed(&mut self, change: &PropertyChanged) -> Result<(), HostError> {
        debug!(path = %change.path(), len = change.value().len(), "host: fake signal");
        self.recorder.lock().signals.push(change.clone());
        Ok(())
    }

    async fn next_event(&mut self) -> Option<HostEvent> {
        self.collect_replies();
        while let Some(step) = self.steps.pop_front() {
            if let Some(event) = self.event_for(step) {
                return Some(event);
            }
        }

        if self.hold_open {
            std::future::pending::<()>().await;
        }
        None
    }
}
