//! Boundary to the host Bluetooth stack.

mod bluez_backend;
mod fake_backend;
mod host_stack;

pub use self::fake_backend::{
    FakeHostConfig, FakeHostRecorder, FakeHostScript, FakeRejection, HostCall, ScriptStep,
};
pub use self::host_stack::{
    AdapterStatus, HostBackend, HostEvent, HostStack, adapter_status, host_stack_from_backend,
};
