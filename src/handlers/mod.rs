mod dock;
mod frame_codec;

pub use self::dock::{DockOutcome, DockProtocolHandler};
pub use self::frame_codec::{
    DockCommand, FirmwareVersion, FrameCodec, GET_INFO_COMMAND, GET_INFO_RESPONSE_LEN,
};
