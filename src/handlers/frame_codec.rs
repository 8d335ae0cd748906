use std::fmt;

use tracing::instrument;

/// Dock opcode shared by every command and response frame.
const DOCK_OPCODE: u8 = 0x57;
const GET_INFO_SUBCOMMAND: u8 = 0x01;
const GET_INFO_RESPONSE_SUBCOMMAND: u8 = 0x81;

/// The only command frame the dock answers.
pub const GET_INFO_COMMAND: [u8; 3] = [DOCK_OPCODE, GET_INFO_SUBCOMMAND, 0x00];

/// Length of the `GetInfo` response frame.
pub const GET_INFO_RESPONSE_LEN: usize = 6;

/// Typed dock commands decoded from writes to the command characteristic.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DockCommand {
    /// Firmware/info request, `57 01 00`.
    GetInfo,
    /// Any other write, preserved as raw bytes.
    Unrecognised(Vec<u8>),
}

impl DockCommand {
    /// Short label used in log records.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::GetInfo => "GetInfo",
            Self::Unrecognised(_) => "unrecognised",
        }
    }
}

/// Firmware version reported in `GetInfo` responses.
///
/// Components are kept at configuration width and truncated to a byte only
/// when encoded.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct FirmwareVersion {
    major: u32,
    minor: u32,
}

impl FirmwareVersion {
    /// Creates a firmware version from configured components.
    ///
    /// ```
    /// let version = dock_emulator::FirmwareVersion::new(1, 2);
    /// assert_eq!([1, 2], version.wire_bytes());
    /// ```
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    #[must_use]
    pub const fn major(self) -> u32 {
        self.major
    }

    #[must_use]
    pub const fn minor(self) -> u32 {
        self.minor
    }

    /// Returns `[major, minor]` masked to their low 8 bits.
    ///
    /// ```
    /// let version = dock_emulator::FirmwareVersion::new(0x1_02, 0xFF);
    /// assert_eq!([0x02, 0xFF], version.wire_bytes());
    /// ```
    #[must_use]
    pub const fn wire_bytes(self) -> [u8; 2] {
        [(self.major & 0xFF) as u8, (self.minor & 0xFF) as u8]
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor] = self.wire_bytes();
        write!(f, "{major}.{minor}")
    }
}

/// Encoder/decoder for dock command and response frames.
pub struct FrameCodec;

impl FrameCodec {
    /// Decodes one write to the command characteristic.
    ///
    /// Only an exact `57 01 00` match is recognised; anything else, including
    /// frames with that prefix and trailing bytes, is `Unrecognised`.
    ///
    /// ```
    /// use dock_emulator::{DockCommand, FrameCodec};
    ///
    /// assert_eq!(DockCommand::GetInfo, FrameCodec::decode_command(&[0x57, 0x01, 0x00]));
    /// assert_eq!(
    ///     DockCommand::Unrecognised(vec![0x57, 0x01]),
    ///     FrameCodec::decode_command(&[0x57, 0x01]),
    /// );
    /// ```
    #[must_use]
    #[instrument(skip(frame), level = "trace", fields(frame_len = frame.len()))]
    pub fn decode_command(frame: &[u8]) -> DockCommand {
        if frame == GET_INFO_COMMAND {
            return DockCommand::GetInfo;
        }

        DockCommand::Unrecognised(frame.to_vec())
    }

    /// Encodes the 6-byte `GetInfo` response frame.
    ///
    /// ```
    /// use dock_emulator::{FirmwareVersion, FrameCodec};
    ///
    /// let frame = FrameCodec::encode_get_info_response(FirmwareVersion::new(1, 2));
    /// assert_eq!([0x57, 0x81, 0x00, 0x01, 0x02, 0x00], frame);
    /// ```
    #[must_use]
    pub fn encode_get_info_response(firmware: FirmwareVersion) -> [u8; GET_INFO_RESPONSE_LEN] {
        let [major, minor] = firmware.wire_bytes();
        [
            DOCK_OPCODE,
            GET_INFO_RESPONSE_SUBCOMMAND,
            0x00,
            major,
            minor,
            0x00,
        ]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn decode_recognises_get_info() {
        assert_eq!(
            DockCommand::GetInfo,
            FrameCodec::decode_command(&[0x57, 0x01, 0x00])
        );
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::truncated(&[0x57, 0x01])]
    #[case::trailing_byte(&[0x57, 0x01, 0x00, 0x00])]
    #[case::wrong_subcommand(&[0x57, 0x02, 0x00])]
    #[case::response_frame(&[0x57, 0x81, 0x00, 0x01, 0x02, 0x00])]
    #[case::arbitrary(&[0x01, 0x02, 0x03])]
    fn decode_rejects_everything_else(#[case] frame: &[u8]) {
        assert_eq!(
            DockCommand::Unrecognised(frame.to_vec()),
            FrameCodec::decode_command(frame)
        );
    }

    #[test]
    fn encode_matches_layout_for_every_byte_value() {
        for major in 0..=255u32 {
            for minor in [0u32, 1, 127, 255] {
                let frame = FrameCodec::encode_get_info_response(FirmwareVersion::new(major, minor));
                assert_eq!(
                    [0x57, 0x81, 0x00, major as u8, minor as u8, 0x00],
                    frame
                );
            }
        }
    }

    #[rstest]
    #[case(256, 0, [0x00, 0x00])]
    #[case(257, 513, [0x01, 0x01])]
    #[case(u32::MAX, 0x1234, [0xFF, 0x34])]
    fn encode_masks_components_to_low_byte(
        #[case] major: u32,
        #[case] minor: u32,
        #[case] expected: [u8; 2],
    ) {
        let frame = FrameCodec::encode_get_info_response(FirmwareVersion::new(major, minor));
        assert_eq!(expected, [frame[3], frame[4]]);
    }

    #[test]
    fn firmware_version_displays_wire_values() {
        assert_eq!("1.2", FirmwareVersion::new(1, 2).to_string());
        assert_eq!("0.255", FirmwareVersion::new(256, 255).to_string());
    }
}
