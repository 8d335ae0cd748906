/// Formats bytes as uppercase hexadecimal pairs separated by spaces.
pub(crate) fn format_hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "<empty>".to_string();
    }

    bytes
        .iter()
        .map(|value| format!("{value:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats bytes as one contiguous lowercase hex string, as used in log fields.
pub(crate) fn hex_field(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Formats a manufacturer label as a colon-separated MAC when it is 6 bytes long.
pub(crate) fn format_mac_label(bytes: &[u8]) -> String {
    if bytes.len() != 6 {
        return hex_field(bytes);
    }

    bytes
        .iter()
        .map(|value| format!("{value:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn format_hex_handles_empty_payload() {
        assert_eq!("<empty>", format_hex(&[]));
    }

    #[test]
    fn format_hex_formats_uppercase_pairs() {
        assert_eq!("57 81 00 FF", format_hex(&[0x57, 0x81, 0x00, 0xFF]));
    }

    #[test]
    fn hex_field_is_contiguous_lowercase() {
        assert_eq!("5701ab", hex_field(&[0x57, 0x01, 0xAB]));
    }

    #[rstest]
    #[case::six_bytes(&[0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03], "AA:BB:CC:01:02:03")]
    #[case::short(&[0xAA, 0xBB], "aabb")]
    #[case::empty(&[], "")]
    fn format_mac_label_renders_by_length(#[case] label: &[u8], #[case] expected: &str) {
        assert_eq!(expected, format_mac_label(label));
    }
}
