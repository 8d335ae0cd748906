use std::fmt::Display;

use owo_colors::{OwoColorize, Style as OwoStyle};

use crate::gatt::{GattUuid, LabelSource};
use crate::utils::format_hex;

/// Visual roles used by the dock views.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Tone {
    Heading,
    Field,
    Value,
    Identifier,
    Bytes,
    On,
    Off,
    Caution,
    Absent,
}

impl Tone {
    fn style(self) -> OwoStyle {
        match self {
            Self::Heading => OwoStyle::new().bold().cyan(),
            Self::Field => OwoStyle::new().dimmed(),
            Self::Value => OwoStyle::new().bold(),
            Self::Identifier => OwoStyle::new().blue(),
            Self::Bytes => OwoStyle::new().magenta(),
            Self::On => OwoStyle::new().bold().green(),
            Self::Off | Self::Absent => OwoStyle::new().dimmed(),
            Self::Caution => OwoStyle::new().bold().yellow(),
        }
    }
}

/// Renders dock values for the terminal, with or without ANSI styling.
#[derive(Debug)]
pub(crate) struct Painter {
    use_colour: bool,
}

impl Painter {
    pub(crate) fn new(use_colour: bool) -> Self {
        Self { use_colour }
    }

    pub(crate) fn heading(&self, text: &str) -> String {
        self.paint(text, Tone::Heading)
    }

    /// Name column of a settings table.
    pub(crate) fn field(&self, name: &str) -> String {
        self.paint(name, Tone::Field)
    }

    pub(crate) fn value<T: AsRef<str>>(&self, text: T) -> String {
        self.paint(text.as_ref(), Tone::Value)
    }

    /// Placeholder for a value that is not set, e.g. `-` or `<disabled>`.
    pub(crate) fn absent(&self, placeholder: &str) -> String {
        self.paint(placeholder, Tone::Absent)
    }

    pub(crate) fn uuid(&self, uuid: GattUuid) -> String {
        self.paint(&uuid.to_string(), Tone::Identifier)
    }

    pub(crate) fn bytes(&self, bytes: &[u8]) -> String {
        self.paint(&format_hex(bytes), Tone::Bytes)
    }

    /// Picks `on` or `off` for a boolean setting and highlights the enabled side.
    pub(crate) fn switch(&self, enabled: bool, on: &str, off: &str) -> String {
        if enabled {
            self.paint(on, Tone::On)
        } else {
            self.paint(off, Tone::Off)
        }
    }

    /// Marks a host-derived manufacturer label, which depends on the machine.
    pub(crate) fn label_source(&self, source: LabelSource) -> String {
        match source {
            LabelSource::Configured => self.paint("(configured)", Tone::Field),
            LabelSource::DerivedFromHost => self.paint("(host)", Tone::Caution),
        }
    }

    /// Warns when the selected adapter differs from the configured one.
    pub(crate) fn adapter(&self, selected: &str, configured: &str) -> String {
        if selected == configured {
            self.paint(selected, Tone::Value)
        } else {
            format!(
                "{} {}",
                self.paint(selected, Tone::Caution),
                self.paint(&format!("(configured {configured})"), Tone::Field)
            )
        }
    }

    /// Joins items with commas; `empty` stands in when there are none.
    pub(crate) fn list<I>(&self, items: I, empty: &str) -> String
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let joined = items
            .into_iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(",");
        if joined.is_empty() {
            self.absent(empty)
        } else {
            self.value(joined)
        }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if self.use_colour {
            format!("{}", text.style(tone.style()))
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::on(true, "included")]
    #[case::off(false, "omitted")]
    fn switch_picks_the_matching_word(#[case] enabled: bool, #[case] expected: &str) {
        let painter = Painter::new(false);
        assert_eq!(expected, painter.switch(enabled, "included", "omitted"));
    }

    #[rstest]
    #[case::configured(LabelSource::Configured, "(configured)")]
    #[case::host(LabelSource::DerivedFromHost, "(host)")]
    fn label_source_names_the_origin(#[case] source: LabelSource, #[case] expected: &str) {
        assert_eq!(expected, Painter::new(false).label_source(source));
    }

    #[test]
    fn adapter_mentions_configured_name_only_on_fallback() {
        let painter = Painter::new(false);

        assert_eq!("hci0", painter.adapter("hci0", "hci0"));
        assert_eq!("hci1 (configured hci0)", painter.adapter("hci1", "hci0"));
    }

    #[test]
    fn list_joins_items_or_shows_placeholder() {
        let painter = Painter::new(false);

        assert_eq!(
            "FD3D,B000",
            painter.list([GattUuid::short(0xFD3D), GattUuid::short(0xB000)], "<none>")
        );
        assert_eq!("<none>", painter.list(Vec::<GattUuid>::new(), "<none>"));
    }

    #[test]
    fn bytes_and_uuids_use_display_forms() {
        let painter = Painter::new(false);

        assert_eq!("57 01 00", painter.bytes(&[0x57, 0x01, 0x00]));
        assert_eq!("FD3D", painter.uuid(GattUuid::short(0xFD3D)));
    }

    #[test]
    fn host_label_is_highlighted_differently_from_configured() {
        let painter = Painter::new(true);

        let host = painter.label_source(LabelSource::DerivedFromHost);
        let configured = painter.label_source(LabelSource::Configured);
        assert!(host.contains("(host)") && host.contains('\u{1b}'));
        assert_ne!(
            host.replace("(host)", ""),
            configured.replace("(configured)", "")
        );
    }

    #[test]
    fn plain_painter_emits_no_escape_codes() {
        let painter = Painter::new(false);
        let rendered = [
            painter.heading("Advertisement:"),
            painter.field("local name"),
            painter.absent("-"),
            painter.switch(true, "yes", "no"),
            painter.adapter("hci1", "hci0"),
        ]
        .concat();

        assert!(!rendered.contains('\u{1b}'));
    }
}
