mod config_view;
mod inspect_view;
mod painter;
mod status_view;
mod table;

pub(crate) use self::config_view::ConfigView;
pub(crate) use self::inspect_view::InspectView;
pub(crate) use self::painter::Painter;
pub(crate) use self::status_view::StatusView;
