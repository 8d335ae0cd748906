use std::fmt::{self, Display, Formatter};

use tabled::builder::Builder;
use tabled::settings::Style;

use super::painter::Painter;

/// Rows of pre-painted cells under a fixed set of columns.
#[derive(Debug)]
pub(crate) struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new<const N: usize>(columns: [&str; N]) -> Self {
        Self {
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// A two-column table listing named settings.
    pub(crate) fn settings() -> Self {
        Self::new(["setting", "value"])
    }

    /// Appends one row. Missing trailing cells render empty.
    pub(crate) fn push_row(&mut self, cells: impl IntoIterator<Item = String>) -> &mut Self {
        let mut row: Vec<String> = cells.into_iter().collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
        self
    }

    /// Appends a `setting`/`value` row with a muted setting name.
    pub(crate) fn push_setting(
        &mut self,
        painter: &Painter,
        name: &str,
        value: String,
    ) -> &mut Self {
        self.push_row([painter.field(name), value])
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::with_capacity(self.rows.len() + 1, self.columns.len());
        builder.push_record(&self.columns);
        for row in &self.rows {
            builder.push_record(row);
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        write!(f, "{table}")
    }
}
