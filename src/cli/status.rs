use std::io;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument};

use crate::cli::OutputFormat;
use crate::config::EmulatorConfig;
use crate::host::{AdapterStatus, HostBackend, adapter_status};

use super::ui::{Painter, StatusView};

/// Host readiness as reported by the `status` command.
#[derive(Debug, Serialize)]
pub(crate) struct StatusReport<'a> {
    pub(crate) config: &'a Path,
    pub(crate) configured_adapter: &'a str,
    pub(crate) adapter: AdapterStatus,
    pub(crate) advertising: bool,
}

impl<'a> StatusReport<'a> {
    pub(crate) fn new(
        config_path: &'a Path,
        config: &'a EmulatorConfig,
        adapter: AdapterStatus,
    ) -> Self {
        Self {
            config: config_path,
            configured_adapter: config.adapter(),
            advertising: adapter.is_advertising(),
            adapter,
        }
    }

    /// Whether the host lacks the configured adapter and another one was picked.
    pub(crate) fn is_fallback(&self) -> bool {
        self.adapter.name != self.configured_adapter
    }
}

/// Executes the `status` command.
#[instrument(skip(config, backend, out), level = "info", fields(?output_format))]
pub(crate) async fn run<W>(
    config_path: &Path,
    config: &EmulatorConfig,
    backend: &HostBackend,
    out: &mut W,
    output_format: OutputFormat,
    use_colour: bool,
) -> Result<()>
where
    W: io::Write,
{
    let adapter = adapter_status(backend).await?;
    let report = StatusReport::new(config_path, config, adapter);
    info!(
        adapter = %report.adapter.name,
        powered = report.adapter.powered,
        advertising = report.advertising,
        "status: adapter queried"
    );

    match output_format {
        OutputFormat::Pretty => {
            let painter = Painter::new(use_colour);
            writeln!(out, "{}", StatusView::new(&report, &painter))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
