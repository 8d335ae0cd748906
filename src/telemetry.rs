use std::sync::OnceLock;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::LogFormat;
use crate::error::TelemetryError;

static TRACING_INITIALISED: OnceLock<Result<(), TelemetryError>> = OnceLock::new();

/// Initialises structured logging and OpenTelemetry tracing support.
///
/// Records are single-line and timestamp-free on stderr. `RUST_LOG` wins over
/// `default_level`. ANSI styling is only used when `use_ansi` is set, which
/// callers derive from whether stderr is a terminal. Only the first call
/// installs anything.
pub(crate) fn initialise_tracing(
    service_name: &str,
    default_level: LevelFilter,
    format: LogFormat,
    use_ansi: bool,
) -> Result<(), &'static TelemetryError> {
    TRACING_INITIALISED
        .get_or_init(|| initialise_tracing_once(service_name, default_level, format, use_ansi))
        .as_ref()
        .copied()
}

fn initialise_tracing_once(
    service_name: &str,
    default_level: LevelFilter,
    format: LogFormat,
    use_ansi: bool,
) -> Result<(), TelemetryError> {
    let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder().build();
    let tracer = tracer_provider.tracer(service_name.to_owned());
    global::set_tracer_provider(tracer_provider);

    let log_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .compact()
                        .without_time()
                        .with_target(false)
                        .with_ansi(use_ansi)
                        .with_writer(std::io::stderr)
                        .with_filter(log_filter),
                )
                .with(OpenTelemetryLayer::new(tracer))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .without_time()
                        .with_target(false)
                        .with_ansi(use_ansi)
                        .with_writer(std::io::stderr)
                        .with_filter(log_filter),
                )
                .with(OpenTelemetryLayer::new(tracer))
                .try_init()?;
        }
    }

    Ok(())
}
