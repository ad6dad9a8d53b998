use opentelemetry::global;
use tracing::Subscriber;
use tracing_subscriber::{prelude::*, registry::LookupSpan};
use tracing_subscriber::{EnvFilter, Layer};

pub use opentelemetry::{
    metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter},
    KeyValue,
};

pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

pub fn meter(name: &'static str) -> Meter {
    global::meter(name)
}

/// Installs the tracing subscriber: env-filtered stdout logging, JSON
/// formatted when `RUST_LOG_FORMAT=json`.
///
/// Metric export is wired by the hosting binary; libraries only touch the
/// global meter.
pub fn init_observability() {
    tracing_subscriber::registry().with(vec![stdout()]).init();
}

fn stdout<S>() -> BoxedLayer<S>
where
    S: Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let log_env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("INFO"));

    let json_fmt = std::env::var("RUST_LOG_FORMAT")
        .map(|val| val == "json")
        .unwrap_or(false);

    if json_fmt {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .json()
            .with_filter(log_env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_filter(log_env_filter)
            .boxed()
    }
}
