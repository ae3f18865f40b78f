use crate::config::Config;
use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const TRACER_NAME: &str = "thumbnailer";

/// Installs JSON logging to stdout and span export; keep the provider alive for the process.
pub fn logger_setup(config: &Config) -> anyhow::Result<TracerProvider> {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    let provider = if config.trace_stdout {
        TracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build()
    } else {
        TracerProvider::builder().build()
    };
    let tracer = provider.tracer(TRACER_NAME);

    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid log level {}", config.log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(tracing_stackdriver::layer())
        .try_init()
        .context("Could not install the tracing subscriber")?;

    Ok(provider)
}
