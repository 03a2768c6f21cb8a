use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION},
};
use std::env;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Telemetry protocol to use for OTLP export
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelemetryProtocol {
    HTTP,
    GRPC,
}

impl TelemetryProtocol {
    /// OTLP export is on as soon as any of the standard variables is set.
    fn from_env() -> Option<Self> {
        let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
        if !is_enabled {
            return None;
        }
        let protocol = match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
            Ok("grpc") => TelemetryProtocol::GRPC,
            _ => TelemetryProtocol::HTTP,
        };
        Some(protocol)
    }
}

fn resource() -> Resource {
    let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
    Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_schema_url(
            [
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(
    protocol: TelemetryProtocol,
) -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder();
    let exporter = match protocol {
        TelemetryProtocol::HTTP => exporter.with_http().build()?,
        TelemetryProtocol::GRPC => exporter.with_tonic().build()?,
    };
    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

/// Log filter from `RUST_LOG`, `info` when unset.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installed tracing subscriber; flushes exported spans on drop.
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Logs go to stderr so stdout carries only the fetched resource and the
    /// payment summary.
    pub fn init() -> Self {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let Some(protocol) = TelemetryProtocol::from_env() else {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt_layer)
                .init();
            return Self {
                tracer_provider: None,
            };
        };

        match init_tracer_provider(protocol) {
            Ok(tracer_provider) => {
                let tracer = tracer_provider.tracer(env!("CARGO_PKG_NAME"));
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .with(OpenTelemetryLayer::new(tracer))
                    .init();
                tracing::debug!(?protocol, "OpenTelemetry span export enabled");
                Self {
                    tracer_provider: Some(tracer_provider),
                }
            }
            Err(error) => {
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .init();
                tracing::warn!(%error, "OpenTelemetry exporter unavailable, logging locally only");
                Self {
                    tracer_provider: None,
                }
            }
        }
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.take() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
