//! Log and span output for the targeting loop.
//!
//! [`init_tracing`] installs one global subscriber.  What it carries:
//!
//! - a `turret_run` span per [`TurretLoop::run`](crate::TurretLoop::run),
//!   tagged with the run's `uuid` plus the camera and link ids, so every line
//!   of one run can be grouped by `run_id`;
//! - a `tick` span per loop iteration holding the tick number;
//! - `info` events for state transitions and sent commands, `warn` for link
//!   and sink failures, `error` when the run aborts.
//!
//! Format and export are chosen from the environment:
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`; `debug` adds per-tick reports). |
//! | `TURRET_LOG_FORMAT=json` | Newline-delimited JSON instead of compact text. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | Also ship the run and tick spans over OTLP/HTTP. |
//!
//! ```rust,no_run
//! // Hold the guard until the loop has returned.
//! let _guard = turret_runtime::telemetry::init_tracing("turret");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting the log line format.
pub const LOG_FORMAT_VAR: &str = "TURRET_LOG_FORMAT";

/// Install the global `tracing` subscriber.
///
/// Console output is compact text unless [`LOG_FORMAT_VAR`] is `json`.  With
/// `OTEL_EXPORTER_OTLP_ENDPOINT` set, the per-run and per-tick spans of the
/// loop driver are also forwarded to the collector.
///
/// The returned [`TracerProviderGuard`] flushes pending spans when dropped.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var(LOG_FORMAT_VAR).as_deref() == Ok("json");

    let provider = build_provider(service_name);
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("turret")));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);
    if use_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    TracerProviderGuard(provider)
}

/// Shuts the OTel [`SdkTracerProvider`] down on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    /// Whether spans are being exported to a collector.
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[turret] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// `None` when no endpoint is configured or the exporter fails to build.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[turret] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // The loop is synchronous, so the simple exporter avoids needing an
    // async runtime for batch export.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_provider_returns_none_without_endpoint() {
        // SAFETY: no other test in this crate reads this variable.
        unsafe { std::env::remove_var("OTEL_EXPORTER_OTLP_ENDPOINT") };
        assert!(build_provider("turret-test").is_none());
    }

    #[test]
    fn empty_guard_drops_cleanly() {
        let guard = TracerProviderGuard(None);
        assert!(!guard.is_exporting());
        drop(guard);
    }
}
