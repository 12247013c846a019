//! ## reactorsim-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry attributes**
//!
//! `RUST_LOG` always wins over the configured level.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Human readable output at `info`.
    pub fn init() {
        Self::init_with("info", false)
    }

    /// Installs the global subscriber. Panics if one is already installed.
    pub fn init_with(level: &str, json: bool) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        if json {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_thread_names(true)
                .with_current_span(true)
                .init()
        } else {
            fmt()
                .with_env_filter(filter)
                .with_thread_names(true)
                .with_span_events(FmtSpan::CLOSE)
                .init()
        }
    }

    /// Emits `event_type` with its attributes inside a `simulation_event` span.
    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "simulation_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(
                metadata = ?metadata,
                "Simulation event recorded"
            );
        }
        .instrument(span)
        .await
    }
}
