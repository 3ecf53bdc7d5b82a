//! LearnHub observability.
//!
//! - Structured request logging with a per-request id
//! - OpenTelemetry trace export when `OTEL_EXPORTER_OTLP_ENDPOINT` is set
//! - Prometheus metrics, including domain counters for system IDs,
//!   enrollments, payments and ID cards
//!
//! Everything is compiled in with the `observability` feature (default) and can
//! be switched off at runtime with `OBSERVABILITY_ENABLED=false`. Without the
//! feature the same functions exist as no-ops and logging falls back to a
//! plain console subscriber.
//!
//! ```no_run
//! use learnhub_observability::{init_tracing, shutdown_tracer};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     // ...
//!     shutdown_tracer().await;
//! }
//! ```

pub mod basic_logging;
mod logging;

#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::init_basic_console_logging;
pub use logging::logging_middleware;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, metrics_app, metrics_middleware, track_card_scanned, track_cards_issued,
    track_enrollment_created, track_enrollment_transition, track_payment_reviewed,
    track_school_created, track_system_id_exhausted, track_system_id_generated,
    track_user_created,
};
#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

use std::sync::OnceLock;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Runtime switch read once from `OBSERVABILITY_ENABLED` (default on).
/// Always `false` when the feature is not compiled in.
pub fn is_observability_enabled() -> bool {
    cfg!(feature = "observability")
        && *OBSERVABILITY_ENABLED.get_or_init(|| {
            std::env::var("OBSERVABILITY_ENABLED")
                .map(|v| parse_enabled(&v))
                .unwrap_or(true)
        })
}

fn parse_enabled(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "off" | "no")
}

#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{extract::Request, middleware::Next, response::Response};

    pub fn init_tracing() {
        super::init_basic_console_logging();
    }

    pub async fn shutdown_tracer() {}

    pub fn init_metrics() -> Option<()> {
        None
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn track_system_id_generated(_kind: &str, _fallback: bool, _collisions: u32) {}
    pub fn track_system_id_exhausted(_kind: &str) {}
    pub fn track_user_created(_role: &str) {}
    pub fn track_school_created() {}
    pub fn track_enrollment_created(_enrollment_type: &str) {}
    pub fn track_enrollment_transition(_action: &str) {}
    pub fn track_payment_reviewed(_outcome: &str) {}
    pub fn track_cards_issued(_holder_type: &str, _count: usize) {}
    pub fn track_card_scanned(_outcome: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
