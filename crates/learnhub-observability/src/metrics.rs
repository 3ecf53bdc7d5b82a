//! Prometheus metrics: HTTP request counters and latency plus domain events.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::is_observability_enabled;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Install the global Prometheus recorder and spawn its upkeep task.
///
/// Returns `None` when observability is disabled or a recorder is already
/// installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .inspect_err(|e| warn!(error = %e, "Invalid histogram buckets"))
        .ok()?;

    let handle = builder
        .install_recorder()
        .inspect_err(|e| warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

fn status_category(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(latency);
    counter!("http_requests_by_status", "status_category" => status_category(status))
        .increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Standalone router serving `/metrics`, bound on its own port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_system_id_generated(kind: &str, fallback: bool, collisions: u32) {
    if !is_observability_enabled() {
        return;
    }
    let strategy = if fallback { "fallback" } else { "primary" };
    counter!("system_ids_generated_total", "kind" => kind.to_string(), "strategy" => strategy)
        .increment(1);
    if collisions > 0 {
        counter!("system_id_collisions_total", "kind" => kind.to_string())
            .increment(u64::from(collisions));
    }
}

pub fn track_system_id_exhausted(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("system_id_exhausted_total", "kind" => kind.to_string()).increment(1);
}

pub fn track_user_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role" => role.to_string()).increment(1);
}

pub fn track_school_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("schools_created_total").increment(1);
}

pub fn track_enrollment_created(enrollment_type: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("enrollments_created_total", "type" => enrollment_type.to_string()).increment(1);
}

pub fn track_enrollment_transition(action: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("enrollment_transitions_total", "action" => action.to_string()).increment(1);
}

pub fn track_payment_reviewed(outcome: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("payments_reviewed_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn track_cards_issued(holder_type: &str, count: usize) {
    if !is_observability_enabled() || count == 0 {
        return;
    }
    counter!("id_cards_issued_total", "holder_type" => holder_type.to_string())
        .increment(count as u64);
}

pub fn track_card_scanned(outcome: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("id_card_scans_total", "outcome" => outcome.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_category() {
        assert_eq!(status_category(200), "2xx");
        assert_eq!(status_category(304), "3xx");
        assert_eq!(status_category(404), "4xx");
        assert_eq!(status_category(503), "5xx");
        assert_eq!(status_category(101), "other");
    }

    #[test]
    fn test_tracking_without_recorder_is_harmless() {
        track_system_id_generated("student", true, 3);
        track_cards_issued("family", 0);
        track_card_scanned("revoked");
    }
}
