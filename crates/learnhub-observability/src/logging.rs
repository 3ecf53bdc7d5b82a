use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Log each request with its method, matched route, status and latency.
///
/// An incoming `x-request-id` is reused; otherwise a new one is generated.
/// Either way it is echoed back on the response.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Incoming request"
    );

    let mut response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status {
        400..=499 => warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            latency_ms = %latency_ms,
            "Client error"
        ),
        500..=599 => error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            latency_ms = %latency_ms,
            "Server error"
        ),
        _ => info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            latency_ms = %latency_ms,
            "Request completed"
        ),
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(feature = "observability")]
mod otel {
    use opentelemetry::{KeyValue, global, trace::TraceError};
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{
        Resource,
        propagation::TraceContextPropagator,
        runtime,
        trace::{RandomIdGenerator, Sampler, Tracer},
    };
    use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
    use tracing::{info, warn};
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

    const LOG_DIR: &str = "storage/logs";

    fn init_tracer(endpoint: &str) -> Result<Tracer, TraceError> {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let resource = Resource::new(vec![
            KeyValue::new(SERVICE_NAME, "learnhub"),
            KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
            KeyValue::new(
                "environment",
                std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            ),
        ]);

        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint);

        opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(exporter)
            .with_trace_config(
                opentelemetry_sdk::trace::Config::default()
                    .with_sampler(Sampler::AlwaysOn)
                    .with_id_generator(RandomIdGenerator::default())
                    .with_resource(resource),
            )
            .install_batch(runtime::Tokio)
    }

    /// Console, rolling file (errors), rolling JSON (info) and, when
    /// `OTEL_EXPORTER_OTLP_ENDPOINT` is set, OTLP span export.
    pub fn init_tracing() {
        use tracing_appender::rolling::{RollingFileAppender, Rotation};
        use tracing_subscriber::fmt;

        if !crate::is_observability_enabled() {
            crate::init_basic_console_logging();
            return;
        }

        if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
            eprintln!("Failed to create {LOG_DIR} ({e}); using console logging only");
            crate::init_basic_console_logging();
            return;
        }

        let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("learnhub=info,learnhub_db=info,learnhub_cache=info,tower_http=warn,hyper=info,tonic=info")
        });

        let console_layer = fmt::layer()
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .compact()
            .with_filter(console_filter);

        let error_layer = fmt::layer()
            .with_writer(RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "learnhub.log"))
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_filter(EnvFilter::new("error"));

        let json_layer = fmt::layer()
            .json()
            .with_writer(RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "learnhub.json"))
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(EnvFilter::new("info"));

        let registry = tracing_subscriber::registry()
            .with(console_layer)
            .with(error_layer)
            .with(json_layer);

        let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
            let _ = registry.try_init();
            info!("Tracing initialized with file logging, OTLP export disabled");
            return;
        };

        match init_tracer(&endpoint) {
            Ok(tracer) => {
                let _ = registry
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .try_init();
                info!(otel.endpoint = %endpoint, "Tracing initialized with OpenTelemetry");
            }
            Err(e) => {
                let _ = registry.try_init();
                warn!(error = %e, "Failed to initialize OpenTelemetry, continuing without it");
            }
        }
    }

    pub async fn shutdown_tracer() {
        info!("Shutting down OpenTelemetry tracer");
        global::shutdown_tracer_provider();
    }
}

#[cfg(feature = "observability")]
pub use otel::{init_tracing, shutdown_tracer};

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(middleware::from_fn(logging_middleware))
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_echoes_incoming_request_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    }
}
