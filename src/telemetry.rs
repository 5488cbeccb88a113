use actix_web::HttpResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

use crate::models::ContentKind;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Structured logging; `RUST_LOG` overrides the INFO default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();
}

/// Installs the global Prometheus recorder once. Later calls reuse it.
pub fn install_prometheus() -> Option<&'static PrometheusHandle> {
    PROMETHEUS
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|e| warn!("prometheus recorder not installed: {e}"))
        .ok()
}

pub fn record_like(kind: ContentKind) {
    metrics::counter!("memories_likes_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_submission(kind: &'static str) {
    metrics::counter!("memories_submissions_total", "kind" => kind).increment(1);
}

pub fn record_failure(during: &'static str) {
    metrics::counter!("memories_failures_total", "during" => during).increment(1);
}

pub async fn metrics_endpoint() -> HttpResponse {
    match PROMETHEUS.get() {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::NotFound().finish(),
    }
}
