use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

pub use metrics_exporter_prometheus::PrometheusHandle;

pub const METRICS_PORT_ENV: &str = "QM_METRICS_PORT";
pub const DEFAULT_METRICS_PORT: u16 = 9102;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Port for the `/metrics` listener (`QM_METRICS_PORT`, default 9102).
pub fn metrics_port() -> u16 {
    env::var(METRICS_PORT_ENV)
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(DEFAULT_METRICS_PORT)
}

/// Install the global Prometheus recorder once and return its handle.
///
/// The caller serves `handle.render()` on `metrics_port()`.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            info!(metrics_port = metrics_port(), "installed prometheus recorder");
            PROMETHEUS_HANDLE.get()
        }
        Err(err) => {
            warn!(error = %err, "failed to install prometheus recorder");
            PROMETHEUS_HANDLE.get()
        }
    }
}

/// Installed handle, if `init_metrics` succeeded.
pub fn handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// One scored quiz submission.
pub fn record_evaluation(domain: &'static str, answered: usize, elapsed: Duration) {
    counter!("qm_evaluations_total", "domain" => domain).increment(1);
    histogram!("qm_evaluation_seconds", "domain" => domain).record(elapsed.as_secs_f64());
    histogram!("qm_answered_questions", "domain" => domain).record(answered as f64);
}

/// Outcome of an enrichment attempt (`skipped` / `applied` / `fallback`).
pub fn record_enrichment(domain: &'static str, status: &'static str) {
    counter!("qm_enrichment_total", "domain" => domain, "status" => status).increment(1);
}
