use metrics::describe_gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn describe() {
    evaluator::metrics::describe();
    describe_gauge!(
        "persona_web_build_info",
        "Build info for the persona web API (value is always 1)."
    );
}

/// Install a global Prometheus recorder exactly once and return a handle for rendering `/metrics`.
///
/// `install_recorder` leaves upkeep to the caller; `/metrics` runs it on each scrape.
pub fn init_global() -> PrometheusHandle {
    let handle = PROM_HANDLE.get_or_init(|| {
        let handle = match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                // Another recorder already owns the process; serve an empty registry.
                tracing::warn!(error = %e, "prometheus recorder not installed");
                PrometheusBuilder::new().build_recorder().handle()
            }
        };
        describe();
        handle
    });

    ::metrics::gauge!(
        "persona_web_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);

    handle.clone()
}
