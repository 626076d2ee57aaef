use anyhow::Result;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "persona_rpc_requests_total",
        "JSON-RPC requests by method and outcome."
    );
    describe_counter!(
        "persona_rpc_errors_total",
        "Failed JSON-RPC requests by method and error kind."
    );
    describe_histogram!(
        "persona_rpc_latency_ms",
        "JSON-RPC request latency in milliseconds."
    );
    describe_counter!(
        "persona_endpoint_failovers_total",
        "Endpoints skipped after a failed liveness probe."
    );
    describe_counter!(
        "persona_probe_failures_total",
        "Historical probes that failed and were degraded."
    );
    describe_counter!(
        "persona_snapshots_total",
        "Wallet snapshots attempted, by outcome."
    );
    describe_counter!(
        "persona_tracing_error_events",
        "ERROR-level tracing events emitted."
    );
}

pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?)
}
