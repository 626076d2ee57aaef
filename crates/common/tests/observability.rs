use metrics_exporter_prometheus::PrometheusBuilder;

// Exercises the public `common::observability` surface rather than its internals.

#[test]
fn error_events_increment_counter() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        let (dispatch, _otel_guard) = common::observability::build_dispatch("test-service", "info");

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!("not counted");
            tracing::error!(endpoint = "https://rpc.example.org", "all endpoints down");
        });
    });

    let rendered = handle.render();
    assert!(
        rendered.contains("persona_tracing_error_events"),
        "expected persona_tracing_error_events in rendered metrics, got:\n{rendered}"
    );
}
