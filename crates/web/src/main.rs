mod metrics;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use common::error::PersonaError;
use common::rpc::HttpConnector;
use common::types::{ActivitySeries, WalletPersona, WalletReport};
use evaluator::service::PersonaService;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub service: PersonaService<HttpConnector>,
    pub prometheus: PrometheusHandle,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    retryable: bool,
}

/// JSON error response for a surfaced [`PersonaError`].
struct ApiError(PersonaError);

impl From<PersonaError> for ApiError {
    fn from(e: PersonaError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            PersonaError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            PersonaError::AllEndpointsUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PersonaError::RequestTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PersonaError::Rpc(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = status.as_u16(), "wallet lookup failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus.run_upkeep();
    state.prometheus.render()
}

async fn persona(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<WalletPersona>, ApiError> {
    Ok(Json(state.service.persona(&address).await?))
}

async fn activity(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ActivitySeries>, ApiError> {
    Ok(Json(state.service.activity(&address).await?))
}

async fn report(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<WalletReport>, ApiError> {
    Ok(Json(state.service.report(&address).await?))
}

// --- Router ---

pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/wallets/{address}/persona", get(persona))
        .route("/api/wallets/{address}/activity", get(activity))
        .route("/api/wallets/{address}/report", get(report));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = common::config::Config::load()?;
    let _otel_guard = common::observability::init("web", &config.general.log_level)?;

    let web_port = config.web.as_ref().map_or(8080, |w| w.port);
    let web_host = config
        .web
        .as_ref()
        .map_or("0.0.0.0".to_string(), |w| w.host.clone());

    let state = Arc::new(AppState {
        service: PersonaService::from_config(&config.chain)?,
        prometheus: metrics::init_global(),
    });

    let app = create_router_with_state(state);
    let addr: SocketAddr = format!("{web_host}:{web_port}").parse()?;
    tracing::info!(%addr, endpoints = config.chain.endpoints.len(), "persona api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
