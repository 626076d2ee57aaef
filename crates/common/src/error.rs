use std::time::Duration;

use thiserror::Error;

/// Failure of a single JSON-RPC call against one node.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("http client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),

    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid endpoint URI {0}")]
    InvalidEndpoint(String),
}

impl RpcError {
    /// Short label used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Provider(_) => "provider",
            Self::Node { .. } => "node",
            Self::Decode(_) => "decode",
            Self::InvalidEndpoint(_) => "invalid_endpoint",
        }
    }
}

/// One endpoint failed its liveness probe. Recovered locally by failover.
#[derive(Debug, Error)]
#[error("endpoint {endpoint} unavailable: {source}")]
pub struct EndpointUnavailable {
    pub endpoint: String,
    #[source]
    pub source: RpcError,
}

/// A single historical probe (binary-search step or monthly sample) failed.
///
/// Never surfaced to callers: the aggregation points degrade it to
/// "Unknown" or `0`.
#[derive(Debug, Error)]
pub enum ActivityProbeFailed {
    #[error("probe at block {height} failed: {source}")]
    Probe {
        height: u64,
        #[source]
        source: RpcError,
    },

    #[error("sample window starts before genesis")]
    BeforeGenesis,
}

impl ActivityProbeFailed {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Probe { .. } => "probe",
            Self::BeforeGenesis => "before_genesis",
        }
    }
}

/// Errors surfaced to callers of the persona engine.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("invalid Ethereum address: {0}")]
    InvalidAddress(String),

    #[error("all {attempts} RPC endpoints are unavailable")]
    AllEndpointsUnavailable { attempts: usize },

    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl PersonaError {
    /// Whether a front-end should offer the user a retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidAddress(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::AllEndpointsUnavailable { .. } => "all_endpoints_unavailable",
            Self::RequestTimeout(_) => "request_timeout",
            Self::Rpc(_) => "rpc",
        }
    }
}

pub type PersonaResult<T> = Result<T, PersonaError>;
