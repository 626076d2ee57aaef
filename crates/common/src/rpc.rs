use std::future::Future;
use std::time::{Duration, Instant};

use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError as _};
use ethers::types::{BlockId, BlockNumber, U256};
use reqwest::Url;
use tracing::debug;

use crate::address::Address;
use crate::error::RpcError;
use crate::types::BlockTag;

/// The read-only node operations the persona engine needs.
pub trait EthRpc: Send + Sync {
    fn endpoint(&self) -> &str;

    fn block_number(&self) -> impl Future<Output = Result<u64, RpcError>> + Send;

    fn transaction_count(
        &self,
        address: &Address,
        block: BlockTag,
    ) -> impl Future<Output = Result<u64, RpcError>> + Send;

    /// Current balance in wei.
    fn balance(&self, address: &Address) -> impl Future<Output = Result<u128, RpcError>> + Send;

    /// Header timestamp (unix seconds) of the block at `height`, `None` if the
    /// node does not know the block.
    fn block_timestamp(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<Option<i64>, RpcError>> + Send;
}

/// Builds an [`EthRpc`] handle for an endpoint URI.
pub trait Connector: Send + Sync {
    type Rpc: EthRpc;

    fn connect(&self, endpoint: &str) -> Result<Self::Rpc, RpcError>;
}

impl From<BlockTag> for BlockId {
    fn from(tag: BlockTag) -> Self {
        match tag {
            BlockTag::Latest => BlockNumber::Latest.into(),
            BlockTag::Height(h) => h.into(),
        }
    }
}

/// JSON-RPC error objects from the node keep their code; everything else
/// stays a provider error.
fn classify(e: ProviderError) -> RpcError {
    match e.as_error_response() {
        Some(resp) => RpcError::Node {
            code: resp.code,
            message: resp.message.clone(),
        },
        None => RpcError::Provider(e),
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64, RpcError> {
    if value.bits() > 64 {
        return Err(RpcError::Decode(format!("{what} {value} does not fit in u64")));
    }
    Ok(value.low_u64())
}

fn to_u128(value: U256, what: &str) -> Result<u128, RpcError> {
    if value.bits() > 128 {
        return Err(RpcError::Decode(format!("{what} {value} does not fit in u128")));
    }
    Ok(value.low_u128())
}

/// An `ethers` HTTP provider for one endpoint, with per-call metrics.
pub struct HttpRpcClient {
    endpoint: String,
    provider: Provider<Http>,
}

impl HttpRpcClient {
    pub fn new(endpoint: &str, client: reqwest::Client) -> Result<Self, RpcError> {
        let url = Url::parse(endpoint)
            .map_err(|e| RpcError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            provider: Provider::new(Http::new_with_client(url, client)),
        })
    }

    async fn observe<T, F>(&self, method: &'static str, call: F) -> Result<T, RpcError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        debug!(endpoint = %self.endpoint, method, "rpc call");
        let start = Instant::now();
        let res = call.await.map_err(classify);
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("persona_rpc_latency_ms", "method" => method).record(ms);
        match &res {
            Ok(_) => {
                metrics::counter!("persona_rpc_requests_total", "method" => method, "status" => "ok").increment(1);
            }
            Err(e) => {
                metrics::counter!("persona_rpc_requests_total", "method" => method, "status" => "error").increment(1);
                metrics::counter!("persona_rpc_errors_total", "method" => method, "kind" => e.kind()).increment(1);
            }
        }
        res
    }
}

impl EthRpc for HttpRpcClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        let height = self
            .observe("eth_blockNumber", self.provider.get_block_number())
            .await?;
        Ok(height.as_u64())
    }

    async fn transaction_count(&self, address: &Address, block: BlockTag) -> Result<u64, RpcError> {
        let count = self
            .observe(
                "eth_getTransactionCount",
                self.provider
                    .get_transaction_count(address.h160(), Some(block.into())),
            )
            .await?;
        to_u64(count, "transaction count")
    }

    async fn balance(&self, address: &Address) -> Result<u128, RpcError> {
        let wei = self
            .observe("eth_getBalance", self.provider.get_balance(address.h160(), None))
            .await?;
        to_u128(wei, "balance")
    }

    async fn block_timestamp(&self, height: u64) -> Result<Option<i64>, RpcError> {
        let block = self
            .observe("eth_getBlockByNumber", self.provider.get_block(height))
            .await?;
        let Some(block) = block else {
            return Ok(None);
        };
        let secs = to_u64(block.timestamp, "timestamp")?;
        let secs = i64::try_from(secs)
            .map_err(|e| RpcError::Decode(format!("timestamp {secs} out of range: {e}")))?;
        Ok(Some(secs))
    }
}

/// Creates [`HttpRpcClient`]s that share one connection pool.
#[derive(Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new(request_timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }
}

impl Connector for HttpConnector {
    type Rpc = HttpRpcClient;

    fn connect(&self, endpoint: &str) -> Result<HttpRpcClient, RpcError> {
        HttpRpcClient::new(endpoint, self.client.clone())
    }
}
