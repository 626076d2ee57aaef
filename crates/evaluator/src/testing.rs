//! In-memory chain and connector used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::address::Address;
use common::error::RpcError;
use common::rpc::{Connector, EthRpc};
use common::types::BlockTag;

pub const GENESIS_TS: i64 = 1_438_269_973;
pub const BLOCK_TIME: i64 = 12;

pub const ADDR: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

pub fn addr() -> Address {
    Address::parse(ADDR).unwrap()
}

/// A single account on a chain whose transactions landed at `tx_heights`.
#[derive(Default)]
pub struct FakeChain {
    pub latest: u64,
    pub tx_heights: Vec<u64>,
    pub balance_wei: u128,
    /// Historical count queries at these heights fail.
    pub failing_heights: HashSet<u64>,
    /// Every historical count query fails.
    pub history_unavailable: bool,
    pub headers_missing: bool,
    pub latest_reads_delay: Option<Duration>,
    pub count_queries: AtomicUsize,
    pub queried_heights: Mutex<Vec<u64>>,
}

impl FakeChain {
    pub fn new(latest: u64, tx_heights: Vec<u64>) -> Self {
        Self {
            latest,
            tx_heights,
            ..Self::default()
        }
    }

    pub fn count_at(&self, height: u64) -> u64 {
        self.tx_heights.iter().filter(|&&h| h <= height).count() as u64
    }

    pub fn historical_queries(&self) -> usize {
        self.count_queries.load(Ordering::SeqCst)
    }
}

fn unavailable(what: &str) -> RpcError {
    RpcError::Node {
        code: -32000,
        message: format!("{what} unavailable"),
    }
}

pub struct FakeRpc {
    pub endpoint: String,
    pub chain: Arc<FakeChain>,
    pub down: bool,
}

impl EthRpc for FakeRpc {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        if self.down {
            return Err(unavailable("node"));
        }
        Ok(self.chain.latest)
    }

    async fn transaction_count(&self, _address: &Address, block: BlockTag) -> Result<u64, RpcError> {
        match block {
            BlockTag::Latest => {
                if let Some(delay) = self.chain.latest_reads_delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(self.chain.tx_heights.len() as u64)
            }
            BlockTag::Height(h) => {
                self.chain.count_queries.fetch_add(1, Ordering::SeqCst);
                self.chain.queried_heights.lock().unwrap().push(h);
                if self.chain.history_unavailable || self.chain.failing_heights.contains(&h) {
                    return Err(unavailable("state"));
                }
                Ok(self.chain.count_at(h))
            }
        }
    }

    async fn balance(&self, _address: &Address) -> Result<u128, RpcError> {
        if let Some(delay) = self.chain.latest_reads_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.chain.balance_wei)
    }

    async fn block_timestamp(&self, height: u64) -> Result<Option<i64>, RpcError> {
        if self.chain.headers_missing || height > self.chain.latest {
            return Ok(None);
        }
        Ok(Some(GENESIS_TS + BLOCK_TIME * height as i64))
    }
}

/// Hands out [`FakeRpc`]s; endpoints listed in `down` fail their liveness probe.
pub struct FakeConnector {
    pub chain: Arc<FakeChain>,
    pub down: HashSet<String>,
    pub connects: Mutex<Vec<String>>,
    pub connect_failures: HashMap<String, String>,
}

impl FakeConnector {
    pub fn new(chain: FakeChain) -> Self {
        Self {
            chain: Arc::new(chain),
            down: HashSet::new(),
            connects: Mutex::new(Vec::new()),
            connect_failures: HashMap::new(),
        }
    }

    pub fn with_down(mut self, endpoints: &[&str]) -> Self {
        self.down = endpoints.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

impl Connector for FakeConnector {
    type Rpc = FakeRpc;

    fn connect(&self, endpoint: &str) -> Result<FakeRpc, RpcError> {
        self.connects.lock().unwrap().push(endpoint.to_string());
        if let Some(reason) = self.connect_failures.get(endpoint) {
            return Err(RpcError::InvalidEndpoint(reason.clone()));
        }
        Ok(FakeRpc {
            endpoint: endpoint.to_string(),
            chain: self.chain.clone(),
            down: self.down.contains(endpoint),
        })
    }
}
