use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{ensure, Result};
use common::error::{EndpointUnavailable, PersonaError};
use common::rpc::{Connector, EthRpc};
use tracing::{debug, warn};

/// Ordered, non-empty list of interchangeable RPC endpoints.
#[derive(Debug, Clone)]
pub struct EndpointPool {
    endpoints: Vec<String>,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<String>) -> Result<Self> {
        ensure!(!endpoints.is_empty(), "endpoint pool must not be empty");
        Ok(Self { endpoints })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoint at `cursor`, wrapping modulo the pool size.
    pub fn endpoint(&self, cursor: usize) -> &str {
        &self.endpoints[cursor % self.endpoints.len()]
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

/// A live node handle plus the pool position it was found at.
pub struct Connection<R> {
    pub rpc: R,
    pub cursor: usize,
    /// Chain height reported by the liveness probe.
    pub latest_block: u64,
}

async fn probe<C: Connector>(
    connector: &C,
    endpoint: &str,
) -> Result<(C::Rpc, u64), EndpointUnavailable> {
    let unavailable = |source| EndpointUnavailable {
        endpoint: endpoint.to_string(),
        source,
    };
    let rpc = connector.connect(endpoint).map_err(unavailable)?;
    let latest = rpc.block_number().await.map_err(unavailable)?;
    Ok((rpc, latest))
}

/// Round-robin failover starting at `start`.
///
/// Tries each endpoint at most once. The returned connection carries the
/// cursor of the endpoint that answered so the caller can start there next time.
pub async fn acquire_connection<C: Connector>(
    pool: &EndpointPool,
    start: usize,
    connector: &C,
) -> Result<Connection<C::Rpc>, PersonaError> {
    let attempts = pool.len();
    for attempt in 0..attempts {
        let cursor = (start + attempt) % attempts;
        match probe(connector, pool.endpoint(cursor)).await {
            Ok((rpc, latest_block)) => {
                debug!(endpoint = pool.endpoint(cursor), latest_block, "rpc endpoint live");
                return Ok(Connection {
                    rpc,
                    cursor,
                    latest_block,
                });
            }
            Err(e) => {
                metrics::counter!("persona_endpoint_failovers_total").increment(1);
                warn!(error = %e, attempt = attempt + 1, of = attempts, "rpc endpoint failed liveness probe");
            }
        }
    }
    Err(PersonaError::AllEndpointsUnavailable { attempts })
}

#[derive(Debug)]
pub struct EndpointStatus {
    pub endpoint: String,
    pub latest_block: Result<u64, EndpointUnavailable>,
}

/// Shares an [`EndpointPool`] between concurrent callers.
///
/// Only the last good cursor is shared; each call probes independently, so
/// concurrent callers may probe the same endpoint.
pub struct ResilientClient<C> {
    pool: EndpointPool,
    connector: C,
    cursor: AtomicUsize,
}

impl<C: Connector> ResilientClient<C> {
    pub fn new(pool: EndpointPool, connector: C) -> Self {
        Self {
            pool,
            connector,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn acquire(&self) -> Result<Connection<C::Rpc>, PersonaError> {
        let conn = acquire_connection(&self.pool, self.cursor(), &self.connector).await?;
        self.cursor.store(conn.cursor, Ordering::Relaxed);
        Ok(conn)
    }

    /// Probe every endpoint once, in pool order, without moving the cursor.
    pub async fn probe_all(&self) -> Vec<EndpointStatus> {
        let mut out = Vec::with_capacity(self.pool.len());
        for endpoint in self.pool.endpoints() {
            let latest_block = probe(&self.connector, endpoint).await.map(|(_, h)| h);
            out.push(EndpointStatus {
                endpoint: endpoint.clone(),
                latest_block,
            });
        }
        out
    }
}
