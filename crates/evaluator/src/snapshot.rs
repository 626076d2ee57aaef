use std::time::Duration;

use common::address::Address;
use common::error::{PersonaError, PersonaResult};
use common::rpc::EthRpc;
use common::types::{wei_to_ether, BlockTag, WalletSnapshot};
use tracing::info;

use crate::first_activity::locate_first_activity;

/// Only one chain is ever queried.
pub const NETWORKS: u32 = 1;

/// Rough asset count: one per five transactions, at least one once active.
pub fn asset_count(transaction_count: u64) -> u64 {
    if transaction_count == 0 {
        0
    } else {
        (transaction_count / 5).max(1)
    }
}

/// Fetch nonce and balance under `deadline`, then locate first activity.
///
/// When the deadline fires the pending reads are dropped, which cancels
/// their in-flight requests. First-activity failures degrade to `Unknown`.
pub async fn build_snapshot<R: EthRpc>(
    rpc: &R,
    address: Address,
    head: u64,
    deadline: Duration,
) -> PersonaResult<WalletSnapshot> {
    let reads = async {
        tokio::try_join!(
            rpc.transaction_count(&address, BlockTag::Latest),
            rpc.balance(&address)
        )
    };
    let (transaction_count, balance_wei) = tokio::time::timeout(deadline, reads)
        .await
        .map_err(|_elapsed| PersonaError::RequestTimeout(deadline))??;

    let first_transaction_date = locate_first_activity(rpc, &address, head).await;
    let balance = wei_to_ether(balance_wei)?;

    info!(
        address = %address,
        endpoint = rpc.endpoint(),
        transaction_count,
        %balance,
        first = %first_transaction_date,
        "wallet snapshot built"
    );

    Ok(WalletSnapshot {
        address,
        transaction_count,
        balance,
        first_transaction_date,
        asset_count: asset_count(transaction_count),
        networks: NETWORKS,
    })
}
