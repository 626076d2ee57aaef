use common::address::Address;
use common::error::ActivityProbeFailed;
use common::rpc::EthRpc;
use common::types::{BlockTag, FirstActivity};
use tracing::{debug, warn};

/// Lowest height in `[0, head]` at which the account's nonce is non-zero.
///
/// Relies on transaction counts never decreasing with height. Any failed
/// probe aborts the search; there are no retries.
pub async fn locate_first_activity_block<R: EthRpc>(
    rpc: &R,
    address: &Address,
    head: u64,
) -> Result<Option<u64>, ActivityProbeFailed> {
    let mut low = 0u64;
    let mut high = head;
    let mut found = None;

    while low <= high {
        let mid = low + (high - low) / 2;
        let count = rpc
            .transaction_count(address, BlockTag::Height(mid))
            .await
            .map_err(|source| ActivityProbeFailed::Probe {
                height: mid,
                source,
            })?;
        if count > 0 {
            found = Some(mid);
            if mid == 0 {
                break;
            }
            high = mid - 1;
        } else {
            low = mid + 1;
        }
    }
    Ok(found)
}

async fn first_activity<R: EthRpc>(
    rpc: &R,
    address: &Address,
    head: u64,
) -> Result<FirstActivity, ActivityProbeFailed> {
    let Some(height) = locate_first_activity_block(rpc, address, head).await? else {
        return Ok(FirstActivity::Unknown);
    };
    let timestamp = rpc
        .block_timestamp(height)
        .await
        .map_err(|source| ActivityProbeFailed::Probe { height, source })?;
    debug!(address = %address, height, ?timestamp, "first activity block");
    Ok(timestamp.map_or(FirstActivity::Unknown, FirstActivity::from_unix_secs))
}

/// Calendar date of the account's first transaction, or `Unknown` when the
/// account never transacted or any lookup failed.
pub async fn locate_first_activity<R: EthRpc>(
    rpc: &R,
    address: &Address,
    head: u64,
) -> FirstActivity {
    match first_activity(rpc, address, head).await {
        Ok(first) => first,
        Err(e) => {
            metrics::counter!("persona_probe_failures_total", "kind" => e.kind(), "stage" => "first_activity").increment(1);
            warn!(address = %address, error = %e, "first activity lookup failed, reporting Unknown");
            FirstActivity::Unknown
        }
    }
}
