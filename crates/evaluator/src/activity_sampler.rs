use chrono::{DateTime, Datelike, Months, Utc};
use common::address::Address;
use common::error::ActivityProbeFailed;
use common::rpc::EthRpc;
use common::types::{ActivitySeries, BlockTag, MONTHS_IN_SERIES};
use futures_util::future::join_all;
use tracing::warn;

/// `(start, end)` block heights of the window `months_ago` months before `head`.
///
/// The start is clamped to genesis; a window whose end precedes genesis is
/// an error.
pub fn month_window(
    head: u64,
    months_ago: u64,
    blocks_per_month: u64,
) -> Result<(u64, u64), ActivityProbeFailed> {
    let end = months_ago
        .checked_mul(blocks_per_month)
        .and_then(|back| head.checked_sub(back))
        .ok_or(ActivityProbeFailed::BeforeGenesis)?;
    Ok((end.saturating_sub(blocks_per_month), end))
}

async fn count_at<R: EthRpc>(
    rpc: &R,
    address: &Address,
    height: u64,
) -> Result<u64, ActivityProbeFailed> {
    rpc.transaction_count(address, BlockTag::Height(height))
        .await
        .map_err(|source| ActivityProbeFailed::Probe { height, source })
}

/// Transactions sent during one window, from the nonce difference at its ends.
pub async fn sample_month<R: EthRpc>(
    rpc: &R,
    address: &Address,
    head: u64,
    months_ago: u64,
    blocks_per_month: u64,
) -> Result<u64, ActivityProbeFailed> {
    let (start, end) = month_window(head, months_ago, blocks_per_month)?;
    let (end_count, start_count) = tokio::try_join!(
        count_at(rpc, address, end),
        count_at(rpc, address, start)
    )?;
    Ok(end_count.saturating_sub(start_count))
}

/// Three-letter label of the calendar month `months_ago` months before `now`.
pub fn month_label(now: DateTime<Utc>, months_ago: u32) -> String {
    let first_of_month = now.date_naive().with_day(1).unwrap_or(now.date_naive());
    first_of_month
        .checked_sub_months(Months::new(months_ago))
        .map_or_else(String::new, |d| d.format("%b").to_string())
}

/// Approximate monthly activity over the trailing twelve months, oldest first.
///
/// All windows are sampled concurrently. A failed window counts as zero.
pub async fn sample_monthly_activity<R: EthRpc>(
    rpc: &R,
    address: &Address,
    head: u64,
    blocks_per_month: u64,
    now: DateTime<Utc>,
) -> ActivitySeries {
    // results[i] is the window i months back.
    let results = join_all(
        (0..MONTHS_IN_SERIES as u64)
            .map(|months_ago| sample_month(rpc, address, head, months_ago, blocks_per_month)),
    )
    .await;

    let newest = MONTHS_IN_SERIES - 1;
    let values = std::array::from_fn(|slot| match &results[newest - slot] {
        Ok(v) => *v,
        Err(e) => {
            metrics::counter!("persona_probe_failures_total", "kind" => e.kind(), "stage" => "activity").increment(1);
            warn!(address = %address, months_ago = newest - slot, error = %e, "monthly sample failed, counting 0");
            0
        }
    });
    let labels = std::array::from_fn(|slot| month_label(now, (newest - slot) as u32));

    ActivitySeries { labels, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, FakeChain, FakeRpc};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn rpc(chain: FakeChain) -> FakeRpc {
        FakeRpc {
            endpoint: "fake".to_string(),
            chain: Arc::new(chain),
            down: false,
        }
    }

    fn oct_2026() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_month_window() {
        assert_eq!(month_window(1_000, 0, 100).unwrap(), (900, 1_000));
        assert_eq!(month_window(1_000, 3, 100).unwrap(), (600, 700));
        assert_eq!(month_window(150, 1, 100).unwrap(), (0, 50));
        assert!(matches!(
            month_window(150, 2, 100),
            Err(ActivityProbeFailed::BeforeGenesis)
        ));
    }

    #[test]
    fn test_labels_trail_current_month() {
        assert_eq!(month_label(oct_2026(), 0), "Oct");
        assert_eq!(month_label(oct_2026(), 10), "Dec");
        assert_eq!(month_label(oct_2026(), 11), "Nov");

        let jan31 = Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(month_label(jan31, 1), "Dec");
    }

    #[tokio::test]
    async fn test_series_is_oldest_first() {
        // Window i months back covers (head - (i+1)*100, head - i*100].
        // Two txs in the newest window, one in the window 11 months back.
        let rpc = rpc(FakeChain::new(10_000, vec![8_850, 9_950, 9_990]));

        let series = sample_monthly_activity(&rpc, &addr(), 10_000, 100, oct_2026()).await;

        assert_eq!(series.labels.len(), 12);
        assert_eq!(series.values.len(), 12);
        assert_eq!(series.labels[0], "Nov");
        assert_eq!(series.labels[11], "Oct");
        assert_eq!(series.values[11], 2);
        assert_eq!(series.values[0], 1);
        assert_eq!(series.values.iter().sum::<u64>(), 3);
        // 12 windows, two counts each.
        assert_eq!(rpc.chain.historical_queries(), 24);
    }

    #[tokio::test]
    async fn test_failed_months_degrade_to_zero() {
        let mut chain = FakeChain::new(10_000, vec![9_950, 9_850, 9_750]);
        // Boundary between the newest two windows.
        chain.failing_heights.insert(9_900);
        let rpc = rpc(chain);

        let series = sample_monthly_activity(&rpc, &addr(), 10_000, 100, oct_2026()).await;

        assert_eq!(series.values[11], 0);
        assert_eq!(series.values[10], 0);
        assert_eq!(series.values[9], 1);
    }

    #[tokio::test]
    async fn test_young_chain_and_total_outage() {
        // Only three windows fit after genesis.
        let young = rpc(FakeChain::new(250, vec![10, 120, 240]));
        let series = sample_monthly_activity(&young, &addr(), 250, 100, oct_2026()).await;
        assert_eq!(series.values[11], 1);
        assert_eq!(series.values[10], 1);
        assert_eq!(series.values[9], 1);
        assert!(series.values[..9].iter().all(|&v| v == 0));

        let mut dead = FakeChain::new(10_000, vec![9_999]);
        dead.history_unavailable = true;
        let series = sample_monthly_activity(&rpc(dead), &addr(), 10_000, 100, oct_2026()).await;
        assert_eq!(series.values, [0; 12]);
        assert_eq!(series.labels.len(), 12);
    }
}
