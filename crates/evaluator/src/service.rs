use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::address::Address;
use common::config;
use common::error::PersonaResult;
use common::rpc::{Connector, HttpConnector};
use common::types::{ActivitySeries, WalletPersona, WalletReport, WalletSnapshot};

use crate::activity_sampler::sample_monthly_activity;
use crate::endpoint_pool::{Connection, EndpointPool, EndpointStatus, ResilientClient};
use crate::insights::{health_band, persona_bio, recommendations, risk_score};
use crate::persona_scoring::score_persona;
use crate::snapshot::build_snapshot;

/// Chain-specific knobs, lifted out of `[chain]` config.
#[derive(Debug, Clone, Copy)]
pub struct ChainParams {
    pub blocks_per_month: u64,
    pub confirmations_assumed_final: u64,
    pub snapshot_timeout: Duration,
}

impl From<&config::Chain> for ChainParams {
    fn from(chain: &config::Chain) -> Self {
        Self {
            blocks_per_month: chain.blocks_per_month(),
            confirmations_assumed_final: chain.confirmations_assumed_final,
            snapshot_timeout: chain.snapshot_timeout(),
        }
    }
}

/// Entry point for front-ends: raw address string in, plain data out.
pub struct PersonaService<C> {
    client: ResilientClient<C>,
    params: ChainParams,
}

impl PersonaService<HttpConnector> {
    pub fn from_config(chain: &config::Chain) -> Result<Self> {
        let pool = EndpointPool::new(chain.endpoints.clone())?;
        let connector = HttpConnector::new(chain.request_timeout())?;
        Ok(Self::new(ResilientClient::new(pool, connector), chain.into()))
    }
}

impl<C: Connector> PersonaService<C> {
    pub fn new(client: ResilientClient<C>, params: ChainParams) -> Self {
        Self { client, params }
    }

    pub fn client(&self) -> &ResilientClient<C> {
        &self.client
    }

    /// Highest height treated as settled.
    fn head(&self, conn: &Connection<C::Rpc>) -> u64 {
        conn.latest_block
            .saturating_sub(self.params.confirmations_assumed_final)
    }

    async fn snapshot_on(
        &self,
        conn: &Connection<C::Rpc>,
        address: Address,
    ) -> PersonaResult<WalletSnapshot> {
        let res = build_snapshot(
            &conn.rpc,
            address,
            self.head(conn),
            self.params.snapshot_timeout,
        )
        .await;
        let status = match &res {
            Ok(_) => "ok",
            Err(e) => e.as_str(),
        };
        metrics::counter!("persona_snapshots_total", "status" => status).increment(1);
        res
    }

    async fn activity_on(
        &self,
        conn: &Connection<C::Rpc>,
        address: &Address,
        now: DateTime<Utc>,
    ) -> ActivitySeries {
        sample_monthly_activity(
            &conn.rpc,
            address,
            self.head(conn),
            self.params.blocks_per_month,
            now,
        )
        .await
    }

    /// Validates the address before any network call.
    pub async fn snapshot(&self, raw_address: &str) -> PersonaResult<WalletSnapshot> {
        let address = Address::parse(raw_address)?;
        let conn = self.client.acquire().await?;
        self.snapshot_on(&conn, address).await
    }

    pub async fn persona(&self, raw_address: &str) -> PersonaResult<WalletPersona> {
        let snapshot = self.snapshot(raw_address).await?;
        Ok(score_persona(&snapshot))
    }

    pub async fn risk_score(&self, raw_address: &str) -> PersonaResult<u8> {
        let snapshot = self.snapshot(raw_address).await?;
        Ok(risk_score(&snapshot))
    }

    pub async fn activity(&self, raw_address: &str) -> PersonaResult<ActivitySeries> {
        self.activity_at(raw_address, Utc::now()).await
    }

    pub async fn activity_at(
        &self,
        raw_address: &str,
        now: DateTime<Utc>,
    ) -> PersonaResult<ActivitySeries> {
        let address = Address::parse(raw_address)?;
        let conn = self.client.acquire().await?;
        Ok(self.activity_on(&conn, &address, now).await)
    }

    pub async fn report(&self, raw_address: &str) -> PersonaResult<WalletReport> {
        self.report_at(raw_address, Utc::now()).await
    }

    /// Snapshot and activity series fetched concurrently over one connection.
    pub async fn report_at(
        &self,
        raw_address: &str,
        now: DateTime<Utc>,
    ) -> PersonaResult<WalletReport> {
        let address = Address::parse(raw_address)?;
        let conn = self.client.acquire().await?;

        let (snapshot, activity) = tokio::join!(
            self.snapshot_on(&conn, address.clone()),
            self.activity_on(&conn, &address, now)
        );
        let snapshot = snapshot?;

        let persona = score_persona(&snapshot);
        let risk = risk_score(&snapshot);
        Ok(WalletReport {
            bio: persona_bio(&address, persona.title),
            recommendations: recommendations(persona.primary_trait).to_vec(),
            risk_score: risk,
            health: health_band(risk),
            address,
            snapshot,
            persona,
            activity,
        })
    }

    pub async fn probe_endpoints(&self) -> Vec<EndpointStatus> {
        self.client.probe_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChain, FakeConnector, ADDR};
    use chrono::TimeZone;
    use common::error::PersonaError;
    use common::types::{HealthBand, PersonaTitle, TraitName};

    fn params() -> ChainParams {
        ChainParams {
            blocks_per_month: 100,
            confirmations_assumed_final: 0,
            snapshot_timeout: Duration::from_secs(10),
        }
    }

    fn service(chain: FakeChain, down: &[&str]) -> PersonaService<FakeConnector> {
        let pool = EndpointPool::new(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ])
        .unwrap();
        let connector = FakeConnector::new(chain).with_down(down);
        PersonaService::new(ResilientClient::new(pool, connector), params())
    }

    #[test]
    fn test_shipped_config_month_windows() {
        let config =
            config::Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        let params = ChainParams::from(&config.chain);
        assert_eq!(params.blocks_per_month, 2_628_000);
        assert_eq!(
            crate::activity_sampler::month_window(23_600_000, 0, params.blocks_per_month).unwrap(),
            (20_972_000, 23_600_000)
        );
    }

    #[tokio::test]
    async fn test_invalid_address_never_touches_network() {
        let svc = service(FakeChain::new(1_000, vec![]), &[]);
        for raw in ["0x1234", "0xZZ", ""] {
            let err = svc.persona(raw).await.unwrap_err();
            assert!(matches!(err, PersonaError::InvalidAddress(_)));
        }
        let err = svc.activity("nope").await.unwrap_err();
        assert!(matches!(err, PersonaError::InvalidAddress(_)));
        assert!(svc.client().connector().attempts().is_empty());
    }

    #[tokio::test]
    async fn test_all_endpoints_down_surfaces() {
        let svc = service(
            FakeChain::new(1_000, vec![]),
            &["https://a.example", "https://b.example"],
        );
        let err = svc.report(ADDR).await.unwrap_err();
        assert!(matches!(
            err,
            PersonaError::AllEndpointsUnavailable { attempts: 2 }
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_persona_for_active_wallet() {
        let mut chain = FakeChain::new(10_000, (9_000..9_060).collect());
        chain.balance_wei = 300_000_000_000_000_000;
        let svc = service(chain, &["https://a.example"]);

        let persona = svc.persona(ADDR).await.unwrap();

        assert_eq!(persona.title, PersonaTitle::ActiveTrader);
        assert_eq!(persona.primary_trait, TraitName::Trader);
        assert_eq!(persona.traits[1].level, 30);
        assert_eq!(persona.stats.assets, 12);
        assert_eq!(svc.client().cursor(), 1);
    }

    #[tokio::test]
    async fn test_confirmations_lower_the_head() {
        let chain = FakeChain::new(1_000, vec![995]);
        let pool = EndpointPool::new(vec!["https://a.example".to_string()]).unwrap();
        let svc = PersonaService::new(
            ResilientClient::new(pool, FakeConnector::new(chain)),
            ChainParams {
                confirmations_assumed_final: 10,
                ..params()
            },
        );

        // The only tx is above the settled head, so it cannot be located.
        let snap = svc.snapshot(ADDR).await.unwrap();
        assert_eq!(snap.transaction_count, 1);
        assert_eq!(
            snap.first_transaction_date,
            common::types::FirstActivity::Unknown
        );
    }

    #[tokio::test]
    async fn test_report_bundles_everything() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let svc = service(FakeChain::new(10_000, vec![9_950]), &[]);

        let report = svc.report_at(ADDR, now).await.unwrap();

        assert_eq!(report.snapshot.transaction_count, 1);
        assert_eq!(report.persona.title, PersonaTitle::NewExplorer);
        assert_eq!(report.risk_score, 50);
        assert_eq!(report.health, HealthBand::AtRisk);
        // Trader 2, Holder 0, Active User 5.
        assert_eq!(report.persona.primary_trait, TraitName::ActiveUser);
        assert_eq!(report.recommendations, vec!["Snapshot", "Gitcoin"]);
        assert_eq!(report.bio.handle, "@Explorer_5aae");
        assert_eq!(report.activity.values[11], 1);
        assert_eq!(report.activity.labels[11], "Oct");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["riskScore"], 50);
        assert_eq!(json["health"], "at_risk");
        assert_eq!(
            json["address"],
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }
}
