use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::address::Address;
use crate::error::RpcError;

pub const WEI_DECIMALS: u32 = 18;
pub const MONTHS_IN_SERIES: usize = 12;

/// Block selector for historical state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Height(u64),
}

/// Date of the first outgoing transaction, when it could be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstActivity {
    Date(NaiveDate),
    Unknown,
}

impl FirstActivity {
    pub fn from_unix_secs(secs: i64) -> Self {
        chrono::DateTime::from_timestamp(secs, 0)
            .map_or(Self::Unknown, |dt| Self::Date(dt.date_naive()))
    }
}

impl fmt::Display for FirstActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%b %-d, %Y")),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

impl Serialize for FirstActivity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Convert a wei amount into ether without losing precision.
pub fn wei_to_ether(wei: u128) -> Result<Decimal, RpcError> {
    let mantissa = i128::try_from(wei)
        .map_err(|e| RpcError::Decode(format!("balance {wei} out of range: {e}")))?;
    Decimal::try_from_i128_with_scale(mantissa, WEI_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|e| RpcError::Decode(format!("balance {wei} out of range: {e}")))
}

/// Raw facts about a wallet, fetched fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub address: Address,
    pub transaction_count: u64,
    /// Native balance in ether.
    pub balance: Decimal,
    pub first_transaction_date: FirstActivity,
    pub asset_count: u64,
    pub networks: u32,
}

/// Approximate per-month transaction counts, oldest month first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySeries {
    pub labels: [String; MONTHS_IN_SERIES],
    pub values: [u64; MONTHS_IN_SERIES],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraitName {
    Trader,
    Holder,
    ActiveUser,
}

impl TraitName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trader => "Trader",
            Self::Holder => "Holder",
            Self::ActiveUser => "Active User",
        }
    }
}

impl Serialize for TraitName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletTrait {
    pub name: TraitName,
    /// 0..=100
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaTitle {
    ActiveTrader,
    RegularUser,
    CasualParticipant,
    NewExplorer,
}

impl PersonaTitle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveTrader => "Active Trader",
            Self::RegularUser => "Regular User",
            Self::CasualParticipant => "Casual Participant",
            Self::NewExplorer => "New Explorer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ActiveTrader => {
                "A frequent participant in blockchain transactions with significant activity."
            }
            Self::RegularUser => "An established Web3 user with consistent blockchain activity.",
            Self::CasualParticipant => {
                "Beginning to explore Web3 with growing engagement in blockchain activities."
            }
            Self::NewExplorer => {
                "A newcomer to Web3, taking their first steps into blockchain technology."
            }
        }
    }
}

impl Serialize for PersonaTitle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletStats {
    pub transactions: u64,
    pub assets: u64,
    pub networks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPersona {
    pub title: PersonaTitle,
    pub description: String,
    pub primary_trait: TraitName,
    /// Always Trader, Holder, Active User in that order.
    pub traits: [WalletTrait; 3],
    pub first_transaction_date: FirstActivity,
    pub stats: WalletStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBand {
    Healthy,
    Fair,
    AtRisk,
}

impl HealthBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Fair => "fair",
            Self::AtRisk => "at_risk",
        }
    }
}

impl Serialize for HealthBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletBio {
    pub handle: String,
    pub bio: String,
}

/// Everything the dashboard shows for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletReport {
    pub address: Address,
    pub snapshot: WalletSnapshot,
    pub persona: WalletPersona,
    pub activity: ActivitySeries,
    pub risk_score: u8,
    pub health: HealthBand,
    pub recommendations: Vec<&'static str>,
    pub bio: WalletBio,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_first_activity_formats_us_short_date() {
        // 2016-01-05T12:00:00Z
        let first = FirstActivity::from_unix_secs(1_451_995_200);
        assert_eq!(first.to_string(), "Jan 5, 2016");
        assert_eq!(FirstActivity::Unknown.to_string(), "Unknown");
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            "\"Jan 5, 2016\"".to_string()
        );
    }

    #[test]
    fn test_wei_to_ether() {
        assert_eq!(wei_to_ether(0).unwrap(), Decimal::ZERO);
        assert_eq!(
            wei_to_ether(1_500_000_000_000_000_000).unwrap(),
            Decimal::from_str("1.5").unwrap()
        );
        assert_eq!(wei_to_ether(1).unwrap().to_string(), "0.000000000000000001");
        assert!(wei_to_ether(u128::MAX).is_err());
    }

    #[test]
    fn test_trait_and_title_serialize_as_labels() {
        assert_eq!(
            serde_json::to_string(&TraitName::ActiveUser).unwrap(),
            "\"Active User\""
        );
        assert_eq!(
            serde_json::to_string(&PersonaTitle::CasualParticipant).unwrap(),
            "\"Casual Participant\""
        );
    }
}
