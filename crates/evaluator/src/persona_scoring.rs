use common::types::{
    PersonaTitle, TraitName, WalletPersona, WalletSnapshot, WalletStats, WalletTrait,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const MAX_LEVEL: u64 = 100;

/// Transactions at which the Trader trait saturates.
pub const TRADER_FULL_TX: u64 = 50;
/// Transactions at which the Active User trait saturates.
pub const ACTIVE_FULL_TX: u64 = 20;
/// Ether balance at which the Holder trait saturates.
pub const HOLDER_FULL_ETHER: Decimal = Decimal::ONE;

fn tx_level(transaction_count: u64, full_at: u64) -> u8 {
    // floor(t / full * 100), exact in integers.
    let level = u128::from(transaction_count) * 100 / u128::from(full_at);
    level.min(u128::from(MAX_LEVEL)) as u8
}

pub fn trader_level(transaction_count: u64) -> u8 {
    tx_level(transaction_count, TRADER_FULL_TX)
}

pub fn active_user_level(transaction_count: u64) -> u8 {
    tx_level(transaction_count, ACTIVE_FULL_TX)
}

pub fn holder_level(balance_ether: Decimal) -> u8 {
    if balance_ether.is_sign_negative() {
        return 0;
    }
    let scaled = (balance_ether / HOLDER_FULL_ETHER)
        .checked_mul(Decimal::ONE_HUNDRED)
        .map_or(MAX_LEVEL, |d| d.floor().to_u64().unwrap_or(MAX_LEVEL));
    scaled.min(MAX_LEVEL) as u8
}

/// Trader, Holder, Active User, always in that order.
pub fn trait_levels(transaction_count: u64, balance_ether: Decimal) -> [WalletTrait; 3] {
    [
        WalletTrait {
            name: TraitName::Trader,
            level: trader_level(transaction_count),
        },
        WalletTrait {
            name: TraitName::Holder,
            level: holder_level(balance_ether),
        },
        WalletTrait {
            name: TraitName::ActiveUser,
            level: active_user_level(transaction_count),
        },
    ]
}

/// Highest-level trait; ties go to the earliest trait in order.
pub fn primary_trait(traits: &[WalletTrait; 3]) -> TraitName {
    traits
        .iter()
        .skip(1)
        .fold(traits[0], |best, t| if t.level > best.level { *t } else { best })
        .name
}

pub fn persona_title(transaction_count: u64) -> PersonaTitle {
    match transaction_count {
        t if t > 50 => PersonaTitle::ActiveTrader,
        t if t > 20 => PersonaTitle::RegularUser,
        t if t > 5 => PersonaTitle::CasualParticipant,
        _ => PersonaTitle::NewExplorer,
    }
}

pub fn score_persona(snapshot: &WalletSnapshot) -> WalletPersona {
    let traits = trait_levels(snapshot.transaction_count, snapshot.balance);
    let title = persona_title(snapshot.transaction_count);
    WalletPersona {
        title,
        description: title.description().to_string(),
        primary_trait: primary_trait(&traits),
        traits,
        first_transaction_date: snapshot.first_transaction_date,
        stats: WalletStats {
            transactions: snapshot.transaction_count,
            assets: snapshot.asset_count,
            networks: snapshot.networks,
        },
    }
}
