//! Cosmetic extras shown next to a persona: health score, dApp picks, and a
//! social handle. All deterministic lookups.

use common::address::Address;
use common::types::{HealthBand, PersonaTitle, TraitName, WalletBio, WalletSnapshot};

/// Starts at 100; young wallets and wallets with few assets lose points.
pub fn risk_score(snapshot: &WalletSnapshot) -> u8 {
    let mut score: i32 = 100;
    if snapshot.transaction_count < 3 {
        score -= 30;
    }
    if snapshot.asset_count < 2 {
        score -= 20;
    }
    score.clamp(0, 100) as u8
}

pub fn health_band(score: u8) -> HealthBand {
    match score {
        s if s > 80 => HealthBand::Healthy,
        s if s > 60 => HealthBand::Fair,
        _ => HealthBand::AtRisk,
    }
}

pub fn recommendations(primary: TraitName) -> &'static [&'static str] {
    match primary {
        TraitName::Trader => &["Uniswap", "Aave", "dYdX"],
        TraitName::Holder => &["Zapper", "Argent Wallet"],
        TraitName::ActiveUser => &["Snapshot", "Gitcoin"],
    }
}

fn bio_style(label: &str) -> (&'static str, &'static str) {
    match label {
        "Active Trader" => ("Rocket", "🚀"),
        "Trader" => ("Trader", "💹"),
        "Holder" => ("Holder", "🪙"),
        "Active User" => ("Active", "⚡"),
        "Casual Participant" => ("Sprout", "🌱"),
        "Regular User" => ("Chainer", "🔗"),
        _ => ("Explorer", "🧭"),
    }
}

/// Handle and one-line bio keyed on a persona title or trait name.
pub fn generate_bio(address: &Address, label: &str) -> WalletBio {
    let (style, emoji) = bio_style(label);
    let short = &address.as_str()[2..6];
    WalletBio {
        handle: format!("@{style}_{short}"),
        bio: format!("{emoji} {style} making moves on-chain. Follow for alpha & vibes!"),
    }
}

pub fn persona_bio(address: &Address, title: PersonaTitle) -> WalletBio {
    generate_bio(address, title.as_str())
}
