use std::fmt;
use std::str::FromStr;

use ethers::types::H160;
use ethers::utils::to_checksum;
use serde::{Serialize, Serializer};

use crate::error::PersonaError;

/// A validated 20-byte Ethereum account address.
///
/// Accepts a lowercase `0x` followed by 40 hex digits. All-lowercase and
/// all-uppercase digits are taken as-is; mixed-case digits must carry a
/// valid EIP-55 checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    inner: H160,
    /// Lowercase, `0x`-prefixed.
    lower: String,
}

impl Address {
    pub fn parse(input: &str) -> Result<Self, PersonaError> {
        let trimmed = input.trim();
        let invalid = || PersonaError::InvalidAddress(trimmed.to_string());

        let hex_part = trimmed.strip_prefix("0x").ok_or_else(invalid)?;
        if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let inner = H160::from_str(hex_part).map_err(|_bad_hex| invalid())?;

        let has_lower = hex_part.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = hex_part.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && to_checksum(&inner, None) != trimmed {
            return Err(invalid());
        }

        Ok(Self {
            inner,
            lower: format!("{inner:#x}"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.lower
    }

    /// The address as the RPC layer takes it.
    pub fn h160(&self) -> H160 {
        self.inner
    }

    /// EIP-55 mixed-case rendering.
    pub fn to_checksum(&self) -> String {
        to_checksum(&self.inner, None)
    }

    /// `0x1234...abcd` form for compact display.
    pub fn truncated(&self) -> String {
        format!("{}...{}", &self.lower[..6], &self.lower[self.lower.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lower)
    }
}

impl FromStr for Address {
    type Err = PersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}
