//! Core ledger types: addresses, membership ids, assets, transfers.
//!
//! All amounts are `u128` in the smallest unit of the distributed asset.
//! Weights are `u32`; their sum is tracked as `u64`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// Amount of an asset, in its smallest unit.
pub type Amount = u128;

/// Entitlement of a single membership.
pub type Weight = u32;

/// Sum of all membership weights.
pub type TotalWeight = u64;

/// A 20-byte account handle.
///
/// Identifies members, asset sources and the ledger itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an Address from a byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic address with every byte set to `seed`.
    pub fn from_seed(seed: u8) -> Self {
        Self([seed; 20])
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| RegistryError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| RegistryError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Dense membership index, assigned from 0 in creation order.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct MembershipId(pub u8);

impl MembershipId {
    /// Position of this membership in the weight table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u8> for MembershipId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

/// The asset a ledger or distribution operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AssetId {
    /// The host's native currency, paid out by push payment.
    #[default]
    Native,
    /// A fungible token identified by its contract address.
    Token(Address),
}

impl AssetId {
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Token(addr) => write!(f, "{addr}"),
        }
    }
}

impl FromStr for AssetId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(Self::Native);
        }
        s.parse().map(Self::Token)
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One leg of an outbound asset movement.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub asset: AssetId,
    /// Account debited. For token legs where this differs from the spender,
    /// an allowance `from -> spender` is consumed.
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

/// Amount paid (or to be paid) to one membership.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub id: MembershipId,
    /// Owner of the membership at the time the payout was computed.
    pub owner: Address,
    pub amount: Amount,
}

/// Sum of payout amounts.
///
/// Payout totals are bounded by the distributed value, which is itself capped,
/// so the saturating add never saturates in practice.
pub fn payout_total(payouts: &[Payout]) -> Amount {
    payouts
        .iter()
        .fold(0u128, |acc, p| acc.saturating_add(p.amount))
}
