//! Token amount type for the stake-weight token.
//!
//! Amounts are fixed-point integers (u128) in the token's minor unit, 18
//! decimals, to avoid floating-point errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw units per whole token (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// An amount of the stake-weight token, in raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Convert whole tokens to raw units (saturating).
    pub fn from_tokens(units: u128) -> Self {
        Self(units.saturating_mul(TOKEN_UNIT))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// `floor(self * bps / 10_000)` without overflowing for any `bps <= 10_000`.
    pub fn mul_bps(self, bps: u32) -> Self {
        let bps = bps as u128;
        Self((self.0 / 10_000) * bps + (self.0 % 10_000) * bps / 10_000)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
