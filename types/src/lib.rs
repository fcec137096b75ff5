//! Fundamental types for the stake-weighted voting machine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identifiers, token amounts, timestamps and the injectable clock.

pub mod address;
pub mod amount;
pub mod error;
pub mod time;

pub use address::AccountId;
pub use amount::{TokenAmount, TOKEN_UNIT};
pub use error::TypesError;
pub use time::{Clock, SystemClock, Timestamp, SECONDS_PER_DAY};

/// Sequential identifier of a voting round, starting at 0.
pub type VoteId = u64;
