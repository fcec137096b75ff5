//! Stake-weighted voting machine.
//!
//! Stakers lock stake-weight (pool) tokens with the machine. Any staker may
//! open a time-boxed vote; every account casts at most one ballot per vote,
//! weighted by its stake at the moment it votes. Once the window has closed
//! anyone may execute the vote, which samples the reference supply and
//! freezes one of three outcomes: Accept, Reject or NotApplied.
//!
//! Key principle: voting power is live stake, not a snapshot.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod outcome;
pub mod vote;

pub use config::{ConfigError, VotingConfig};
pub use engine::VotingMachine;
pub use error::VotingError;
pub use event::VotingEvent;
pub use outcome::{decide, participation_floor, BPS_DENOMINATOR};
pub use vote::{Vote, VoteOutcome, VoteState, VoteStatus};
