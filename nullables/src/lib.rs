//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the voting machine (clock, stake-weight
//! token, reference supply) is abstracted behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod clock;
pub mod token;

pub use clock::NullClock;
pub use token::NullToken;
