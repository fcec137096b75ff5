//! Abstract collaborator traits for the voting machine.
//!
//! The stake-weight token (an AMM pool token) and the reference supply live
//! outside this workspace. The machine depends only on these traits; tests
//! and the simulator plug in the in-memory doubles from `prime-nullables`.

pub mod error;

pub use error::TokenError;

use prime_types::{AccountId, TokenAmount};

/// An ERC-20 style token whose balances carry voting weight.
///
/// Every method takes `&self`: implementations guard their own state, and
/// each transfer must apply fully or not at all.
pub trait StakeToken: Send + Sync {
    /// The token's own handle.
    fn address(&self) -> AccountId;

    fn balance_of(&self, owner: &AccountId) -> TokenAmount;

    /// How much `spender` may still pull from `owner`.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> TokenAmount;

    /// Pull `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), TokenError>;

    /// Push `amount` from `from` (the caller's own holdings) to `to`.
    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), TokenError>;
}

/// A total-supply-like value sampled when a vote is executed.
pub trait SupplyReference: Send + Sync {
    fn total_supply(&self) -> TokenAmount;
}
