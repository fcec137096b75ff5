//! Token-level errors.

use prime_types::TokenAmount;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance {
        needed: TokenAmount,
        approved: TokenAmount,
    },

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("transfer to the zero address")]
    ZeroAddress,

    #[error("arithmetic overflow in token accounting")]
    Overflow,
}
