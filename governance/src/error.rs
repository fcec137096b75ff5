use prime_types::{AccountId, TokenAmount, VoteId};
use thiserror::Error;

/// Every way a voting-machine call can be rejected.
///
/// A rejected call leaves the machine untouched. [`VotingError::code`] gives
/// the stable taxonomy name callers can match on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VotingError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient staked balance: subtraction overflow (requested {requested}, staked {available})")]
    InsufficientBalance {
        requested: TokenAmount,
        available: TokenAmount,
    },

    #[error("transfer not authorized: {reason}")]
    TransferNotAuthorized { reason: String },

    #[error("no stake present: only stakers can start a vote")]
    NoStakePresent,

    #[error("vote {0} not found")]
    VoteNotFound(VoteId),

    #[error("invalid vote status: {0}")]
    InvalidVoteStatus(String),

    #[error("{voter} has already voted on vote {voting_id}")]
    DuplicateVote { voting_id: VoteId, voter: AccountId },

    #[error("vote {0} is closed")]
    VotingClosed(VoteId),

    #[error("vote {0} is still open")]
    VotingStillOpen(VoteId),

    #[error("vote {0} has already been executed")]
    AlreadyExecuted(VoteId),

    #[error("description too long: {len} > {max} bytes")]
    InvalidDescription { len: usize, max: usize },

    #[error("arithmetic overflow in stake accounting")]
    Overflow,
}

impl VotingError {
    /// Stable taxonomy name of this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "InvalidConfiguration",
            Self::InvalidAmount => "InvalidAmount",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::TransferNotAuthorized { .. } => "TransferNotAuthorized",
            Self::NoStakePresent => "NoStakePresent",
            Self::VoteNotFound(_) => "VoteNotFound",
            Self::InvalidVoteStatus(_) => "InvalidVoteStatus",
            Self::DuplicateVote { .. } => "DuplicateVote",
            Self::VotingClosed(_) => "VotingClosed",
            Self::VotingStillOpen(_) => "VotingStillOpen",
            Self::AlreadyExecuted(_) => "AlreadyExecuted",
            Self::InvalidDescription { .. } => "InvalidDescription",
            Self::Overflow => "Overflow",
        }
    }
}
