//! Events appended by the voting machine, in commit order.

use prime_types::{AccountId, TokenAmount, VoteId};
use serde::{Deserialize, Serialize};

use crate::vote::{VoteOutcome, VoteStatus};

/// Externally observable record of a committed operation.
///
/// The machine only appends; a rejected call appends nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum VotingEvent {
    Staked {
        user: AccountId,
        amount: TokenAmount,
    },
    Withdrawn {
        user: AccountId,
        amount: TokenAmount,
    },
    VoteStarted {
        voting_id: VoteId,
    },
    VotePlaced {
        voting_id: VoteId,
        voter: AccountId,
        status: VoteStatus,
        weight: TokenAmount,
    },
    VotingExecuted {
        voting_id: VoteId,
        result: VoteOutcome,
    },
}

impl VotingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Staked { .. } => "Staked",
            Self::Withdrawn { .. } => "Withdrawn",
            Self::VoteStarted { .. } => "VoteStarted",
            Self::VotePlaced { .. } => "VotePlaced",
            Self::VotingExecuted { .. } => "VotingExecuted",
        }
    }
}
