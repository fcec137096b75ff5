//! Voting rounds and their lifecycle.

use prime_types::{AccountId, Timestamp, TokenAmount, VoteId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::VotingError;

/// A ballot choice. `None` exists as the zero value of the wire encoding and
/// is never a valid ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStatus {
    None,
    Accept,
    Reject,
}

impl VoteStatus {
    /// Decode the numeric status used on the wire: 0 = none, 1 = accept,
    /// 2 = reject.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Accept),
            2 => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn is_ballot(&self) -> bool {
        matches!(self, Self::Accept | Self::Reject)
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Accept => "accept",
            Self::Reject => "reject",
        })
    }
}

impl FromStr for VoteStatus {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(VotingError::InvalidVoteStatus(other.to_string())),
        }
    }
}

/// Frozen result of an executed vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Turnout did not clear the participation floor.
    NotApplied,
    Accept,
    Reject,
}

impl fmt::Display for VoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotApplied => "not_applied",
            Self::Accept => "accept",
            Self::Reject => "reject",
        })
    }
}

/// Where a vote is in its lifecycle: Open → Expired → Executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    /// Inside the window; ballots accepted.
    Open,
    /// Window closed, not yet executed.
    Expired,
    /// Terminal.
    Executed,
}

/// One voting round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    /// The staker who opened the vote.
    pub creator: AccountId,
    pub created_at: Timestamp,
    /// Window length in seconds.
    pub duration: u64,
    pub description: String,
    pub executed: bool,
    pub total_accepted: TokenAmount,
    pub total_rejected: TokenAmount,
    /// Reference supply sampled at execution; zero before.
    pub total_supply: TokenAmount,
    pub outcome: Option<VoteOutcome>,
    /// Accounts that have cast a ballot.
    pub voters: BTreeSet<AccountId>,
}

impl Vote {
    pub(crate) fn new(
        id: VoteId,
        creator: AccountId,
        created_at: Timestamp,
        duration: u64,
        description: String,
    ) -> Self {
        Self {
            id,
            creator,
            created_at,
            duration,
            description,
            executed: false,
            total_accepted: TokenAmount::ZERO,
            total_rejected: TokenAmount::ZERO,
            total_supply: TokenAmount::ZERO,
            outcome: None,
            voters: BTreeSet::new(),
        }
    }

    /// Last instant at which ballots are still accepted.
    pub fn ends_at(&self) -> Timestamp {
        self.created_at.saturating_add_secs(self.duration)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.created_at.is_past(self.duration, now)
    }

    pub fn state(&self, now: Timestamp) -> VoteState {
        if self.executed {
            VoteState::Executed
        } else if self.is_expired(now) {
            VoteState::Expired
        } else {
            VoteState::Open
        }
    }

    pub fn has_voted(&self, account: &AccountId) -> bool {
        self.voters.contains(account)
    }

    /// Combined ballot weight on both sides.
    pub fn turnout(&self) -> TokenAmount {
        self.total_accepted.saturating_add(self.total_rejected)
    }
}
