//! Outcome rule: participation floor first, then simple majority.

use prime_types::TokenAmount;

use crate::vote::VoteOutcome;

/// Basis points denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Turnout a vote must exceed to count: `floor(supply * quorum_bps / 10_000)`.
pub fn participation_floor(total_supply: TokenAmount, quorum_bps: u32) -> TokenAmount {
    total_supply.mul_bps(quorum_bps.min(BPS_DENOMINATOR))
}

/// Decide the outcome of an executed vote.
///
/// NotApplied when the supply is zero or turnout is at or below the floor;
/// otherwise Accept on a strict accept majority, Reject on anything else
/// (ties included).
pub fn decide(
    total_accepted: TokenAmount,
    total_rejected: TokenAmount,
    total_supply: TokenAmount,
    quorum_bps: u32,
) -> VoteOutcome {
    let turnout = total_accepted.saturating_add(total_rejected);
    if total_supply.is_zero() || turnout <= participation_floor(total_supply, quorum_bps) {
        VoteOutcome::NotApplied
    } else if total_accepted > total_rejected {
        VoteOutcome::Accept
    } else {
        VoteOutcome::Reject
    }
}
