//! The voting machine: stake custody plus the vote lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use prime_token::{StakeToken, SupplyReference};
use prime_types::{AccountId, Clock, Timestamp, TokenAmount, VoteId};

use crate::config::VotingConfig;
use crate::error::VotingError;
use crate::event::VotingEvent;
use crate::outcome::decide;
use crate::vote::{Vote, VoteOutcome, VoteState, VoteStatus};

/// Custodies stake-weight tokens and runs stake-weighted votes over them.
///
/// Every mutating call takes `&mut self` and the explicit `caller`; a call
/// either commits fully (state, token movement, event) or returns an error
/// and leaves everything as it was.
pub struct VotingMachine {
    config: VotingConfig,
    /// Account that holds staked tokens on the token ledger.
    custody: AccountId,
    token: Arc<dyn StakeToken>,
    supply: Arc<dyn SupplyReference>,
    clock: Arc<dyn Clock>,
    balances: HashMap<AccountId, TokenAmount>,
    total_staked: TokenAmount,
    /// Indexed by vote id.
    votes: Vec<Vote>,
    events: Vec<VotingEvent>,
}

impl VotingMachine {
    /// Wire up a machine.
    ///
    /// `custody` is the machine's own account on the token ledger; the token
    /// must let it pull approved amounts via `transfer_from`.
    pub fn new(
        config: VotingConfig,
        custody: AccountId,
        token: Arc<dyn StakeToken>,
        supply: Arc<dyn SupplyReference>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VotingError> {
        config
            .validate()
            .map_err(|e| VotingError::InvalidConfiguration(e.to_string()))?;
        if token.address().is_zero() {
            return Err(VotingError::InvalidConfiguration(
                "stake-weight token address is zero".into(),
            ));
        }
        if custody.is_zero() {
            return Err(VotingError::InvalidConfiguration(
                "custody address is zero".into(),
            ));
        }
        tracing::info!(
            token = %token.address(),
            %custody,
            quorum_bps = config.quorum_bps,
            "voting machine ready"
        );
        Ok(Self {
            config,
            custody,
            token,
            supply,
            clock,
            balances: HashMap::new(),
            total_staked: TokenAmount::ZERO,
            votes: Vec::new(),
            events: Vec::new(),
        })
    }

    // ── Stake custody ──────────────────────────────────────────────────

    /// Pull `amount` from `caller` into custody and credit their stake.
    ///
    /// The caller must have approved the custody account on the token.
    pub fn stake(&mut self, caller: &AccountId, amount: TokenAmount) -> Result<(), VotingError> {
        if amount.is_zero() {
            return Err(VotingError::InvalidAmount);
        }
        let balance = self
            .balance_of(caller)
            .checked_add(amount)
            .ok_or(VotingError::Overflow)?;
        let total = self
            .total_staked
            .checked_add(amount)
            .ok_or(VotingError::Overflow)?;

        self.token
            .transfer_from(&self.custody, caller, &self.custody, amount)
            .map_err(|e| {
                tracing::warn!(user = %caller, %amount, error = %e, "stake transfer declined");
                VotingError::TransferNotAuthorized {
                    reason: e.to_string(),
                }
            })?;

        self.balances.insert(*caller, balance);
        self.total_staked = total;
        tracing::info!(user = %caller, %amount, staked = %balance, "staked");
        self.events.push(VotingEvent::Staked {
            user: *caller,
            amount,
        });
        Ok(())
    }

    /// Debit `amount` from `caller`'s stake and send the tokens back.
    pub fn withdraw(&mut self, caller: &AccountId, amount: TokenAmount) -> Result<(), VotingError> {
        if amount.is_zero() {
            return Err(VotingError::InvalidAmount);
        }
        let available = self.balance_of(caller);
        let balance = available
            .checked_sub(amount)
            .ok_or(VotingError::InsufficientBalance {
                requested: amount,
                available,
            })?;
        let total = self
            .total_staked
            .checked_sub(amount)
            .ok_or(VotingError::Overflow)?;

        self.token
            .transfer(&self.custody, caller, amount)
            .map_err(|e| {
                tracing::warn!(user = %caller, %amount, error = %e, "withdraw transfer declined");
                VotingError::TransferNotAuthorized {
                    reason: e.to_string(),
                }
            })?;

        if balance.is_zero() {
            self.balances.remove(caller);
        } else {
            self.balances.insert(*caller, balance);
        }
        self.total_staked = total;
        tracing::info!(user = %caller, %amount, staked = %balance, "withdrawn");
        self.events.push(VotingEvent::Withdrawn {
            user: *caller,
            amount,
        });
        Ok(())
    }

    // ── Vote lifecycle ─────────────────────────────────────────────────

    /// Open a new vote lasting `duration_days` voting days. Only stakers may
    /// open votes. Returns the new vote's id.
    pub fn start_voting(
        &mut self,
        caller: &AccountId,
        duration_days: u64,
        description: impl Into<String>,
    ) -> Result<VoteId, VotingError> {
        if self.balance_of(caller).is_zero() {
            return Err(VotingError::NoStakePresent);
        }
        let description = description.into();
        if description.len() > self.config.max_description_len {
            return Err(VotingError::InvalidDescription {
                len: description.len(),
                max: self.config.max_description_len,
            });
        }
        let duration = duration_days
            .checked_mul(self.config.seconds_per_day)
            .ok_or(VotingError::Overflow)?;

        let id = self.votes.len() as VoteId;
        let now = self.clock.now();
        self.votes
            .push(Vote::new(id, *caller, now, duration, description));
        tracing::info!(voting_id = id, creator = %caller, %now, duration, "vote started");
        self.events.push(VotingEvent::VoteStarted { voting_id: id });
        Ok(id)
    }

    /// Cast `caller`'s ballot on `voting_id`, weighted by their stake right now.
    ///
    /// Checks run in order: the vote exists, the status is a real ballot,
    /// the caller has not voted yet, the window is still open.
    pub fn vote(
        &mut self,
        caller: &AccountId,
        voting_id: VoteId,
        status: VoteStatus,
    ) -> Result<TokenAmount, VotingError> {
        let now = self.clock.now();
        let weight = self.balance_of(caller);
        let vote = usize::try_from(voting_id)
            .ok()
            .and_then(|index| self.votes.get_mut(index))
            .ok_or(VotingError::VoteNotFound(voting_id))?;
        if !status.is_ballot() {
            return Err(VotingError::InvalidVoteStatus(status.to_string()));
        }
        if vote.has_voted(caller) {
            return Err(VotingError::DuplicateVote {
                voting_id,
                voter: *caller,
            });
        }
        if vote.is_expired(now) {
            return Err(VotingError::VotingClosed(voting_id));
        }

        match status {
            VoteStatus::Accept => {
                vote.total_accepted = vote
                    .total_accepted
                    .checked_add(weight)
                    .ok_or(VotingError::Overflow)?;
            }
            VoteStatus::Reject => {
                vote.total_rejected = vote
                    .total_rejected
                    .checked_add(weight)
                    .ok_or(VotingError::Overflow)?;
            }
            VoteStatus::None => return Err(VotingError::InvalidVoteStatus(status.to_string())),
        }
        vote.voters.insert(*caller);

        tracing::debug!(voting_id, voter = %caller, %status, %weight, "ballot cast");
        self.events.push(VotingEvent::VotePlaced {
            voting_id,
            voter: *caller,
            status,
            weight,
        });
        Ok(weight)
    }

    /// Cast a ballot given as its numeric wire code (0 = none, 1 = accept,
    /// 2 = reject). Unknown codes fail with `InvalidVoteStatus`, after the
    /// existence check.
    pub fn vote_code(
        &mut self,
        caller: &AccountId,
        voting_id: VoteId,
        code: u8,
    ) -> Result<TokenAmount, VotingError> {
        if self.get_vote(voting_id).is_none() {
            return Err(VotingError::VoteNotFound(voting_id));
        }
        let status = VoteStatus::from_code(code)
            .ok_or_else(|| VotingError::InvalidVoteStatus(format!("code {code}")))?;
        self.vote(caller, voting_id, status)
    }

    /// Close `voting_id` for good: sample the reference supply and freeze
    /// the outcome. Anyone may call this once the window has passed.
    pub fn execute_voting(
        &mut self,
        caller: &AccountId,
        voting_id: VoteId,
    ) -> Result<VoteOutcome, VotingError> {
        let now = self.clock.now();
        let quorum_bps = self.config.quorum_bps;
        let vote = usize::try_from(voting_id)
            .ok()
            .and_then(|index| self.votes.get_mut(index))
            .ok_or(VotingError::VoteNotFound(voting_id))?;
        if !vote.is_expired(now) {
            return Err(VotingError::VotingStillOpen(voting_id));
        }
        if vote.executed {
            return Err(VotingError::AlreadyExecuted(voting_id));
        }

        let total_supply = self.supply.total_supply();
        let result = decide(
            vote.total_accepted,
            vote.total_rejected,
            total_supply,
            quorum_bps,
        );
        vote.total_supply = total_supply;
        vote.outcome = Some(result);
        vote.executed = true;

        tracing::info!(
            voting_id,
            executor = %caller,
            accepted = %vote.total_accepted,
            rejected = %vote.total_rejected,
            %total_supply,
            %result,
            "vote executed"
        );
        self.events.push(VotingEvent::VotingExecuted { voting_id, result });
        Ok(result)
    }

    // ── Read accessors ─────────────────────────────────────────────────

    pub fn config(&self) -> &VotingConfig {
        &self.config
    }

    /// The machine's custody account on the token ledger.
    pub fn custody(&self) -> AccountId {
        self.custody
    }

    /// Handle of the stake-weight token.
    pub fn balancer_pool(&self) -> AccountId {
        self.token.address()
    }

    /// Same handle as [`VotingMachine::balancer_pool`].
    pub fn balancer_lp_token(&self) -> AccountId {
        self.balancer_pool()
    }

    /// Current stake of `account` (zero if it never staked).
    pub fn balance_of(&self, account: &AccountId) -> TokenAmount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Sum of every account's stake.
    pub fn total_staked(&self) -> TokenAmount {
        self.total_staked
    }

    pub fn get_vote(&self, voting_id: VoteId) -> Option<&Vote> {
        usize::try_from(voting_id)
            .ok()
            .and_then(|index| self.votes.get(index))
    }

    pub fn vote_count(&self) -> u64 {
        self.votes.len() as u64
    }

    pub fn has_voted(&self, voting_id: VoteId, account: &AccountId) -> bool {
        self.get_vote(voting_id)
            .is_some_and(|vote| vote.has_voted(account))
    }

    pub fn vote_state(&self, voting_id: VoteId) -> Option<VoteState> {
        let now = self.clock.now();
        self.get_vote(voting_id).map(|vote| vote.state(now))
    }

    /// Frozen outcome, once executed.
    pub fn result(&self, voting_id: VoteId) -> Option<VoteOutcome> {
        self.get_vote(voting_id).and_then(|vote| vote.outcome)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Every event emitted so far, oldest first.
    pub fn events(&self) -> &[VotingEvent] {
        &self.events
    }

    /// Take the pending events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<VotingEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prime_nullables::{NullClock, NullToken};

    fn account(n: u64) -> AccountId {
        AccountId::from_low_u64_be(n)
    }

    fn amount(raw: u128) -> TokenAmount {
        TokenAmount::new(raw)
    }

    const POOL: u64 = 0xb0;
    const CUSTODY: u64 = 0xc0;

    struct Fixture {
        machine: VotingMachine,
        token: Arc<NullToken>,
        clock: Arc<NullClock>,
    }

    fn fixture() -> Fixture {
        let token = Arc::new(NullToken::with_supply(account(POOL), account(1), amount(200)));
        let clock = Arc::new(NullClock::new(1_600_560_000));
        let machine = VotingMachine::new(
            VotingConfig::default(),
            account(CUSTODY),
            token.clone(),
            token.clone(),
            clock.clone(),
        )
        .unwrap();
        Fixture {
            machine,
            token,
            clock,
        }
    }

    fn fund(f: &Fixture, who: u64, raw: u128) {
        f.token.transfer(&account(1), &account(who), amount(raw)).unwrap();
        f.token.approve(&account(who), &account(CUSTODY), amount(raw));
    }

    #[test]
    fn zero_token_address_rejected() {
        let token = Arc::new(NullToken::new(AccountId::ZERO));
        let err = VotingMachine::new(
            VotingConfig::default(),
            account(CUSTODY),
            token.clone(),
            token,
            Arc::new(NullClock::new(0)),
        )
        .err()
        .unwrap();
        assert_eq!(err.code(), "InvalidConfiguration");
    }

    #[test]
    fn zero_custody_rejected() {
        let token = Arc::new(NullToken::new(account(POOL)));
        let err = VotingMachine::new(
            VotingConfig::default(),
            AccountId::ZERO,
            token.clone(),
            token,
            Arc::new(NullClock::new(0)),
        )
        .err()
        .unwrap();
        assert_eq!(err.code(), "InvalidConfiguration");
    }

    #[test]
    fn invalid_config_rejected() {
        let token = Arc::new(NullToken::new(account(POOL)));
        let config = VotingConfig {
            quorum_bps: 20_000,
            ..VotingConfig::default()
        };
        let err = VotingMachine::new(config, account(CUSTODY), token.clone(), token, Arc::new(NullClock::new(0)))
            .err()
            .unwrap();
        assert!(matches!(err, VotingError::InvalidConfiguration(_)));
    }

    #[test]
    fn pool_accessors_agree() {
        let f = fixture();
        assert_eq!(f.machine.balancer_pool(), account(POOL));
        assert_eq!(f.machine.balancer_lp_token(), f.machine.balancer_pool());
    }

    #[test]
    fn stake_moves_tokens_into_custody() {
        let mut f = fixture();
        fund(&f, 2, 100);
        f.machine.stake(&account(2), amount(100)).unwrap();
        assert_eq!(f.machine.balance_of(&account(2)), amount(100));
        assert_eq!(f.token.balance_of(&account(CUSTODY)), amount(100));
        assert_eq!(f.token.balance_of(&account(2)), amount(0));
        assert_eq!(
            f.machine.events(),
            &[VotingEvent::Staked {
                user: account(2),
                amount: amount(100)
            }]
        );
    }

    #[test]
    fn stake_without_allowance_changes_nothing() {
        let mut f = fixture();
        f.token.transfer(&account(1), &account(2), amount(100)).unwrap();
        let err = f.machine.stake(&account(2), amount(100)).unwrap_err();
        assert_eq!(err.code(), "TransferNotAuthorized");
        assert_eq!(f.machine.balance_of(&account(2)), amount(0));
        assert_eq!(f.machine.total_staked(), amount(0));
        assert!(f.machine.events().is_empty());
    }

    #[test]
    fn stake_with_allowance_but_no_balance_is_not_authorized() {
        let mut f = fixture();
        f.token.approve(&account(5), &account(CUSTODY), amount(10));
        let err = f.machine.stake(&account(5), amount(10)).unwrap_err();
        assert_eq!(err.code(), "TransferNotAuthorized");
    }

    #[test]
    fn zero_amounts_rejected() {
        let mut f = fixture();
        assert_eq!(f.machine.stake(&account(2), amount(0)), Err(VotingError::InvalidAmount));
        assert_eq!(f.machine.withdraw(&account(2), amount(0)), Err(VotingError::InvalidAmount));
    }

    #[test]
    fn withdraw_returns_tokens() {
        let mut f = fixture();
        fund(&f, 2, 100);
        f.machine.stake(&account(2), amount(100)).unwrap();
        f.machine.withdraw(&account(2), amount(40)).unwrap();
        assert_eq!(f.machine.balance_of(&account(2)), amount(60));
        assert_eq!(f.token.balance_of(&account(2)), amount(40));
        assert_eq!(f.machine.total_staked(), amount(60));
        assert_eq!(f.machine.events().last().unwrap().name(), "Withdrawn");
    }

    #[test]
    fn over_withdraw_is_insufficient_balance() {
        let mut f = fixture();
        fund(&f, 2, 100);
        f.machine.stake(&account(2), amount(100)).unwrap();
        let err = f.machine.withdraw(&account(2), amount(101)).unwrap_err();
        assert_eq!(
            err,
            VotingError::InsufficientBalance {
                requested: amount(101),
                available: amount(100)
            }
        );
        assert_eq!(f.machine.balance_of(&account(2)), amount(100));
    }

    #[test]
    fn start_voting_requires_stake() {
        let mut f = fixture();
        assert_eq!(
            f.machine.start_voting(&account(2), 7, "no stake"),
            Err(VotingError::NoStakePresent)
        );
        assert_eq!(f.machine.vote_count(), 0);
    }

    #[test]
    fn vote_ids_are_sequential_from_zero() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        assert_eq!(f.machine.start_voting(&account(2), 7, "first").unwrap(), 0);
        assert_eq!(f.machine.start_voting(&account(2), 1, "second").unwrap(), 1);
        let vote = f.machine.get_vote(1).unwrap();
        assert_eq!(vote.duration, 86_400);
        assert_eq!(vote.description, "second");
        assert_eq!(vote.creator, account(2));
        assert_eq!(vote.created_at, f.clock.now());
    }

    #[test]
    fn overlong_description_rejected() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        let long = "x".repeat(1_025);
        assert_eq!(
            f.machine.start_voting(&account(2), 7, long).unwrap_err().code(),
            "InvalidDescription"
        );
    }

    #[test]
    fn vote_check_order() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        f.machine.start_voting(&account(2), 1, "order").unwrap();

        // Missing vote wins over a bad status.
        assert_eq!(
            f.machine.vote(&account(2), 9, VoteStatus::None).unwrap_err().code(),
            "VoteNotFound"
        );
        // Bad status wins over duplicate and closed.
        f.machine.vote(&account(2), 0, VoteStatus::Accept).unwrap();
        f.clock.advance_days(2);
        assert_eq!(
            f.machine.vote(&account(2), 0, VoteStatus::None).unwrap_err().code(),
            "InvalidVoteStatus"
        );
        // Duplicate wins over closed.
        assert_eq!(
            f.machine.vote(&account(2), 0, VoteStatus::Reject).unwrap_err().code(),
            "DuplicateVote"
        );
        assert_eq!(
            f.machine.vote(&account(3), 0, VoteStatus::Reject).unwrap_err().code(),
            "VotingClosed"
        );
    }

    #[test]
    fn out_of_range_ids_are_not_found() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        f.machine.start_voting(&account(2), 1, "ids").unwrap();
        for id in [1, 1 << 32, u64::MAX] {
            assert!(f.machine.get_vote(id).is_none());
            assert!(!f.machine.has_voted(id, &account(2)));
            assert_eq!(
                f.machine.vote(&account(2), id, VoteStatus::Accept).unwrap_err(),
                VotingError::VoteNotFound(id)
            );
            assert_eq!(
                f.machine.execute_voting(&account(2), id).unwrap_err(),
                VotingError::VoteNotFound(id)
            );
        }
        assert_eq!(f.machine.get_vote(0).unwrap().turnout(), TokenAmount::ZERO);
    }

    #[test]
    fn non_ballot_status_tallies_nothing() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        f.machine.start_voting(&account(2), 1, "none").unwrap();
        assert_eq!(
            f.machine.vote(&account(2), 0, VoteStatus::None).unwrap_err().code(),
            "InvalidVoteStatus"
        );
        let vote = f.machine.get_vote(0).unwrap();
        assert_eq!(vote.total_accepted, TokenAmount::ZERO);
        assert_eq!(vote.total_rejected, TokenAmount::ZERO);
        assert!(!vote.has_voted(&account(2)));
        assert_eq!(f.machine.events().len(), 2);
    }

    #[test]
    fn vote_code_decodes_wire_status() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        f.machine.start_voting(&account(2), 1, "codes").unwrap();
        assert_eq!(f.machine.vote_code(&account(2), 5, 7).unwrap_err().code(), "VoteNotFound");
        assert_eq!(f.machine.vote_code(&account(2), 0, 7).unwrap_err().code(), "InvalidVoteStatus");
        assert_eq!(f.machine.vote_code(&account(2), 0, 0).unwrap_err().code(), "InvalidVoteStatus");
        assert_eq!(f.machine.vote_code(&account(2), 0, 2).unwrap(), amount(10));
        assert_eq!(f.machine.get_vote(0).unwrap().total_rejected, amount(10));
    }

    #[test]
    fn zero_weight_ballot_still_blocks_revote() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        f.machine.start_voting(&account(2), 1, "zero").unwrap();

        assert_eq!(f.machine.vote(&account(3), 0, VoteStatus::Accept).unwrap(), amount(0));
        fund(&f, 3, 50);
        f.machine.stake(&account(3), amount(50)).unwrap();
        assert_eq!(
            f.machine.vote(&account(3), 0, VoteStatus::Accept).unwrap_err().code(),
            "DuplicateVote"
        );
        assert_eq!(f.machine.get_vote(0).unwrap().total_accepted, amount(0));
        assert!(f.machine.has_voted(0, &account(3)));
    }

    #[test]
    fn execution_lifecycle() {
        let mut f = fixture();
        fund(&f, 2, 100);
        f.machine.stake(&account(2), amount(100)).unwrap();
        f.machine.start_voting(&account(2), 7, "lifecycle").unwrap();
        f.machine.vote(&account(2), 0, VoteStatus::Accept).unwrap();
        assert_eq!(f.machine.vote_state(0), Some(VoteState::Open));

        assert_eq!(
            f.machine.execute_voting(&account(9), 0).unwrap_err().code(),
            "VotingStillOpen"
        );
        f.clock.advance_days(7);
        assert_eq!(f.machine.vote_state(0), Some(VoteState::Open));
        f.clock.advance(1);
        assert_eq!(f.machine.vote_state(0), Some(VoteState::Expired));

        assert_eq!(f.machine.execute_voting(&account(9), 0).unwrap(), VoteOutcome::Accept);
        assert_eq!(f.machine.vote_state(0), Some(VoteState::Executed));
        assert_eq!(f.machine.result(0), Some(VoteOutcome::Accept));
        assert_eq!(f.machine.get_vote(0).unwrap().total_supply, amount(200));
        assert_eq!(
            f.machine.execute_voting(&account(9), 0).unwrap_err().code(),
            "AlreadyExecuted"
        );
        assert_eq!(
            f.machine.execute_voting(&account(9), 1).unwrap_err().code(),
            "VoteNotFound"
        );
    }

    #[test]
    fn supply_is_sampled_at_execution() {
        let mut f = fixture();
        fund(&f, 2, 100);
        f.machine.stake(&account(2), amount(100)).unwrap();
        f.machine.start_voting(&account(2), 1, "dilution").unwrap();
        f.machine.vote(&account(2), 0, VoteStatus::Accept).unwrap();
        // 100 of 300 is below the 40% floor.
        f.token.mint(&account(7), amount(100)).unwrap();
        f.clock.advance_days(2);
        assert_eq!(f.machine.execute_voting(&account(2), 0).unwrap(), VoteOutcome::NotApplied);
        assert_eq!(f.machine.get_vote(0).unwrap().total_supply, amount(300));
    }

    #[test]
    fn drain_events_empties_log() {
        let mut f = fixture();
        fund(&f, 2, 10);
        f.machine.stake(&account(2), amount(10)).unwrap();
        f.machine.start_voting(&account(2), 1, "drain").unwrap();
        let drained = f.machine.drain_events();
        assert_eq!(drained.len(), 2);
        assert!(f.machine.events().is_empty());
    }
}
