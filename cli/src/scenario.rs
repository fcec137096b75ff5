//! Scenario files: a pool fixture, funded accounts and a list of steps
//! replayed against a fresh in-memory voting machine.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use prime_governance::{VoteOutcome, VoteStatus, VotingConfig, VotingError, VotingEvent, VotingMachine};
use prime_nullables::{NullClock, NullToken};
use prime_token::StakeToken;
use prime_types::{AccountId, Clock, TokenAmount, VoteId};
use prime_utils::{format_duration, LogFormat};
use serde::Deserialize;

/// A whole scenario file.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub log: LogSection,
    #[serde(default)]
    pub machine: VotingConfig,
    pub pool: PoolSection,
    #[serde(default)]
    pub accounts: Vec<AccountSection>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct LogSection {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The stake-weight pool token and the machine's place on it.
#[derive(Debug, Deserialize)]
pub struct PoolSection {
    pub address: AccountId,
    pub custody: AccountId,
    /// Receives the whole initial supply.
    pub holder: AccountId,
    /// Initial supply in whole tokens.
    pub supply: u64,
    #[serde(default)]
    pub start_time: u64,
}

/// An account funded from the holder before the steps run.
#[derive(Debug, Deserialize)]
pub struct AccountSection {
    pub id: AccountId,
    /// Whole tokens transferred from the holder.
    #[serde(default)]
    pub fund: u64,
    /// Whole tokens approved for the custody account; defaults to `fund`.
    pub approve: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Taxonomy code the step must fail with, e.g. `"DuplicateVote"`.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Amounts are whole tokens; `vote` ids are the sequential vote ids.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Stake {
        account: AccountId,
        amount: u64,
    },
    Withdraw {
        account: AccountId,
        amount: u64,
    },
    Start {
        account: AccountId,
        days: u64,
        #[serde(default)]
        description: String,
    },
    Vote {
        account: AccountId,
        vote: VoteId,
        status: String,
    },
    Advance {
        #[serde(default)]
        days: u64,
        #[serde(default)]
        seconds: u64,
    },
    Execute {
        account: AccountId,
        vote: VoteId,
        expect: Option<VoteOutcome>,
    },
}

impl Scenario {
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let scenario: Self = toml::from_str(s).context("failed to parse scenario")?;
        scenario
            .machine
            .validate()
            .context("invalid [machine] section")?;
        Ok(scenario)
    }

    /// Replay the scenario and return every event the machine emitted.
    pub fn run(&self) -> anyhow::Result<Vec<VotingEvent>> {
        let pool = Arc::new(NullToken::with_supply(
            self.pool.address,
            self.pool.holder,
            TokenAmount::from_tokens(self.pool.supply.into()),
        ));
        let clock = Arc::new(NullClock::new(self.pool.start_time));
        let mut machine = VotingMachine::new(
            self.machine.clone(),
            self.pool.custody,
            pool.clone(),
            pool.clone(),
            clock.clone(),
        )?;

        for account in &self.accounts {
            let funded = TokenAmount::from_tokens(account.fund.into());
            if !funded.is_zero() {
                pool.transfer(&self.pool.holder, &account.id, funded)
                    .with_context(|| format!("failed to fund {}", account.id))?;
            }
            let approved = account.approve.unwrap_or(account.fund);
            pool.approve(
                &account.id,
                &self.pool.custody,
                TokenAmount::from_tokens(approved.into()),
            );
        }

        let mut events = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            let outcome = apply(&mut machine, &clock, &step.action);
            match (outcome, &step.expect_error) {
                (Ok(()), None) => {}
                (Ok(()), Some(code)) => {
                    bail!("step {index}: expected {code}, but the step succeeded")
                }
                (Err(StepError::Machine(err)), Some(code)) if err.code() == code => {
                    tracing::info!(step = index, code = err.code(), "step rejected as expected");
                }
                (Err(StepError::Machine(err)), _) => {
                    return Err(anyhow::Error::new(err).context(format!("step {index} failed")));
                }
                (Err(StepError::Unexpected(msg)), _) => bail!("step {index}: {msg}"),
            }
            events.extend(machine.drain_events());
        }

        for id in 0..machine.vote_count() {
            if let Some(vote) = machine.get_vote(id) {
                tracing::info!(
                    voting_id = id,
                    window = %format_duration(vote.duration),
                    accepted = %vote.total_accepted,
                    rejected = %vote.total_rejected,
                    state = ?vote.state(clock.now()),
                    "vote summary"
                );
            }
        }
        Ok(events)
    }
}

enum StepError {
    Machine(VotingError),
    Unexpected(String),
}

impl From<VotingError> for StepError {
    fn from(err: VotingError) -> Self {
        Self::Machine(err)
    }
}

fn apply(machine: &mut VotingMachine, clock: &NullClock, action: &Action) -> Result<(), StepError> {
    match action {
        Action::Stake { account, amount } => {
            machine.stake(account, TokenAmount::from_tokens((*amount).into()))?;
        }
        Action::Withdraw { account, amount } => {
            machine.withdraw(account, TokenAmount::from_tokens((*amount).into()))?;
        }
        Action::Start {
            account,
            days,
            description,
        } => {
            machine.start_voting(account, *days, description.as_str())?;
        }
        Action::Vote {
            account,
            vote,
            status,
        } => {
            // An unknown vote id must still report VoteNotFound first.
            if machine.get_vote(*vote).is_none() {
                return Err(VotingError::VoteNotFound(*vote).into());
            }
            let status: VoteStatus = status.parse()?;
            machine.vote(account, *vote, status)?;
        }
        Action::Advance { days, seconds } => {
            let secs = days
                .checked_mul(machine.config().seconds_per_day)
                .and_then(|d| d.checked_add(*seconds))
                .ok_or_else(|| StepError::Unexpected(format!("advancing {days}d {seconds}s overflows")))?;
            let now = clock.advance(secs).ok_or_else(|| {
                StepError::Unexpected(format!("advancing {secs}s past {} overflows the clock", clock.now()))
            })?;
            tracing::debug!(%now, "clock advanced");
        }
        Action::Execute {
            account,
            vote,
            expect,
        } => {
            let result = machine.execute_voting(account, *vote)?;
            if let Some(expected) = expect {
                if *expected != result {
                    return Err(StepError::Unexpected(format!(
                        "vote {vote} resolved {result}, expected {expected}"
                    )));
                }
            }
        }
    }
    Ok(())
}
