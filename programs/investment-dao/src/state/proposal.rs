//! Proposals, their voting state machine and vote records
//!
//! ```text
//! Active ──yes ≥ threshold──▶ Passed ──execute──▶ Executed
//!   │ ──no ≥ threshold───▶ Rejected
//!   └──now > deadline────▶ Expired
//! ```
//!
//! Expiry is lazy: nothing fires at the deadline itself. Any path that looks
//! at an `Active` proposal after its deadline treats it as `Expired`.

use anchor_lang::prelude::*;

use crate::error::{DaoError, DaoResult};
use crate::math;

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalKind {
    Withdrawal,
    Investing,
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalState {
    Active,
    Passed,
    Rejected,
    Expired,
    Executed,
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOption {
    Yes,
    No,
}

/// Payout plan of an investing proposal. Durations are in seconds.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VestingSchedule {
    pub receiver: Pubkey,
    pub total_amount: u64,
    pub amount_per_period: u64,
    pub period: i64,
    /// Delay between execution and the start of the first period
    pub cliff: i64,
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalPayload {
    Withdrawal { amount: u64 },
    Investing { schedule: VestingSchedule },
}

impl ProposalPayload {
    /// Assembles a payload from loosely-typed instruction arguments.
    pub fn from_parts(
        kind: ProposalKind,
        withdraw_amount: Option<u64>,
        schedule: Option<VestingSchedule>,
    ) -> DaoResult<Self> {
        let payload = match (kind, withdraw_amount, schedule) {
            (ProposalKind::Withdrawal, Some(amount), None) => Self::Withdrawal { amount },
            (ProposalKind::Investing, None, Some(schedule)) => Self::Investing { schedule },
            _ => return Err(DaoError::InvalidPayload),
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn kind(&self) -> ProposalKind {
        match self {
            Self::Withdrawal { .. } => ProposalKind::Withdrawal,
            Self::Investing { .. } => ProposalKind::Investing,
        }
    }

    pub fn validate(&self) -> DaoResult<()> {
        let valid = match self {
            Self::Withdrawal { amount } => *amount > 0,
            Self::Investing { schedule } => {
                schedule.total_amount > 0
                    && schedule.amount_per_period > 0
                    && schedule.amount_per_period <= schedule.total_amount
                    && schedule.period > 0
                    && schedule.cliff >= 0
            }
        };
        if !valid {
            return Err(DaoError::InvalidPayload);
        }
        Ok(())
    }
}

#[account]
#[derive(InitSpace)]
pub struct Proposal {
    pub dao: Pubkey,
    pub proposer: Pubkey,
    /// Position in the DAO's proposal sequence, immutable
    pub index: u64,
    #[max_len(32)]
    pub name: String,
    #[max_len(128)]
    pub description: String,
    pub payload: ProposalPayload,
    /// Yes-weight needed to pass, frozen at creation
    pub vote_threshold: u64,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub state: ProposalState,
    pub created_at: i64,
    /// Last instant at which votes are accepted
    pub deadline: i64,
    pub executed_at: i64,
    pub bump: u8,
}

/// Tally and timing handed back with a rejected proposal operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProposalSnapshot {
    pub index: u64,
    pub state: ProposalState,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub vote_threshold: u64,
    pub deadline: i64,
}

impl Proposal {
    pub fn kind(&self) -> ProposalKind {
        self.payload.kind()
    }

    /// State as seen at `now`, with lazy expiry applied.
    pub fn state_at(&self, now: i64) -> ProposalState {
        match self.state {
            ProposalState::Active if now > self.deadline => ProposalState::Expired,
            state => state,
        }
    }

    /// Persists lazy expiry. Returns whether the state changed.
    pub fn refresh(&mut self, now: i64) -> bool {
        let observed = self.state_at(now);
        let changed = observed != self.state;
        self.state = observed;
        changed
    }

    /// Explicit `Active → Expired` transition once the deadline has passed.
    pub fn expire(&mut self, now: i64) -> DaoResult<()> {
        match self.state_at(now) {
            ProposalState::Expired if self.state == ProposalState::Active => {
                self.state = ProposalState::Expired;
                Ok(())
            }
            ProposalState::Active => Err(DaoError::VotingStillOpen),
            _ => Err(DaoError::ProposalNotActive),
        }
    }

    pub fn ensure_active(&self, now: i64) -> DaoResult<()> {
        if self.state_at(now) != ProposalState::Active {
            return Err(DaoError::ProposalNotActive);
        }
        Ok(())
    }

    /// Adds `weight` to one side of the tally and tips the proposal once a
    /// side reaches the threshold. Yes is checked first.
    pub fn cast_vote(&mut self, option: VoteOption, weight: u64, now: i64) -> DaoResult<()> {
        self.ensure_active(now)?;

        match option {
            VoteOption::Yes => self.yes_votes = math::add(self.yes_votes, weight)?,
            VoteOption::No => self.no_votes = math::add(self.no_votes, weight)?,
        }

        if self.yes_votes >= self.vote_threshold {
            self.state = ProposalState::Passed;
        } else if self.no_votes >= self.vote_threshold {
            self.state = ProposalState::Rejected;
        }
        Ok(())
    }

    /// `Passed → Executed`, exactly once.
    pub fn begin_execution(&mut self, now: i64) -> DaoResult<()> {
        match self.state_at(now) {
            ProposalState::Passed => {
                self.state = ProposalState::Executed;
                self.executed_at = now;
                Ok(())
            }
            ProposalState::Executed => Err(DaoError::AlreadyExecuted),
            _ => Err(DaoError::NotPassed),
        }
    }

    pub fn snapshot(&self, now: i64) -> ProposalSnapshot {
        ProposalSnapshot {
            index: self.index,
            state: self.state_at(now),
            yes_votes: self.yes_votes,
            no_votes: self.no_votes,
            vote_threshold: self.vote_threshold,
            deadline: self.deadline,
        }
    }

    pub fn log_snapshot(&self, now: i64) {
        let snapshot = self.snapshot(now);
        msg!(
            "Proposal {} state {:?}: yes {} / no {} of threshold {}, deadline {}",
            snapshot.index,
            snapshot.state,
            snapshot.yes_votes,
            snapshot.no_votes,
            snapshot.vote_threshold,
            snapshot.deadline
        );
    }
}

/// Marks that `voter` has voted on a proposal. Its existence is the
/// double-vote guard.
#[account]
#[derive(InitSpace)]
pub struct VoteRecord {
    pub dao: Pubkey,
    pub proposal_index: u64,
    pub voter: Pubkey,
    pub option: VoteOption,
    pub weight: u64,
    pub voted_at: i64,
    pub bump: u8,
}
