//! DAO identity, governance configuration and treasury

use anchor_lang::prelude::*;

use crate::constants::{DAO_SEED, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, PERCENT_DENOMINATOR};
use crate::error::{DaoError, DaoResult};
use crate::math;
use crate::state::{Proposal, ProposalPayload, ProposalState};

/// Voting rules fixed at DAO creation.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GovernanceConfig {
    /// Share of total financial power, in percent, needed to pass a proposal
    pub quorum_percent: u8,
    /// Voting window in seconds, counted from proposal creation
    pub max_voting_period: i64,
}

impl GovernanceConfig {
    pub fn validate(&self) -> DaoResult<()> {
        if !(1..=100).contains(&self.quorum_percent) || self.max_voting_period <= 0 {
            return Err(DaoError::InvalidConfig);
        }
        Ok(())
    }
}

/// A governed investment DAO.
#[account]
#[derive(InitSpace)]
pub struct Dao {
    /// Creator, the only wallet allowed to invite members
    pub authority: Pubkey,
    #[max_len(32)]
    pub name: String,
    pub config: GovernanceConfig,
    /// Next proposal index. Only ever incremented.
    pub proposals_count: u64,
    /// Accepted members, the authority included
    pub members_count: u32,
    pub deposits_count: u64,
    /// Sum of every member's `total_deposit_amount`
    pub total_financial_power: u64,
    /// Executed withdrawals so far. Deposits are checkpointed per epoch so
    /// each escrow splits by the deposits held when it was created.
    pub withdrawal_epoch: u64,
    pub created_at: i64,
    pub bump: u8,
    pub treasury_bump: u8,
}

/// What a proposer asks for.
#[derive(Clone, Debug)]
pub struct ProposalTerms {
    pub name: String,
    pub description: String,
    pub payload: ProposalPayload,
}

impl Dao {
    pub fn new(
        authority: Pubkey,
        name: String,
        config: GovernanceConfig,
        now: i64,
        bump: u8,
        treasury_bump: u8,
    ) -> DaoResult<Self> {
        if name.len() > MAX_NAME_LEN {
            return Err(DaoError::NameTooLong);
        }
        config.validate()?;

        Ok(Self {
            authority,
            name,
            config,
            proposals_count: 0,
            // the authority joins as the first accepted member
            members_count: 1,
            deposits_count: 0,
            total_financial_power: 0,
            withdrawal_epoch: 0,
            created_at: now,
            bump,
            treasury_bump,
        })
    }

    /// Address of the DAO account named `name`. The name must already be
    /// length-checked.
    pub fn address(name: &str) -> Pubkey {
        Pubkey::find_program_address(&[DAO_SEED, name.as_bytes()], &crate::ID).0
    }

    pub fn ensure_authority(&self, signer: &Pubkey) -> DaoResult<()> {
        if self.authority != *signer {
            return Err(DaoError::Unauthorized);
        }
        Ok(())
    }

    pub fn admit_member(&mut self) -> DaoResult<()> {
        self.members_count = self
            .members_count
            .checked_add(1)
            .ok_or(DaoError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn record_deposit(&mut self, amount: u64) -> DaoResult<()> {
        let total = math::add(self.total_financial_power, amount)?;
        let count = math::add(self.deposits_count, 1)?;
        self.total_financial_power = total;
        self.deposits_count = count;
        Ok(())
    }

    /// Starts the epoch of a withdrawal being executed and returns it.
    pub fn open_withdrawal_epoch(&mut self) -> DaoResult<u64> {
        self.withdrawal_epoch = math::add(self.withdrawal_epoch, 1)?;
        Ok(self.withdrawal_epoch)
    }

    /// `ceil(quorum% * total_financial_power)`, never below one so that an
    /// unfunded DAO cannot pass proposals with zero-weight votes.
    pub fn vote_threshold(&self) -> DaoResult<u64> {
        let threshold = math::mul_div_ceil(
            self.total_financial_power,
            self.config.quorum_percent as u64,
            PERCENT_DENOMINATOR,
        )?;
        Ok(threshold.max(1))
    }

    /// Builds the next proposal and consumes its index.
    ///
    /// The threshold is computed from the financial power at this instant and
    /// frozen into the proposal. `proposals_count` is bumped only after every
    /// check has passed.
    pub fn open_proposal(
        &mut self,
        dao: Pubkey,
        proposer: Pubkey,
        terms: ProposalTerms,
        now: i64,
        bump: u8,
    ) -> DaoResult<Proposal> {
        if terms.name.len() > MAX_NAME_LEN {
            return Err(DaoError::NameTooLong);
        }
        if terms.description.len() > MAX_DESCRIPTION_LEN {
            return Err(DaoError::DescriptionTooLong);
        }
        terms.payload.validate()?;

        let index = self.proposals_count;
        let next = math::add(index, 1)?;
        let vote_threshold = self.vote_threshold()?;
        let deadline = math::add_seconds(now, self.config.max_voting_period)?;

        let proposal = Proposal {
            dao,
            proposer,
            index,
            name: terms.name,
            description: terms.description,
            payload: terms.payload,
            vote_threshold,
            yes_votes: 0,
            no_votes: 0,
            state: ProposalState::Active,
            created_at: now,
            deadline,
            executed_at: 0,
            bump,
        };
        self.proposals_count = next;
        Ok(proposal)
    }
}

/// Program-owned account holding the DAO's lamports.
///
/// The treasury balance is this account's lamports above its rent reserve;
/// it is never copied into a data field.
#[account]
#[derive(InitSpace)]
pub struct Treasury {
    pub dao: Pubkey,
    pub bump: u8,
}
