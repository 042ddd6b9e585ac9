//! Escrows created by executed proposals
//!
//! A withdrawal escrow is split pro rata between members, one claim each.
//! A vesting escrow pays a single receiver period by period after a cliff.

use anchor_lang::prelude::*;

use crate::error::{DaoError, DaoResult};
use crate::math;
use crate::state::{StakeRatio, VestingSchedule};

#[account]
#[derive(InitSpace)]
pub struct WithdrawalRelease {
    pub dao: Pubkey,
    pub proposal_index: u64,
    /// Lamports moved out of the treasury at execution
    pub escrow_total: u64,
    pub claimed_total: u64,
    pub claims_count: u32,
    /// Set once no unclaimed stake can receive a nonzero share
    pub exhausted: bool,
    /// Withdrawal epoch opened by this execution
    pub epoch: u64,
    /// DAO financial power at execution; the split denominator
    pub financial_power: u64,
    /// Execution-time deposits of the members who have claimed
    pub claimed_stake: u64,
    /// Truncation remainder returned to the treasury on exhaustion
    pub swept_dust: u64,
    pub created_at: i64,
    pub bump: u8,
}

impl WithdrawalRelease {
    pub fn new(
        dao: Pubkey,
        proposal_index: u64,
        escrow_total: u64,
        epoch: u64,
        financial_power: u64,
        now: i64,
        bump: u8,
    ) -> Self {
        Self {
            dao,
            proposal_index,
            escrow_total,
            claimed_total: 0,
            claims_count: 0,
            exhausted: false,
            epoch,
            financial_power,
            claimed_stake: 0,
            swept_dust: 0,
            created_at: now,
            bump,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.escrow_total
            .saturating_sub(self.claimed_total)
            .saturating_sub(self.swept_dust)
    }

    /// Stake of a member who held `deposit` when the escrow was created.
    pub fn stake_of(&self, deposit: u64) -> StakeRatio {
        StakeRatio {
            deposit,
            total: self.financial_power,
        }
    }

    /// `escrow_total * deposit / financial_power`, truncated.
    pub fn claim_amount(&self, deposit: u64) -> DaoResult<u64> {
        self.stake_of(deposit).share_of(self.escrow_total)
    }

    /// Books the claim of a member who held `deposit` at execution and
    /// returns the payout.
    pub fn claim(&mut self, deposit: u64) -> DaoResult<u64> {
        let amount = self.claim_amount(deposit)?;
        if amount == 0 {
            return Err(DaoError::NothingToClaim);
        }
        if amount > self.remaining() {
            return Err(DaoError::InsufficientEscrow);
        }

        let claimed_total = math::add(self.claimed_total, amount)?;
        let claimed_stake = math::add(self.claimed_stake, deposit)?;
        let claims_count = self
            .claims_count
            .checked_add(1)
            .ok_or(DaoError::ArithmeticOverflow)?;
        // every later share is at most the share of all unclaimed stake
        let unclaimed = math::sub(self.financial_power, claimed_stake)?;
        let outstanding = math::mul_div(self.escrow_total, unclaimed, self.financial_power)?;

        self.claimed_total = claimed_total;
        self.claimed_stake = claimed_stake;
        self.claims_count = claims_count;
        self.exhausted = outstanding == 0;
        Ok(amount)
    }

    /// Releases what an exhausted escrow still holds. Zero before exhaustion.
    pub fn sweep_dust(&mut self) -> u64 {
        if !self.exhausted {
            return 0;
        }
        let dust = self.remaining();
        self.swept_dust = self.swept_dust.saturating_add(dust);
        dust
    }
}

/// One member's consumed withdrawal claim. Its existence blocks a second one.
#[account]
#[derive(InitSpace)]
pub struct WithdrawalRecord {
    pub dao: Pubkey,
    pub proposal_index: u64,
    pub wallet: Pubkey,
    pub amount: u64,
    pub claimed_at: i64,
    pub bump: u8,
}

/// Claim bookkeeping of the vesting receiver.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VestingRecord {
    pub claimed: u64,
    pub last_claim_at: i64,
    pub claims_count: u32,
}

#[account]
#[derive(InitSpace)]
pub struct VestingRelease {
    pub dao: Pubkey,
    pub proposal_index: u64,
    pub schedule: VestingSchedule,
    /// Execution time plus the cliff; nothing vests before it
    pub cliff_end: i64,
    pub record: VestingRecord,
    pub exhausted: bool,
    pub bump: u8,
}

impl VestingRelease {
    pub fn new(
        dao: Pubkey,
        proposal_index: u64,
        schedule: VestingSchedule,
        executed_at: i64,
        bump: u8,
    ) -> DaoResult<Self> {
        let cliff_end = math::add_seconds(executed_at, schedule.cliff)?;
        Ok(Self {
            dao,
            proposal_index,
            schedule,
            cliff_end,
            record: VestingRecord::default(),
            exhausted: false,
            bump,
        })
    }

    /// Whole periods elapsed since the cliff ended.
    pub fn elapsed_periods(&self, now: i64) -> DaoResult<u64> {
        if now < self.cliff_end || self.schedule.period <= 0 {
            return Ok(0);
        }
        let elapsed = now
            .checked_sub(self.cliff_end)
            .ok_or(DaoError::ArithmeticOverflow)?;
        Ok((elapsed / self.schedule.period) as u64)
    }

    /// Cumulative amount vested at `now`, capped at the schedule total.
    pub fn vested_total(&self, now: i64) -> DaoResult<u64> {
        let vested = (self.elapsed_periods(now)? as u128)
            * (self.schedule.amount_per_period as u128);
        Ok(vested.min(self.schedule.total_amount as u128) as u64)
    }

    pub fn claimable(&self, now: i64) -> DaoResult<u64> {
        Ok(self.vested_total(now)?.saturating_sub(self.record.claimed))
    }

    /// Pays out everything vested and not yet claimed.
    pub fn claim(&mut self, signer: &Pubkey, now: i64) -> DaoResult<u64> {
        if self.schedule.receiver != *signer {
            return Err(DaoError::Unauthorized);
        }
        if now < self.cliff_end {
            return Err(DaoError::NothingToClaim);
        }
        let amount = self.claimable(now)?;
        if amount == 0 {
            return Err(DaoError::NothingToClaim);
        }

        let claimed = math::add(self.record.claimed, amount)?;
        let claims_count = self
            .record
            .claims_count
            .checked_add(1)
            .ok_or(DaoError::ArithmeticOverflow)?;

        self.record = VestingRecord {
            claimed,
            last_claim_at: now,
            claims_count,
        };
        self.exhausted = claimed == self.schedule.total_amount;
        Ok(amount)
    }
}
