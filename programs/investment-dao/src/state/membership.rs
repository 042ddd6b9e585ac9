//! Per-wallet membership and deposit ledger

use anchor_lang::prelude::*;

use crate::constants::BASIS_POINTS;
use crate::error::{DaoError, DaoResult};
use crate::math;

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipStatus {
    Invited,
    Accepted,
    Rejected,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvitationResponse {
    Accept,
    Reject,
}

/// One wallet's relationship to one DAO.
#[account]
#[derive(InitSpace)]
pub struct Membership {
    pub dao: Pubkey,
    pub wallet: Pubkey,
    pub status: MembershipStatus,
    pub invited_at: i64,
    /// Zero until the invitee responds
    pub responded_at: i64,
    pub created_proposals: u32,
    pub bump: u8,
}

impl Membership {
    pub fn invited(dao: Pubkey, wallet: Pubkey, now: i64, bump: u8) -> Self {
        Self {
            dao,
            wallet,
            status: MembershipStatus::Invited,
            invited_at: now,
            responded_at: 0,
            created_proposals: 0,
            bump,
        }
    }

    /// The DAO authority's own membership, accepted from the start.
    pub fn founder(dao: Pubkey, wallet: Pubkey, now: i64, bump: u8) -> Self {
        Self {
            status: MembershipStatus::Accepted,
            responded_at: now,
            ..Self::invited(dao, wallet, now, bump)
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == MembershipStatus::Accepted
    }

    /// Only the invited wallet may answer, and only once.
    pub fn respond(
        &mut self,
        signer: &Pubkey,
        response: InvitationResponse,
        now: i64,
    ) -> DaoResult<()> {
        if self.wallet != *signer {
            return Err(DaoError::Unauthorized);
        }
        if self.status != MembershipStatus::Invited {
            return Err(DaoError::InvalidState);
        }

        self.status = match response {
            InvitationResponse::Accept => MembershipStatus::Accepted,
            InvitationResponse::Reject => MembershipStatus::Rejected,
        };
        self.responded_at = now;
        Ok(())
    }

    pub fn record_proposal(&mut self) -> DaoResult<()> {
        self.created_proposals = self
            .created_proposals
            .checked_add(1)
            .ok_or(DaoError::ArithmeticOverflow)?;
        Ok(())
    }
}

/// Deposits held when withdrawal epoch `epoch` began, written by the
/// member's first deposit in that epoch.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositCheckpoint {
    pub epoch: u64,
    pub deposited_before: u64,
}

/// Cumulative deposits of one accepted member; the basis of vote weight and
/// withdrawal shares.
#[account]
#[derive(InitSpace)]
pub struct FinancialRecord {
    pub dao: Pubkey,
    pub wallet: Pubkey,
    /// Never decreases
    pub total_deposit_amount: u64,
    pub last_deposit_at: i64,
    pub deposits_count: u32,
    /// Lamports received from withdrawal releases
    pub total_withdrawn_amount: u64,
    pub bump: u8,
    /// Ascending by epoch. Grows by reallocation, one entry per epoch with
    /// deposits.
    #[max_len(0)]
    pub checkpoints: Vec<DepositCheckpoint>,
}

impl FinancialRecord {
    pub fn open(dao: Pubkey, wallet: Pubkey, bump: u8) -> Self {
        Self {
            dao,
            wallet,
            total_deposit_amount: 0,
            last_deposit_at: 0,
            deposits_count: 0,
            total_withdrawn_amount: 0,
            bump,
            checkpoints: Vec::new(),
        }
    }

    /// Account size with `checkpoints` entries.
    pub fn space(checkpoints: usize) -> usize {
        8 + Self::INIT_SPACE + checkpoints * DepositCheckpoint::INIT_SPACE
    }

    /// Epoch zero precedes every withdrawal and never needs a checkpoint.
    fn needs_checkpoint(&self, epoch: u64) -> bool {
        epoch > 0
            && !self
                .checkpoints
                .last()
                .is_some_and(|checkpoint| checkpoint.epoch >= epoch)
    }

    /// Account size once a deposit in `epoch` is recorded.
    pub fn space_after_deposit(&self, epoch: u64) -> usize {
        Self::space(self.checkpoints.len() + usize::from(self.needs_checkpoint(epoch)))
    }

    /// Records a deposit made during withdrawal epoch `epoch`.
    pub fn record_deposit(&mut self, amount: u64, now: i64, epoch: u64) -> DaoResult<()> {
        if amount == 0 {
            return Err(DaoError::InvalidAmount);
        }
        let total = math::add(self.total_deposit_amount, amount)?;
        let count = self
            .deposits_count
            .checked_add(1)
            .ok_or(DaoError::ArithmeticOverflow)?;

        if self.needs_checkpoint(epoch) {
            self.checkpoints.push(DepositCheckpoint {
                epoch,
                deposited_before: self.total_deposit_amount,
            });
        }
        self.total_deposit_amount = total;
        self.deposits_count = count;
        self.last_deposit_at = now;
        Ok(())
    }

    /// Deposits held when withdrawal epoch `epoch` began. Deposits of that
    /// epoch or later are not counted.
    pub fn deposit_at_epoch(&self, epoch: u64) -> u64 {
        self.checkpoints
            .iter()
            .find(|checkpoint| checkpoint.epoch >= epoch)
            .map_or(self.total_deposit_amount, |checkpoint| {
                checkpoint.deposited_before
            })
    }

    pub fn record_withdrawal(&mut self, amount: u64) -> DaoResult<()> {
        self.total_withdrawn_amount = math::add(self.total_withdrawn_amount, amount)?;
        Ok(())
    }

    /// Stake against the DAO's total financial power. Computed on demand,
    /// never stored.
    pub fn stake(&self, total_financial_power: u64) -> StakeRatio {
        StakeRatio {
            deposit: self.total_deposit_amount,
            total: total_financial_power,
        }
    }
}

/// `deposit / total` kept as an exact fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakeRatio {
    pub deposit: u64,
    pub total: u64,
}

impl StakeRatio {
    /// `amount * deposit / total`, truncated.
    pub fn share_of(&self, amount: u64) -> DaoResult<u64> {
        math::mul_div(amount, self.deposit, self.total)
    }

    pub fn basis_points(&self) -> DaoResult<u64> {
        self.share_of(BASIS_POINTS)
    }
}
