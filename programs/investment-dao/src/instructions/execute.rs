use anchor_lang::prelude::*;

use crate::constants::{
    DAO_SEED, MEMBERSHIP_SEED, PROPOSAL_SEED, TREASURY_SEED, VESTING_SEED, WITHDRAWAL_SEED,
};
use crate::error::DaoError;
use crate::instructions::move_lamports;
use crate::state::{
    Dao, Membership, Proposal, ProposalKind, ProposalPayload, Treasury, VestingRelease,
    WithdrawalRelease,
};

// ---------------------------------------------------------------------------
// Execute
// ---------------------------------------------------------------------------
// A passed proposal is executed exactly once by any accepted member. Its
// amount leaves the treasury for a release escrow owned by the program; the
// escrow PDA is keyed by the proposal, so a second escrow cannot exist.
// A withdrawal also opens a new withdrawal epoch and freezes the DAO's
// financial power as the denominator of its split.
// ---------------------------------------------------------------------------

/// Marks the proposal executed, logging its snapshot when it cannot be.
fn begin_execution(proposal: &mut Proposal, now: i64) -> Result<()> {
    if let Err(error) = proposal.begin_execution(now) {
        proposal.log_snapshot(now);
        return Err(error.into());
    }
    Ok(())
}

#[derive(Accounts)]
pub struct ExecuteWithdrawal<'info> {
    #[account(mut)]
    pub executor: Signer<'info>,

    #[account(
        mut,
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        mut,
        seeds = [TREASURY_SEED, dao.key().as_ref()],
        bump = dao.treasury_bump,
        has_one = dao
    )]
    pub treasury: Account<'info, Treasury>,

    #[account(
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), executor.key().as_ref()],
        bump = membership.bump,
        constraint = membership.is_accepted() @ DaoError::Unauthorized
    )]
    pub membership: Account<'info, Membership>,

    #[account(
        mut,
        seeds = [PROPOSAL_SEED, dao.key().as_ref(), &proposal.index.to_le_bytes()],
        bump = proposal.bump,
        has_one = dao,
        constraint = proposal.kind() == ProposalKind::Withdrawal @ DaoError::WrongProposalKind
    )]
    pub proposal: Account<'info, Proposal>,

    #[account(
        init,
        payer = executor,
        space = 8 + WithdrawalRelease::INIT_SPACE,
        seeds = [WITHDRAWAL_SEED, proposal.key().as_ref()],
        bump
    )]
    pub withdrawal_release: Account<'info, WithdrawalRelease>,

    pub system_program: Program<'info, System>,
}

impl<'info> ExecuteWithdrawal<'info> {
    pub fn execute_withdrawal(&mut self, bumps: &ExecuteWithdrawalBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let ProposalPayload::Withdrawal { amount } = self.proposal.payload else {
            return err!(DaoError::WrongProposalKind);
        };

        begin_execution(&mut self.proposal, now)?;
        move_lamports(
            &self.treasury.to_account_info(),
            &self.withdrawal_release.to_account_info(),
            amount,
            DaoError::InsufficientTreasury,
        )?;

        let epoch = self.dao.open_withdrawal_epoch()?;
        self.withdrawal_release.set_inner(WithdrawalRelease::new(
            self.dao.key(),
            self.proposal.index,
            amount,
            epoch,
            self.dao.total_financial_power,
            now,
            bumps.withdrawal_release,
        ));

        msg!(
            "Proposal {} executed: {} lamports escrowed for members, epoch {} power {}",
            self.proposal.index,
            amount,
            epoch,
            self.dao.total_financial_power
        );
        Ok(())
    }
}

#[derive(Accounts)]
pub struct ExecuteInvesting<'info> {
    #[account(mut)]
    pub executor: Signer<'info>,

    #[account(
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        mut,
        seeds = [TREASURY_SEED, dao.key().as_ref()],
        bump = dao.treasury_bump,
        has_one = dao
    )]
    pub treasury: Account<'info, Treasury>,

    #[account(
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), executor.key().as_ref()],
        bump = membership.bump,
        constraint = membership.is_accepted() @ DaoError::Unauthorized
    )]
    pub membership: Account<'info, Membership>,

    #[account(
        mut,
        seeds = [PROPOSAL_SEED, dao.key().as_ref(), &proposal.index.to_le_bytes()],
        bump = proposal.bump,
        has_one = dao,
        constraint = proposal.kind() == ProposalKind::Investing @ DaoError::WrongProposalKind
    )]
    pub proposal: Account<'info, Proposal>,

    #[account(
        init,
        payer = executor,
        space = 8 + VestingRelease::INIT_SPACE,
        seeds = [VESTING_SEED, proposal.key().as_ref()],
        bump
    )]
    pub vesting_release: Account<'info, VestingRelease>,

    pub system_program: Program<'info, System>,
}

impl<'info> ExecuteInvesting<'info> {
    pub fn execute_investing(&mut self, bumps: &ExecuteInvestingBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let ProposalPayload::Investing { schedule } = self.proposal.payload else {
            return err!(DaoError::WrongProposalKind);
        };

        begin_execution(&mut self.proposal, now)?;
        move_lamports(
            &self.treasury.to_account_info(),
            &self.vesting_release.to_account_info(),
            schedule.total_amount,
            DaoError::InsufficientTreasury,
        )?;

        self.vesting_release.set_inner(VestingRelease::new(
            self.dao.key(),
            self.proposal.index,
            schedule,
            now,
            bumps.vesting_release,
        )?);

        msg!(
            "Proposal {} executed: {} lamports vesting to {} from {}",
            self.proposal.index,
            schedule.total_amount,
            schedule.receiver,
            self.vesting_release.cliff_end
        );
        Ok(())
    }
}
