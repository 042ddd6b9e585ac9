use anchor_lang::prelude::*;

use crate::constants::{
    DAO_SEED, FINANCIAL_RECORD_SEED, PROPOSAL_SEED, TREASURY_SEED, VESTING_SEED,
    WITHDRAWAL_RECORD_SEED, WITHDRAWAL_SEED,
};
use crate::error::DaoError;
use crate::instructions::move_lamports;
use crate::state::{
    Dao, FinancialRecord, Proposal, ProposalKind, Treasury, VestingRelease, WithdrawalRecord,
    WithdrawalRelease,
};

// ---------------------------------------------------------------------------
// Withdraw share
// ---------------------------------------------------------------------------
// Each member claims `escrow * deposit / financial_power` once, where both
// are taken as they stood when the proposal executed. The withdrawal record
// PDA keyed by (release, member) is the one-claim guard. The claim that
// exhausts the escrow returns its truncation dust to the treasury.
// ---------------------------------------------------------------------------

#[derive(Accounts)]
pub struct WithdrawShare<'info> {
    #[account(mut)]
    pub member: Signer<'info>,

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
        seeds = [PROPOSAL_SEED, dao.key().as_ref(), &proposal.index.to_le_bytes()],
        bump = proposal.bump,
        has_one = dao,
        constraint = proposal.kind() == ProposalKind::Withdrawal @ DaoError::WrongProposalKind
    )]
    pub proposal: Account<'info, Proposal>,

    #[account(
        mut,
        seeds = [WITHDRAWAL_SEED, proposal.key().as_ref()],
        bump = withdrawal_release.bump
    )]
    pub withdrawal_release: Account<'info, WithdrawalRelease>,

    #[account(
        mut,
        seeds = [FINANCIAL_RECORD_SEED, dao.key().as_ref(), member.key().as_ref()],
        bump = financial_record.bump
    )]
    pub financial_record: Account<'info, FinancialRecord>,

    #[account(
        init,
        payer = member,
        space = 8 + WithdrawalRecord::INIT_SPACE,
        seeds = [WITHDRAWAL_RECORD_SEED, withdrawal_release.key().as_ref(), member.key().as_ref()],
        bump
    )]
    pub withdrawal_record: Account<'info, WithdrawalRecord>,

    pub system_program: Program<'info, System>,
}

impl<'info> WithdrawShare<'info> {
    pub fn withdraw_share(&mut self, bumps: &WithdrawShareBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let member = self.member.key();

        let deposit = self
            .financial_record
            .deposit_at_epoch(self.withdrawal_release.epoch);
        let amount = self.withdrawal_release.claim(deposit)?;
        self.financial_record.record_withdrawal(amount)?;

        move_lamports(
            &self.withdrawal_release.to_account_info(),
            &self.member.to_account_info(),
            amount,
            DaoError::InsufficientEscrow,
        )?;

        let dust = self.withdrawal_release.sweep_dust();
        if dust > 0 {
            move_lamports(
                &self.withdrawal_release.to_account_info(),
                &self.treasury.to_account_info(),
                dust,
                DaoError::InsufficientEscrow,
            )?;
            msg!("Escrow exhausted, {} lamports returned to the treasury", dust);
        }

        self.withdrawal_record.set_inner(WithdrawalRecord {
            dao: self.dao.key(),
            proposal_index: self.proposal.index,
            wallet: member,
            amount,
            claimed_at: now,
            bump: bumps.withdrawal_record,
        });

        msg!(
            "{} withdrew {} lamports from proposal {} ({} of {} claimed)",
            member,
            amount,
            self.proposal.index,
            self.withdrawal_release.claimed_total,
            self.withdrawal_release.escrow_total
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Claim vested
// ---------------------------------------------------------------------------

#[derive(Accounts)]
pub struct ClaimVested<'info> {
    #[account(mut)]
    pub receiver: Signer<'info>,

    #[account(
        constraint = proposal.kind() == ProposalKind::Investing @ DaoError::WrongProposalKind
    )]
    pub proposal: Account<'info, Proposal>,

    #[account(
        mut,
        seeds = [VESTING_SEED, proposal.key().as_ref()],
        bump = vesting_release.bump,
        constraint = vesting_release.dao == proposal.dao
    )]
    pub vesting_release: Account<'info, VestingRelease>,
}

impl<'info> ClaimVested<'info> {
    pub fn claim_vested(&mut self) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let amount = self.vesting_release.claim(&self.receiver.key(), now)?;

        move_lamports(
            &self.vesting_release.to_account_info(),
            &self.receiver.to_account_info(),
            amount,
            DaoError::InsufficientEscrow,
        )?;

        msg!(
            "{} claimed {} vested lamports ({} of {})",
            self.receiver.key(),
            amount,
            self.vesting_release.record.claimed,
            self.vesting_release.schedule.total_amount
        );
        Ok(())
    }
}
