use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};

use crate::constants::{DAO_SEED, FINANCIAL_RECORD_SEED, MEMBERSHIP_SEED, TREASURY_SEED};
use crate::error::DaoError;
use crate::state::{Dao, FinancialRecord, Membership, Treasury};

// ---------------------------------------------------------------------------
// Deposit
// ---------------------------------------------------------------------------
// Lamports go straight from the member into the treasury PDA; the member's
// cumulative deposit and the DAO's financial power grow by the same amount.
// The first deposit of a withdrawal epoch grows the financial record by one
// checkpoint, paid for by the member.
// ---------------------------------------------------------------------------

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(mut)]
    pub member: Signer<'info>,

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
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), member.key().as_ref()],
        bump = membership.bump,
        constraint = membership.is_accepted() @ DaoError::NotAMember
    )]
    pub membership: Account<'info, Membership>,

    #[account(
        mut,
        seeds = [FINANCIAL_RECORD_SEED, dao.key().as_ref(), member.key().as_ref()],
        bump = financial_record.bump,
        realloc = financial_record.space_after_deposit(dao.withdrawal_epoch),
        realloc::payer = member,
        realloc::zero = false
    )]
    pub financial_record: Account<'info, FinancialRecord>,

    pub system_program: Program<'info, System>,
}

impl<'info> Deposit<'info> {
    pub fn deposit(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, DaoError::InvalidAmount);
        let now = Clock::get()?.unix_timestamp;

        self.financial_record
            .record_deposit(amount, now, self.dao.withdrawal_epoch)?;
        self.dao.record_deposit(amount)?;

        transfer(
            CpiContext::new(
                self.system_program.to_account_info(),
                Transfer {
                    from: self.member.to_account_info(),
                    to: self.treasury.to_account_info(),
                },
            ),
            amount,
        )?;

        msg!(
            "{} deposited {} lamports, total {} of {}",
            self.member.key(),
            amount,
            self.financial_record.total_deposit_amount,
            self.dao.total_financial_power
        );
        Ok(())
    }
}
