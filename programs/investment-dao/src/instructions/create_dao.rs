use anchor_lang::prelude::*;

use crate::constants::{DAO_SEED, FINANCIAL_RECORD_SEED, MEMBERSHIP_SEED, TREASURY_SEED};
use crate::state::{Dao, FinancialRecord, GovernanceConfig, Membership, Treasury};

// ---------------------------------------------------------------------------
// Create DAO
// ---------------------------------------------------------------------------
// The DAO address is derived from its name, so names are unique per program.
// The creator becomes the authority and its first accepted member.
// ---------------------------------------------------------------------------

#[derive(Accounts)]
#[instruction(name: String)]
pub struct CreateDao<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + Dao::INIT_SPACE,
        seeds = [DAO_SEED, name.as_bytes()],
        bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        init,
        payer = authority,
        space = 8 + Treasury::INIT_SPACE,
        seeds = [TREASURY_SEED, dao.key().as_ref()],
        bump
    )]
    pub treasury: Account<'info, Treasury>,

    #[account(
        init,
        payer = authority,
        space = 8 + Membership::INIT_SPACE,
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), authority.key().as_ref()],
        bump
    )]
    pub membership: Account<'info, Membership>,

    #[account(
        init,
        payer = authority,
        space = 8 + FinancialRecord::INIT_SPACE,
        seeds = [FINANCIAL_RECORD_SEED, dao.key().as_ref(), authority.key().as_ref()],
        bump
    )]
    pub financial_record: Account<'info, FinancialRecord>,

    pub system_program: Program<'info, System>,
}

impl<'info> CreateDao<'info> {
    pub fn create_dao(
        &mut self,
        bumps: &CreateDaoBumps,
        name: String,
        config: GovernanceConfig,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let dao = self.dao.key();
        let authority = self.authority.key();

        self.dao.set_inner(Dao::new(
            authority,
            name,
            config,
            now,
            bumps.dao,
            bumps.treasury,
        )?);
        self.treasury.set_inner(Treasury {
            dao,
            bump: bumps.treasury,
        });
        self.membership
            .set_inner(Membership::founder(dao, authority, now, bumps.membership));
        self.financial_record
            .set_inner(FinancialRecord::open(dao, authority, bumps.financial_record));

        msg!(
            "DAO {} created by {}: quorum {}%, voting period {}s",
            self.dao.name,
            authority,
            config.quorum_percent,
            config.max_voting_period
        );
        Ok(())
    }
}
