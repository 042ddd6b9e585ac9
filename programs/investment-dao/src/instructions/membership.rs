use anchor_lang::prelude::*;

use crate::constants::{DAO_SEED, FINANCIAL_RECORD_SEED, MEMBERSHIP_SEED};
use crate::error::DaoError;
use crate::state::{Dao, FinancialRecord, InvitationResponse, Membership};

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------
// Only the DAO authority invites. The membership PDA is keyed by
// (dao, wallet), so a second invitation for the same wallet cannot be
// created whatever state the first one is in.
// ---------------------------------------------------------------------------

#[derive(Accounts)]
pub struct InviteMember<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump,
        has_one = authority @ DaoError::Unauthorized
    )]
    pub dao: Account<'info, Dao>,

    /// CHECK: only used as a seed and recorded as the invitee
    pub wallet: UncheckedAccount<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + Membership::INIT_SPACE,
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), wallet.key().as_ref()],
        bump
    )]
    pub membership: Account<'info, Membership>,

    pub system_program: Program<'info, System>,
}

impl<'info> InviteMember<'info> {
    pub fn invite_member(&mut self, bumps: &InviteMemberBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        self.membership.set_inner(Membership::invited(
            self.dao.key(),
            self.wallet.key(),
            now,
            bumps.membership,
        ));

        msg!("Invited {} to DAO {}", self.wallet.key(), self.dao.name);
        Ok(())
    }
}

/// Accepting opens the member's financial record.
#[derive(Accounts)]
pub struct AcceptInvitation<'info> {
    #[account(mut)]
    pub wallet: Signer<'info>,

    #[account(
        mut,
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        mut,
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), wallet.key().as_ref()],
        bump = membership.bump
    )]
    pub membership: Account<'info, Membership>,

    #[account(
        init,
        payer = wallet,
        space = 8 + FinancialRecord::INIT_SPACE,
        seeds = [FINANCIAL_RECORD_SEED, dao.key().as_ref(), wallet.key().as_ref()],
        bump
    )]
    pub financial_record: Account<'info, FinancialRecord>,

    pub system_program: Program<'info, System>,
}

impl<'info> AcceptInvitation<'info> {
    pub fn accept_invitation(&mut self, bumps: &AcceptInvitationBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let wallet = self.wallet.key();

        self.membership
            .respond(&wallet, InvitationResponse::Accept, now)?;
        self.dao.admit_member()?;
        self.financial_record.set_inner(FinancialRecord::open(
            self.dao.key(),
            wallet,
            bumps.financial_record,
        ));

        msg!(
            "{} joined DAO {} ({} members)",
            wallet,
            self.dao.name,
            self.dao.members_count
        );
        Ok(())
    }
}

#[derive(Accounts)]
pub struct RejectInvitation<'info> {
    pub wallet: Signer<'info>,

    #[account(
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        mut,
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), wallet.key().as_ref()],
        bump = membership.bump
    )]
    pub membership: Account<'info, Membership>,
}

impl<'info> RejectInvitation<'info> {
    pub fn reject_invitation(&mut self) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        self.membership
            .respond(&self.wallet.key(), InvitationResponse::Reject, now)?;

        msg!("{} declined DAO {}", self.wallet.key(), self.dao.name);
        Ok(())
    }
}
