use anchor_lang::prelude::*;

use crate::constants::{DAO_SEED, FINANCIAL_RECORD_SEED, MEMBERSHIP_SEED, PROPOSAL_SEED, VOTE_SEED};
use crate::error::DaoError;
use crate::state::{
    Dao, FinancialRecord, Membership, Proposal, ProposalKind, ProposalPayload, ProposalTerms,
    VestingSchedule, VoteOption, VoteRecord,
};

// ---------------------------------------------------------------------------
// Create proposal
// ---------------------------------------------------------------------------
// The proposal PDA is seeded with the DAO's current proposal counter, which
// `open_proposal` then consumes. Indexes are therefore dense and unique.
// ---------------------------------------------------------------------------

#[derive(Accounts)]
pub struct CreateProposal<'info> {
    #[account(mut)]
    pub proposer: Signer<'info>,

    #[account(
        mut,
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        mut,
        seeds = [MEMBERSHIP_SEED, dao.key().as_ref(), proposer.key().as_ref()],
        bump = membership.bump,
        constraint = membership.is_accepted() @ DaoError::NotAMember
    )]
    pub membership: Account<'info, Membership>,

    #[account(
        init,
        payer = proposer,
        space = 8 + Proposal::INIT_SPACE,
        seeds = [PROPOSAL_SEED, dao.key().as_ref(), &dao.proposals_count.to_le_bytes()],
        bump
    )]
    pub proposal: Account<'info, Proposal>,

    pub system_program: Program<'info, System>,
}

impl<'info> CreateProposal<'info> {
    pub fn create_proposal(
        &mut self,
        bumps: &CreateProposalBumps,
        name: String,
        description: String,
        kind: ProposalKind,
        withdraw_amount: Option<u64>,
        schedule: Option<VestingSchedule>,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let dao = self.dao.key();
        let proposer = self.proposer.key();

        let terms = ProposalTerms {
            name,
            description,
            payload: ProposalPayload::from_parts(kind, withdraw_amount, schedule)?,
        };
        let proposal = self
            .dao
            .open_proposal(dao, proposer, terms, now, bumps.proposal)?;
        self.membership.record_proposal()?;

        msg!(
            "Proposal {} ({:?}) opened by {}: threshold {}, deadline {}",
            proposal.index,
            kind,
            proposer,
            proposal.vote_threshold,
            proposal.deadline
        );
        self.proposal.set_inner(proposal);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cast vote
// ---------------------------------------------------------------------------
// Weight is the voter's cumulative deposit at the moment of voting. The vote
// record PDA is keyed by (proposal, voter); it cannot be created twice.
// ---------------------------------------------------------------------------

#[derive(Accounts)]
pub struct CastVote<'info> {
    #[account(mut)]
    pub voter: Signer<'info>,

    #[account(
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        mut,
        seeds = [PROPOSAL_SEED, dao.key().as_ref(), &proposal.index.to_le_bytes()],
        bump = proposal.bump,
        has_one = dao
    )]
    pub proposal: Account<'info, Proposal>,

    #[account(
        seeds = [FINANCIAL_RECORD_SEED, dao.key().as_ref(), voter.key().as_ref()],
        bump = financial_record.bump
    )]
    pub financial_record: Account<'info, FinancialRecord>,

    #[account(
        init,
        payer = voter,
        space = 8 + VoteRecord::INIT_SPACE,
        seeds = [VOTE_SEED, proposal.key().as_ref(), voter.key().as_ref()],
        bump
    )]
    pub vote_record: Account<'info, VoteRecord>,

    pub system_program: Program<'info, System>,
}

impl<'info> CastVote<'info> {
    pub fn cast_vote(&mut self, bumps: &CastVoteBumps, option: VoteOption) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let voter = self.voter.key();
        let weight = self.financial_record.total_deposit_amount;

        if let Err(error) = self.proposal.cast_vote(option, weight, now) {
            self.proposal.log_snapshot(now);
            return Err(error.into());
        }

        self.vote_record.set_inner(VoteRecord {
            dao: self.dao.key(),
            proposal_index: self.proposal.index,
            voter,
            option,
            weight,
            voted_at: now,
            bump: bumps.vote_record,
        });

        msg!("{} voted {:?} with weight {}", voter, option, weight);
        self.proposal.log_snapshot(now);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Finalize
// ---------------------------------------------------------------------------
// Persists the lazy Active -> Expired transition. Anyone may call it.
// ---------------------------------------------------------------------------

#[derive(Accounts)]
pub struct FinalizeProposal<'info> {
    pub caller: Signer<'info>,

    #[account(
        seeds = [DAO_SEED, dao.name.as_bytes()],
        bump = dao.bump
    )]
    pub dao: Account<'info, Dao>,

    #[account(
        mut,
        seeds = [PROPOSAL_SEED, dao.key().as_ref(), &proposal.index.to_le_bytes()],
        bump = proposal.bump,
        has_one = dao
    )]
    pub proposal: Account<'info, Proposal>,
}

impl<'info> FinalizeProposal<'info> {
    pub fn finalize_proposal(&mut self) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        if let Err(error) = self.proposal.expire(now) {
            self.proposal.log_snapshot(now);
            return Err(error.into());
        }

        msg!("Proposal {} expired", self.proposal.index);
        Ok(())
    }
}
