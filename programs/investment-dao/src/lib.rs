//! Investment DAO - Anchor Program
//!
//! Members pool lamports in a treasury and vote, weighted by their
//! cumulative deposits, on proposals that either return funds pro rata
//! (withdrawal) or stream them to an outside receiver on a vesting schedule
//! (investing).
//!
//! The rules live in `state` as plain methods returning `DaoResult`. The
//! instructions apply them to on-chain accounts; `governance` applies them to
//! an in-memory keyed store and is what the scenario tests drive.

#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod governance;
pub mod instructions;
pub mod math;
pub mod state;

use instructions::*;
use state::{GovernanceConfig, ProposalKind, VestingSchedule, VoteOption};

declare_id!("BH5sFYKYWSUGk7SVMftmakyEdPcdRjat2Xnah4jReUnV");

#[program]
pub mod investment_dao {
    use super::*;

    /// Create a DAO named `name` with the caller as authority and first member.
    pub fn create_dao(ctx: Context<CreateDao>, name: String, config: GovernanceConfig) -> Result<()> {
        ctx.accounts.create_dao(&ctx.bumps, name, config)
    }

    /// Invite a wallet. Authority only.
    pub fn invite_member(ctx: Context<InviteMember>) -> Result<()> {
        ctx.accounts.invite_member(&ctx.bumps)
    }

    pub fn accept_invitation(ctx: Context<AcceptInvitation>) -> Result<()> {
        ctx.accounts.accept_invitation(&ctx.bumps)
    }

    pub fn reject_invitation(ctx: Context<RejectInvitation>) -> Result<()> {
        ctx.accounts.reject_invitation()
    }

    /// Move lamports from an accepted member into the treasury.
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        ctx.accounts.deposit(amount)
    }

    /// Open a proposal. A withdrawal carries `withdraw_amount`, an investing
    /// proposal carries `schedule`; anything else is rejected.
    pub fn create_proposal(
        ctx: Context<CreateProposal>,
        name: String,
        description: String,
        kind: ProposalKind,
        withdraw_amount: Option<u64>,
        schedule: Option<VestingSchedule>,
    ) -> Result<()> {
        ctx.accounts.create_proposal(
            &ctx.bumps,
            name,
            description,
            kind,
            withdraw_amount,
            schedule,
        )
    }

    pub fn cast_vote(ctx: Context<CastVote>, option: VoteOption) -> Result<()> {
        ctx.accounts.cast_vote(&ctx.bumps, option)
    }

    /// Record the expiry of a proposal whose voting window has closed.
    pub fn finalize_proposal(ctx: Context<FinalizeProposal>) -> Result<()> {
        ctx.accounts.finalize_proposal()
    }

    pub fn execute_withdrawal(ctx: Context<ExecuteWithdrawal>) -> Result<()> {
        ctx.accounts.execute_withdrawal(&ctx.bumps)
    }

    pub fn execute_investing(ctx: Context<ExecuteInvesting>) -> Result<()> {
        ctx.accounts.execute_investing(&ctx.bumps)
    }

    /// Claim the caller's pro-rata share of an executed withdrawal.
    pub fn withdraw_share(ctx: Context<WithdrawShare>) -> Result<()> {
        ctx.accounts.withdraw_share(&ctx.bumps)
    }

    pub fn claim_vested(ctx: Context<ClaimVested>) -> Result<()> {
        ctx.accounts.claim_vested()
    }
}
