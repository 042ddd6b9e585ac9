//! Host-independent governance state machine.
//!
//! `Governance` holds every entity of every DAO in maps keyed by their
//! logical composite keys, and exposes each operation as a transition
//! `(state, operation, signer, now) -> (state', result)`. The program's
//! instructions apply the same rules to on-chain accounts; this is the
//! reference the instructions are checked against and the harness the
//! scenario tests drive.
//!
//! Every operation touches exactly one DAO. It runs against a draft copy of
//! that DAO's ledger which is committed only when the whole operation
//! succeeds, so a rejected call leaves no partial writes behind. The copy
//! costs O(size of that DAO's ledger) per call; other DAOs are not copied.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::error::DaoError;
use crate::math;
use crate::state::{
    Dao, FinancialRecord, GovernanceConfig, InvitationResponse, Membership, MembershipStatus,
    Proposal, ProposalKind, ProposalPayload, ProposalSnapshot, ProposalState, ProposalTerms,
    StakeRatio, VestingRelease, VoteOption, VoteRecord, WithdrawalRecord, WithdrawalRelease,
};

// PDA bumps are an artifact of on-chain addressing and carry no meaning here.
const NO_BUMP: u8 = 0;

/// `(dao, wallet)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MembershipKey {
    pub dao: Pubkey,
    pub wallet: Pubkey,
}

/// `(dao, index)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProposalKey {
    pub dao: Pubkey,
    pub index: u64,
}

/// A refused operation: the error plus, for proposal operations, the
/// proposal as it stood before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub error: DaoError,
    pub proposal: Option<ProposalSnapshot>,
}

impl Rejection {
    fn with(error: DaoError, snapshot: ProposalSnapshot) -> Self {
        Self {
            error,
            proposal: Some(snapshot),
        }
    }
}

impl From<DaoError> for Rejection {
    fn from(error: DaoError) -> Self {
        Self {
            error,
            proposal: None,
        }
    }
}

/// A signed request as submitted by the transport layer.
#[derive(Clone, Debug)]
pub enum Operation {
    CreateDao {
        name: String,
        config: GovernanceConfig,
    },
    InviteMember {
        dao: Pubkey,
        wallet: Pubkey,
    },
    RespondToInvitation {
        membership: MembershipKey,
        response: InvitationResponse,
    },
    Deposit {
        dao: Pubkey,
        amount: u64,
    },
    CreateProposal {
        dao: Pubkey,
        terms: ProposalTerms,
    },
    CastVote {
        proposal: ProposalKey,
        option: VoteOption,
    },
    Expire {
        proposal: ProposalKey,
    },
    ExecuteProposal {
        proposal: ProposalKey,
    },
    WithdrawShare {
        proposal: ProposalKey,
    },
    ClaimVested {
        proposal: ProposalKey,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    DaoCreated(Pubkey),
    MemberInvited(MembershipKey),
    InvitationAnswered(MembershipStatus),
    Deposited { total_deposit_amount: u64 },
    ProposalCreated(ProposalKey),
    VoteCast(ProposalState),
    ProposalExpired,
    ProposalExecuted,
    Claimed(u64),
}

/// Every entity of one DAO.
#[derive(Clone)]
struct DaoLedger {
    dao: Dao,
    /// Spendable lamports
    treasury: u64,
    memberships: BTreeMap<Pubkey, Membership>,
    financial_records: BTreeMap<Pubkey, FinancialRecord>,
    proposals: BTreeMap<u64, Proposal>,
    votes: BTreeMap<(u64, Pubkey), VoteRecord>,
    withdrawals: BTreeMap<u64, WithdrawalRelease>,
    withdrawal_records: BTreeMap<(u64, Pubkey), WithdrawalRecord>,
    vestings: BTreeMap<u64, VestingRelease>,
}

impl DaoLedger {
    fn is_accepted(&self, wallet: &Pubkey) -> bool {
        self.memberships
            .get(wallet)
            .is_some_and(Membership::is_accepted)
    }
}

#[derive(Clone, Default)]
pub struct Governance {
    ledgers: BTreeMap<Pubkey, DaoLedger>,
}

impl Governance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches one signed operation.
    pub fn apply(
        &mut self,
        operation: Operation,
        signer: Pubkey,
        now: i64,
    ) -> std::result::Result<Outcome, Rejection> {
        match operation {
            Operation::CreateDao { name, config } => self
                .create_dao(signer, name, config, now)
                .map(Outcome::DaoCreated),
            Operation::InviteMember { dao, wallet } => self
                .invite_member(dao, signer, wallet, now)
                .map(Outcome::MemberInvited),
            Operation::RespondToInvitation {
                membership,
                response,
            } => self
                .respond_to_invitation(membership, signer, response, now)
                .map(Outcome::InvitationAnswered),
            Operation::Deposit { dao, amount } => self
                .deposit(dao, signer, amount, now)
                .map(|total_deposit_amount| Outcome::Deposited {
                    total_deposit_amount,
                }),
            Operation::CreateProposal { dao, terms } => self
                .create_proposal(dao, signer, terms, now)
                .map(Outcome::ProposalCreated),
            Operation::CastVote { proposal, option } => self
                .cast_vote(proposal, signer, option, now)
                .map(Outcome::VoteCast),
            Operation::Expire { proposal } => {
                self.expire(proposal, now).map(|_| Outcome::ProposalExpired)
            }
            Operation::ExecuteProposal { proposal } => self
                .execute_proposal(proposal, signer, now)
                .map(|_| Outcome::ProposalExecuted),
            Operation::WithdrawShare { proposal } => self
                .withdraw_my_share(proposal, signer, now)
                .map(Outcome::Claimed),
            Operation::ClaimVested { proposal } => self
                .claim_vested(proposal, signer, now)
                .map(Outcome::Claimed),
        }
    }

    fn transact<T>(
        &mut self,
        dao: Pubkey,
        operation: impl FnOnce(&mut DaoLedger) -> std::result::Result<T, Rejection>,
    ) -> std::result::Result<T, Rejection> {
        let ledger = self.ledgers.get_mut(&dao).ok_or(DaoError::UnknownDao)?;
        let mut draft = ledger.clone();
        let outcome = operation(&mut draft)?;
        *ledger = draft;
        Ok(outcome)
    }

    // ---------------------------------------------------------------------
    // Membership
    // ---------------------------------------------------------------------

    /// Creates a DAO, its empty treasury and the authority's accepted
    /// membership with a zero-balance financial record.
    pub fn create_dao(
        &mut self,
        authority: Pubkey,
        name: String,
        config: GovernanceConfig,
        now: i64,
    ) -> std::result::Result<Pubkey, Rejection> {
        let dao = Dao::new(authority, name, config, now, NO_BUMP, NO_BUMP)?;
        let key = Dao::address(&dao.name);
        if self.ledgers.contains_key(&key) {
            return Err(DaoError::DaoAlreadyExists.into());
        }

        let ledger = DaoLedger {
            dao,
            treasury: 0,
            memberships: BTreeMap::from([(
                authority,
                Membership::founder(key, authority, now, NO_BUMP),
            )]),
            financial_records: BTreeMap::from([(
                authority,
                FinancialRecord::open(key, authority, NO_BUMP),
            )]),
            proposals: BTreeMap::new(),
            votes: BTreeMap::new(),
            withdrawals: BTreeMap::new(),
            withdrawal_records: BTreeMap::new(),
            vestings: BTreeMap::new(),
        };
        self.ledgers.insert(key, ledger);
        Ok(key)
    }

    pub fn invite_member(
        &mut self,
        dao: Pubkey,
        signer: Pubkey,
        wallet: Pubkey,
        now: i64,
    ) -> std::result::Result<MembershipKey, Rejection> {
        self.transact(dao, |ledger| {
            ledger.dao.ensure_authority(&signer)?;
            if ledger.memberships.contains_key(&wallet) {
                return Err(DaoError::AlreadyMember.into());
            }
            ledger
                .memberships
                .insert(wallet, Membership::invited(dao, wallet, now, NO_BUMP));
            Ok(MembershipKey { dao, wallet })
        })
    }

    /// Accepting opens the member's financial record.
    pub fn respond_to_invitation(
        &mut self,
        membership: MembershipKey,
        signer: Pubkey,
        response: InvitationResponse,
        now: i64,
    ) -> std::result::Result<MembershipStatus, Rejection> {
        let MembershipKey { dao, wallet } = membership;
        self.transact(dao, |ledger| {
            let entry = ledger
                .memberships
                .get_mut(&wallet)
                .ok_or(DaoError::UnknownMembership)?;
            entry.respond(&signer, response, now)?;
            let status = entry.status;

            if status == MembershipStatus::Accepted {
                ledger.dao.admit_member()?;
                ledger
                    .financial_records
                    .insert(wallet, FinancialRecord::open(dao, wallet, NO_BUMP));
            }
            Ok(status)
        })
    }

    // ---------------------------------------------------------------------
    // Treasury
    // ---------------------------------------------------------------------

    /// Returns the member's new cumulative deposit.
    pub fn deposit(
        &mut self,
        dao: Pubkey,
        signer: Pubkey,
        amount: u64,
        now: i64,
    ) -> std::result::Result<u64, Rejection> {
        self.transact(dao, |ledger| {
            if amount == 0 {
                return Err(DaoError::InvalidAmount.into());
            }
            if !ledger.is_accepted(&signer) {
                return Err(DaoError::NotAMember.into());
            }

            ledger.treasury = math::add(ledger.treasury, amount)?;
            ledger.dao.record_deposit(amount)?;

            let epoch = ledger.dao.withdrawal_epoch;
            let record = ledger
                .financial_records
                .get_mut(&signer)
                .ok_or(DaoError::NotAMember)?;
            record.record_deposit(amount, now, epoch)?;
            Ok(record.total_deposit_amount)
        })
    }

    // ---------------------------------------------------------------------
    // Proposals
    // ---------------------------------------------------------------------

    pub fn create_proposal(
        &mut self,
        dao: Pubkey,
        signer: Pubkey,
        terms: ProposalTerms,
        now: i64,
    ) -> std::result::Result<ProposalKey, Rejection> {
        self.transact(dao, |ledger| {
            let membership = ledger
                .memberships
                .get_mut(&signer)
                .filter(|membership| membership.is_accepted())
                .ok_or(DaoError::NotAMember)?;
            if !ledger.financial_records.contains_key(&signer) {
                return Err(DaoError::NotAMember.into());
            }

            let proposal = ledger.dao.open_proposal(dao, signer, terms, now, NO_BUMP)?;
            membership.record_proposal()?;

            let index = proposal.index;
            ledger.proposals.insert(index, proposal);
            Ok(ProposalKey { dao, index })
        })
    }

    /// Weight is the voter's deposit at the moment of voting. Returns the
    /// proposal state after the vote.
    ///
    /// Checked in order: the proposal is open, the signer is a member, the
    /// signer has not voted yet.
    pub fn cast_vote(
        &mut self,
        key: ProposalKey,
        signer: Pubkey,
        option: VoteOption,
        now: i64,
    ) -> std::result::Result<ProposalState, Rejection> {
        self.transact(key.dao, |ledger| {
            let proposal = ledger
                .proposals
                .get_mut(&key.index)
                .ok_or(DaoError::UnknownProposal)?;
            let before = proposal.snapshot(now);
            proposal
                .ensure_active(now)
                .map_err(|error| Rejection::with(error, before))?;

            let weight = ledger
                .financial_records
                .get(&signer)
                .map(|record| record.total_deposit_amount)
                .ok_or(Rejection::with(DaoError::NotAMember, before))?;
            if ledger.votes.contains_key(&(key.index, signer)) {
                return Err(Rejection::with(DaoError::AlreadyVoted, before));
            }

            proposal
                .cast_vote(option, weight, now)
                .map_err(|error| Rejection::with(error, before))?;
            let after = proposal.state;

            ledger.votes.insert(
                (key.index, signer),
                VoteRecord {
                    dao: key.dao,
                    proposal_index: key.index,
                    voter: signer,
                    option,
                    weight,
                    voted_at: now,
                    bump: NO_BUMP,
                },
            );
            Ok(after)
        })
    }

    /// Persists `Active → Expired` for a proposal past its deadline.
    pub fn expire(&mut self, key: ProposalKey, now: i64) -> std::result::Result<(), Rejection> {
        self.transact(key.dao, |ledger| {
            let proposal = ledger
                .proposals
                .get_mut(&key.index)
                .ok_or(DaoError::UnknownProposal)?;
            let before = proposal.snapshot(now);
            proposal
                .expire(now)
                .map_err(|error| Rejection::with(error, before))
        })
    }

    /// Moves the proposal's funds from the treasury into its release escrow.
    /// Any accepted member may execute.
    ///
    /// A withdrawal opens a new withdrawal epoch and freezes the DAO's
    /// financial power as the split denominator of its escrow.
    pub fn execute_proposal(
        &mut self,
        key: ProposalKey,
        signer: Pubkey,
        now: i64,
    ) -> std::result::Result<(), Rejection> {
        self.transact(key.dao, |ledger| {
            let executor_accepted = ledger.is_accepted(&signer);
            let proposal = ledger
                .proposals
                .get_mut(&key.index)
                .ok_or(DaoError::UnknownProposal)?;
            let before = proposal.snapshot(now);
            if !executor_accepted {
                return Err(Rejection::with(DaoError::Unauthorized, before));
            }

            proposal
                .begin_execution(now)
                .map_err(|error| Rejection::with(error, before))?;

            let escrow = match proposal.payload {
                ProposalPayload::Withdrawal { amount } => amount,
                ProposalPayload::Investing { schedule } => schedule.total_amount,
            };
            if ledger.treasury < escrow {
                return Err(Rejection::with(DaoError::InsufficientTreasury, before));
            }
            ledger.treasury = math::sub(ledger.treasury, escrow)?;

            match proposal.payload {
                ProposalPayload::Withdrawal { amount } => {
                    let epoch = ledger.dao.open_withdrawal_epoch()?;
                    ledger.withdrawals.insert(
                        key.index,
                        WithdrawalRelease::new(
                            key.dao,
                            key.index,
                            amount,
                            epoch,
                            ledger.dao.total_financial_power,
                            now,
                            NO_BUMP,
                        ),
                    );
                }
                ProposalPayload::Investing { schedule } => {
                    ledger.vestings.insert(
                        key.index,
                        VestingRelease::new(key.dao, key.index, schedule, now, NO_BUMP)?,
                    );
                }
            }
            Ok(())
        })
    }

    // ---------------------------------------------------------------------
    // Releases
    // ---------------------------------------------------------------------

    /// Pays the signer's share of a withdrawal escrow, once. The share is
    /// measured by the deposits the signer held when the proposal executed;
    /// later deposits do not count. The claim that exhausts the escrow
    /// returns its truncation dust to the treasury.
    pub fn withdraw_my_share(
        &mut self,
        key: ProposalKey,
        signer: Pubkey,
        now: i64,
    ) -> std::result::Result<u64, Rejection> {
        self.transact(key.dao, |ledger| {
            let proposal = ledger
                .proposals
                .get(&key.index)
                .ok_or(DaoError::UnknownProposal)?;
            if proposal.kind() != ProposalKind::Withdrawal {
                return Err(DaoError::WrongProposalKind.into());
            }
            let release = ledger
                .withdrawals
                .get_mut(&key.index)
                .ok_or(DaoError::NotExecuted)?;

            let record = ledger
                .financial_records
                .get_mut(&signer)
                .ok_or(DaoError::NotAMember)?;
            if ledger.withdrawal_records.contains_key(&(key.index, signer)) {
                return Err(DaoError::AlreadyClaimed.into());
            }

            let amount = release.claim(record.deposit_at_epoch(release.epoch))?;
            record.record_withdrawal(amount)?;
            let dust = release.sweep_dust();
            ledger.treasury = math::add(ledger.treasury, dust)?;

            ledger.withdrawal_records.insert(
                (key.index, signer),
                WithdrawalRecord {
                    dao: key.dao,
                    proposal_index: key.index,
                    wallet: signer,
                    amount,
                    claimed_at: now,
                    bump: NO_BUMP,
                },
            );
            Ok(amount)
        })
    }

    /// Pays the vesting receiver everything vested and not yet claimed.
    pub fn claim_vested(
        &mut self,
        key: ProposalKey,
        signer: Pubkey,
        now: i64,
    ) -> std::result::Result<u64, Rejection> {
        self.transact(key.dao, |ledger| {
            let proposal = ledger
                .proposals
                .get(&key.index)
                .ok_or(DaoError::UnknownProposal)?;
            if proposal.kind() != ProposalKind::Investing {
                return Err(DaoError::WrongProposalKind.into());
            }
            let release = ledger
                .vestings
                .get_mut(&key.index)
                .ok_or(DaoError::NotExecuted)?;
            Ok(release.claim(&signer, now)?)
        })
    }

    // ---------------------------------------------------------------------
    // Read projections
    // ---------------------------------------------------------------------

    pub fn dao(&self, dao: &Pubkey) -> Option<&Dao> {
        self.ledgers.get(dao).map(|ledger| &ledger.dao)
    }

    pub fn membership(&self, dao: Pubkey, wallet: Pubkey) -> Option<&Membership> {
        self.ledgers.get(&dao)?.memberships.get(&wallet)
    }

    pub fn financial_record(&self, dao: Pubkey, wallet: Pubkey) -> Option<&FinancialRecord> {
        self.ledgers.get(&dao)?.financial_records.get(&wallet)
    }

    pub fn financial_records(&self, dao: Pubkey) -> impl Iterator<Item = &FinancialRecord> {
        self.ledgers
            .get(&dao)
            .into_iter()
            .flat_map(|ledger| ledger.financial_records.values())
    }

    /// The proposal as seen at `now`: an overdue `Active` proposal reads as
    /// `Expired` without being written.
    pub fn proposal(&self, key: ProposalKey, now: i64) -> Option<Proposal> {
        let mut view = self.ledgers.get(&key.dao)?.proposals.get(&key.index)?.clone();
        view.refresh(now);
        Some(view)
    }

    pub fn vote(&self, key: ProposalKey, voter: Pubkey) -> Option<&VoteRecord> {
        self.ledgers.get(&key.dao)?.votes.get(&(key.index, voter))
    }

    pub fn withdrawal_release(&self, key: ProposalKey) -> Option<&WithdrawalRelease> {
        self.ledgers.get(&key.dao)?.withdrawals.get(&key.index)
    }

    pub fn withdrawal_record(&self, key: ProposalKey, wallet: Pubkey) -> Option<&WithdrawalRecord> {
        self.ledgers
            .get(&key.dao)?
            .withdrawal_records
            .get(&(key.index, wallet))
    }

    pub fn vesting_release(&self, key: ProposalKey) -> Option<&VestingRelease> {
        self.ledgers.get(&key.dao)?.vestings.get(&key.index)
    }

    pub fn treasury_balance(&self, dao: &Pubkey) -> Option<u64> {
        self.ledgers.get(dao).map(|ledger| ledger.treasury)
    }

    pub fn total_financial_power(&self, dao: &Pubkey) -> Option<u64> {
        self.dao(dao).map(|dao| dao.total_financial_power)
    }

    pub fn stake_percent(&self, dao: Pubkey, wallet: Pubkey) -> Option<StakeRatio> {
        let total = self.total_financial_power(&dao)?;
        self.financial_record(dao, wallet)
            .map(|record| record.stake(total))
    }

    pub fn claimable_vested(&self, key: ProposalKey, now: i64) -> Option<u64> {
        self.vesting_release(key)?.claimable(now).ok()
    }
}
