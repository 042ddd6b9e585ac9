//! LiteSVM harness for the investment DAO program
//!
//! Instruction data is assembled by hand (Anchor discriminator followed by
//! borsh-encoded arguments) and account data is decoded field by field, so
//! the tests exercise the program purely through its wire format.

use std::path::PathBuf;
use std::str::FromStr;

use borsh::BorshDeserialize;
use litesvm::types::TransactionResult;
use litesvm::LiteSVM;
use solana_clock::Clock;
use solana_instruction::error::InstructionError;
use solana_instruction::{AccountMeta, Instruction};
use solana_keypair::Keypair;
use solana_message::Message;
use solana_native_token::LAMPORTS_PER_SOL;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_transaction::Transaction;
use solana_transaction_error::TransactionError;

pub const PROGRAM_ID: &str = "BH5sFYKYWSUGk7SVMftmakyEdPcdRjat2Xnah4jReUnV";

/// Anchor custom error codes, `6000 + variant index`.
pub mod error_code {
    pub const INVALID_AMOUNT: u32 = 6003;
    pub const UNAUTHORIZED: u32 = 6005;
    pub const INVALID_STATE: u32 = 6012;
    pub const VOTING_STILL_OPEN: u32 = 6014;
    pub const NOT_PASSED: u32 = 6016;
    pub const NOTHING_TO_CLAIM: u32 = 6021;
    pub const INSUFFICIENT_TREASURY: u32 = 6025;
}

/// Stored `ProposalState` discriminants.
pub mod proposal_state {
    pub const ACTIVE: u8 = 0;
    pub const PASSED: u8 = 1;
    pub const EXPIRED: u8 = 3;
    pub const EXECUTED: u8 = 4;
}

pub fn program_id() -> Pubkey {
    Pubkey::from_str(PROGRAM_ID).expect("valid program id")
}

fn read_program() -> Option<Vec<u8>> {
    let so_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()?
        .join("target/deploy/investment_dao.so");
    std::fs::read(so_path).ok()
}

pub fn discriminator(name: &str) -> [u8; 8] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(format!("global:{}", name).as_bytes());
    let result = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&result[..8]);
    disc
}

// ---------------------------------------------------------------------------
// PDAs
// ---------------------------------------------------------------------------

fn pda(seeds: &[&[u8]]) -> Pubkey {
    Pubkey::find_program_address(seeds, &program_id()).0
}

pub fn dao_pda(name: &str) -> Pubkey {
    pda(&[b"dao", name.as_bytes()])
}

pub fn treasury_pda(dao: &Pubkey) -> Pubkey {
    pda(&[b"treasury", dao.as_ref()])
}

pub fn membership_pda(dao: &Pubkey, wallet: &Pubkey) -> Pubkey {
    pda(&[b"membership", dao.as_ref(), wallet.as_ref()])
}

pub fn financial_record_pda(dao: &Pubkey, wallet: &Pubkey) -> Pubkey {
    pda(&[b"financial_record", dao.as_ref(), wallet.as_ref()])
}

pub fn proposal_pda(dao: &Pubkey, index: u64) -> Pubkey {
    pda(&[b"proposal", dao.as_ref(), &index.to_le_bytes()])
}

pub fn vote_pda(proposal: &Pubkey, voter: &Pubkey) -> Pubkey {
    pda(&[b"vote", proposal.as_ref(), voter.as_ref()])
}

pub fn withdrawal_pda(proposal: &Pubkey) -> Pubkey {
    pda(&[b"withdrawal", proposal.as_ref()])
}

pub fn withdrawal_record_pda(release: &Pubkey, wallet: &Pubkey) -> Pubkey {
    pda(&[b"withdrawal_record", release.as_ref(), wallet.as_ref()])
}

pub fn vesting_pda(proposal: &Pubkey) -> Pubkey {
    pda(&[b"vesting", proposal.as_ref()])
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

struct Args(Vec<u8>);

impl Args {
    fn new(instruction: &str) -> Self {
        Self(discriminator(instruction).to_vec())
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn string(self, value: &str) -> Self {
        self.bytes(&(value.len() as u32).to_le_bytes())
            .bytes(value.as_bytes())
    }
}

fn instruction(accounts: Vec<AccountMeta>, args: Args) -> Instruction {
    Instruction {
        program_id: program_id(),
        accounts,
        data: args.0,
    }
}

fn system_program() -> AccountMeta {
    AccountMeta::new_readonly(solana_sdk_ids::system_program::ID, false)
}

pub fn create_dao(authority: &Pubkey, name: &str, quorum_percent: u8, period: i64) -> Instruction {
    let dao = dao_pda(name);
    instruction(
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(dao, false),
            AccountMeta::new(treasury_pda(&dao), false),
            AccountMeta::new(membership_pda(&dao, authority), false),
            AccountMeta::new(financial_record_pda(&dao, authority), false),
            system_program(),
        ],
        Args::new("create_dao")
            .string(name)
            .bytes(&[quorum_percent])
            .bytes(&period.to_le_bytes()),
    )
}

pub fn invite_member(authority: &Pubkey, dao: &Pubkey, wallet: &Pubkey) -> Instruction {
    instruction(
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(*dao, false),
            AccountMeta::new_readonly(*wallet, false),
            AccountMeta::new(membership_pda(dao, wallet), false),
            system_program(),
        ],
        Args::new("invite_member"),
    )
}

pub fn accept_invitation(wallet: &Pubkey, dao: &Pubkey) -> Instruction {
    instruction(
        vec![
            AccountMeta::new(*wallet, true),
            AccountMeta::new(*dao, false),
            AccountMeta::new(membership_pda(dao, wallet), false),
            AccountMeta::new(financial_record_pda(dao, wallet), false),
            system_program(),
        ],
        Args::new("accept_invitation"),
    )
}

pub fn reject_invitation(wallet: &Pubkey, dao: &Pubkey) -> Instruction {
    instruction(
        vec![
            AccountMeta::new_readonly(*wallet, true),
            AccountMeta::new_readonly(*dao, false),
            AccountMeta::new(membership_pda(dao, wallet), false),
        ],
        Args::new("reject_invitation"),
    )
}

pub fn deposit(member: &Pubkey, dao: &Pubkey, amount: u64) -> Instruction {
    instruction(
        vec![
            AccountMeta::new(*member, true),
            AccountMeta::new(*dao, false),
            AccountMeta::new(treasury_pda(dao), false),
            AccountMeta::new_readonly(membership_pda(dao, member), false),
            AccountMeta::new(financial_record_pda(dao, member), false),
            system_program(),
        ],
        Args::new("deposit").bytes(&amount.to_le_bytes()),
    )
}

fn proposal_accounts(proposer: &Pubkey, dao: &Pubkey, index: u64) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*proposer, true),
        AccountMeta::new(*dao, false),
        AccountMeta::new(membership_pda(dao, proposer), false),
        AccountMeta::new(proposal_pda(dao, index), false),
        system_program(),
    ]
}

/// `index` must be the DAO's current proposal counter.
pub fn create_withdrawal_proposal(
    proposer: &Pubkey,
    dao: &Pubkey,
    index: u64,
    amount: u64,
) -> Instruction {
    instruction(
        proposal_accounts(proposer, dao, index),
        Args::new("create_proposal")
            .string("payout")
            .string("return capital to members")
            .bytes(&[0])
            .bytes(&[1])
            .bytes(&amount.to_le_bytes())
            .bytes(&[0]),
    )
}

/// Borsh mirror of `VestingSchedule`.
pub struct Schedule {
    pub receiver: Pubkey,
    pub total_amount: u64,
    pub amount_per_period: u64,
    pub period: i64,
    pub cliff: i64,
}

pub fn create_investing_proposal(
    proposer: &Pubkey,
    dao: &Pubkey,
    index: u64,
    schedule: &Schedule,
) -> Instruction {
    instruction(
        proposal_accounts(proposer, dao, index),
        Args::new("create_proposal")
            .string("seed round")
            .string("fund the startup")
            .bytes(&[1])
            .bytes(&[0])
            .bytes(&[1])
            .bytes(schedule.receiver.as_ref())
            .bytes(&schedule.total_amount.to_le_bytes())
            .bytes(&schedule.amount_per_period.to_le_bytes())
            .bytes(&schedule.period.to_le_bytes())
            .bytes(&schedule.cliff.to_le_bytes()),
    )
}

pub fn cast_vote(voter: &Pubkey, dao: &Pubkey, index: u64, yes: bool) -> Instruction {
    let proposal = proposal_pda(dao, index);
    instruction(
        vec![
            AccountMeta::new(*voter, true),
            AccountMeta::new_readonly(*dao, false),
            AccountMeta::new(proposal, false),
            AccountMeta::new_readonly(financial_record_pda(dao, voter), false),
            AccountMeta::new(vote_pda(&proposal, voter), false),
            system_program(),
        ],
        Args::new("cast_vote").bytes(&[if yes { 0 } else { 1 }]),
    )
}

pub fn finalize_proposal(caller: &Pubkey, dao: &Pubkey, index: u64) -> Instruction {
    instruction(
        vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new_readonly(*dao, false),
            AccountMeta::new(proposal_pda(dao, index), false),
        ],
        Args::new("finalize_proposal"),
    )
}

fn execute_accounts(executor: &Pubkey, dao: &Pubkey, index: u64, release: Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*executor, true),
        AccountMeta::new(*dao, false),
        AccountMeta::new(treasury_pda(dao), false),
        AccountMeta::new_readonly(membership_pda(dao, executor), false),
        AccountMeta::new(proposal_pda(dao, index), false),
        AccountMeta::new(release, false),
        system_program(),
    ]
}

pub fn execute_withdrawal(executor: &Pubkey, dao: &Pubkey, index: u64) -> Instruction {
    let release = withdrawal_pda(&proposal_pda(dao, index));
    instruction(
        execute_accounts(executor, dao, index, release),
        Args::new("execute_withdrawal"),
    )
}

pub fn execute_investing(executor: &Pubkey, dao: &Pubkey, index: u64) -> Instruction {
    let release = vesting_pda(&proposal_pda(dao, index));
    instruction(
        execute_accounts(executor, dao, index, release),
        Args::new("execute_investing"),
    )
}

pub fn withdraw_share(member: &Pubkey, dao: &Pubkey, index: u64) -> Instruction {
    let proposal = proposal_pda(dao, index);
    let release = withdrawal_pda(&proposal);
    instruction(
        vec![
            AccountMeta::new(*member, true),
            AccountMeta::new_readonly(*dao, false),
            AccountMeta::new(treasury_pda(dao), false),
            AccountMeta::new_readonly(proposal, false),
            AccountMeta::new(release, false),
            AccountMeta::new(financial_record_pda(dao, member), false),
            AccountMeta::new(withdrawal_record_pda(&release, member), false),
            system_program(),
        ],
        Args::new("withdraw_share"),
    )
}

pub fn claim_vested(receiver: &Pubkey, dao: &Pubkey, index: u64) -> Instruction {
    let proposal = proposal_pda(dao, index);
    instruction(
        vec![
            AccountMeta::new(*receiver, true),
            AccountMeta::new_readonly(proposal, false),
            AccountMeta::new(vesting_pda(&proposal), false),
        ],
        Args::new("claim_vested"),
    )
}

// ---------------------------------------------------------------------------
// Account views
// ---------------------------------------------------------------------------

struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self(&data[8..])
    }

    fn read<T: BorshDeserialize>(&mut self) -> T {
        T::deserialize(&mut self.0).expect("account layout")
    }

    fn skip_pubkey(&mut self) {
        self.read::<[u8; 32]>();
    }
}

#[derive(Debug)]
pub struct DaoView {
    pub name: String,
    pub proposals_count: u64,
    pub members_count: u32,
    pub total_financial_power: u64,
    pub withdrawal_epoch: u64,
}

#[derive(Debug)]
pub struct ProposalView {
    pub index: u64,
    pub vote_threshold: u64,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub state: u8,
    pub deadline: i64,
}

#[derive(Debug)]
pub struct FinancialRecordView {
    pub total_deposit_amount: u64,
    pub deposits_count: u32,
    pub total_withdrawn_amount: u64,
    /// `(epoch, deposited_before)`
    pub checkpoints: Vec<(u64, u64)>,
}

#[derive(Debug)]
pub struct WithdrawalReleaseView {
    pub escrow_total: u64,
    pub claimed_total: u64,
    pub claims_count: u32,
    pub exhausted: bool,
    pub epoch: u64,
    pub financial_power: u64,
    pub swept_dust: u64,
}

#[derive(Debug)]
pub struct VestingReleaseView {
    pub cliff_end: i64,
    pub claimed: u64,
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub svm: LiteSVM,
}

impl Harness {
    /// `None` when the program has not been built with `anchor build`.
    pub fn new(unix_timestamp: i64) -> Option<Self> {
        let Some(program) = read_program() else {
            eprintln!("target/deploy/investment_dao.so not found, skipping");
            return None;
        };
        let mut svm = LiteSVM::new();
        let _ = svm.add_program(program_id(), &program);

        let mut harness = Self { svm };
        harness.set_time(unix_timestamp);
        Some(harness)
    }

    pub fn funded_wallet(&mut self) -> Keypair {
        let wallet = Keypair::new();
        self.svm
            .airdrop(&wallet.pubkey(), 20 * LAMPORTS_PER_SOL)
            .expect("Airdrop failed");
        wallet
    }

    pub fn set_time(&mut self, unix_timestamp: i64) {
        let mut clock = self.svm.get_sysvar::<Clock>();
        clock.unix_timestamp = unix_timestamp;
        self.svm.set_sysvar(&clock);
    }

    /// Signs with `signers`, the first one paying. The blockhash is rotated
    /// first so that identical retries are not deduplicated.
    pub fn send(&mut self, ix: Instruction, signers: &[&Keypair]) -> TransactionResult {
        self.svm.expire_blockhash();
        let msg = Message::new(&[ix], Some(&signers[0].pubkey()));
        let tx = Transaction::new(signers, msg, self.svm.latest_blockhash());
        self.svm.send_transaction(tx)
    }

    pub fn lamports(&self, key: &Pubkey) -> u64 {
        self.svm
            .get_account(key)
            .map(|account| account.lamports)
            .unwrap_or(0)
    }

    /// Lamports above the rent-exempt reserve.
    pub fn spendable(&self, key: &Pubkey) -> u64 {
        let account = self.svm.get_account(key).expect("account exists");
        let reserve = self
            .svm
            .minimum_balance_for_rent_exemption(account.data.len());
        account.lamports - reserve
    }

    pub fn exists(&self, key: &Pubkey) -> bool {
        self.svm
            .get_account(key)
            .is_some_and(|account| !account.data.is_empty())
    }

    fn data(&self, key: &Pubkey) -> Vec<u8> {
        self.svm.get_account(key).expect("account exists").data
    }

    pub fn dao(&self, key: &Pubkey) -> DaoView {
        let data = self.data(key);
        let mut reader = Reader::new(&data);
        reader.skip_pubkey();
        let name = reader.read::<String>();
        reader.read::<u8>();
        reader.read::<i64>();
        let proposals_count = reader.read::<u64>();
        let members_count = reader.read::<u32>();
        reader.read::<u64>();
        DaoView {
            name,
            proposals_count,
            members_count,
            total_financial_power: reader.read(),
            withdrawal_epoch: reader.read(),
        }
    }

    pub fn membership_status(&self, key: &Pubkey) -> u8 {
        let data = self.data(key);
        let mut reader = Reader::new(&data);
        reader.skip_pubkey();
        reader.skip_pubkey();
        reader.read()
    }

    pub fn proposal(&self, key: &Pubkey) -> ProposalView {
        let data = self.data(key);
        let mut reader = Reader::new(&data);
        reader.skip_pubkey();
        reader.skip_pubkey();
        let index = reader.read::<u64>();
        reader.read::<String>();
        reader.read::<String>();
        if reader.read::<u8>() == 0 {
            reader.read::<u64>();
        } else {
            reader.skip_pubkey();
            reader.read::<[u8; 32]>();
        }
        let vote_threshold = reader.read();
        let yes_votes = reader.read();
        let no_votes = reader.read();
        let state = reader.read();
        reader.read::<i64>();
        ProposalView {
            index,
            vote_threshold,
            yes_votes,
            no_votes,
            state,
            deadline: reader.read(),
        }
    }

    pub fn financial_record(&self, key: &Pubkey) -> FinancialRecordView {
        let data = self.data(key);
        let mut reader = Reader::new(&data);
        reader.skip_pubkey();
        reader.skip_pubkey();
        let total_deposit_amount = reader.read();
        reader.read::<i64>();
        let deposits_count = reader.read();
        let total_withdrawn_amount = reader.read();
        reader.read::<u8>();
        FinancialRecordView {
            total_deposit_amount,
            deposits_count,
            total_withdrawn_amount,
            checkpoints: reader.read(),
        }
    }

    pub fn withdrawal_release(&self, key: &Pubkey) -> WithdrawalReleaseView {
        let data = self.data(key);
        let mut reader = Reader::new(&data);
        reader.skip_pubkey();
        reader.read::<u64>();
        let escrow_total = reader.read();
        let claimed_total = reader.read();
        let claims_count = reader.read();
        let exhausted = reader.read();
        let epoch = reader.read();
        let financial_power = reader.read();
        reader.read::<u64>();
        WithdrawalReleaseView {
            escrow_total,
            claimed_total,
            claims_count,
            exhausted,
            epoch,
            financial_power,
            swept_dust: reader.read(),
        }
    }

    pub fn vesting_release(&self, key: &Pubkey) -> VestingReleaseView {
        let data = self.data(key);
        let mut reader = Reader::new(&data);
        reader.skip_pubkey();
        reader.read::<u64>();
        // schedule: receiver, total, per period, period, cliff
        reader.skip_pubkey();
        reader.read::<[u8; 32]>();
        VestingReleaseView {
            cliff_end: reader.read(),
            claimed: reader.read(),
        }
    }
}

/// The custom program error a failed transaction ended with.
pub fn custom_error(result: &TransactionResult) -> Option<u32> {
    match result {
        Err(failure) => match failure.err {
            TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(code),
            _ => None,
        },
        Ok(_) => None,
    }
}

/// Whether a failed transaction logged `needle`.
pub fn logged(result: &TransactionResult, needle: &str) -> bool {
    match result {
        Err(failure) => failure.meta.logs.iter().any(|line| line.contains(needle)),
        Ok(meta) => meta.logs.iter().any(|line| line.contains(needle)),
    }
}
