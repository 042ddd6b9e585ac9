//! PDA seeds and size limits

pub const DAO_SEED: &[u8] = b"dao";
pub const TREASURY_SEED: &[u8] = b"treasury";
pub const MEMBERSHIP_SEED: &[u8] = b"membership";
pub const FINANCIAL_RECORD_SEED: &[u8] = b"financial_record";
pub const PROPOSAL_SEED: &[u8] = b"proposal";
pub const VOTE_SEED: &[u8] = b"vote";
pub const WITHDRAWAL_SEED: &[u8] = b"withdrawal";
pub const WITHDRAWAL_RECORD_SEED: &[u8] = b"withdrawal_record";
pub const VESTING_SEED: &[u8] = b"vesting";

/// DAO and proposal names. A DAO name is also a PDA seed, so it cannot exceed 32 bytes.
pub const MAX_NAME_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 128;

pub const PERCENT_DENOMINATOR: u64 = 100;
pub const BASIS_POINTS: u64 = 10_000;
