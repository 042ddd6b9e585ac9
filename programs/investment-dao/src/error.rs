//! Error definitions

use anchor_lang::prelude::*;

/// Result type of the host-independent transition methods.
pub type DaoResult<T> = std::result::Result<T, DaoError>;

#[error_code]
#[derive(PartialEq, Eq)]
pub enum DaoError {
    // validation
    #[msg("Invalid governance config: quorum must be 1-100 and voting period positive")]
    InvalidConfig,
    #[msg("Name too long")]
    NameTooLong,
    #[msg("Description too long")]
    DescriptionTooLong,
    #[msg("Amount must be greater than zero")]
    InvalidAmount,
    #[msg("Proposal payload does not match its kind")]
    InvalidPayload,

    // authorization
    #[msg("Unauthorized signer")]
    Unauthorized,
    #[msg("Signer is not an accepted member of the DAO")]
    NotAMember,

    // state
    #[msg("DAO with this name already exists")]
    DaoAlreadyExists,
    #[msg("Unknown DAO")]
    UnknownDao,
    #[msg("Unknown membership")]
    UnknownMembership,
    #[msg("Unknown proposal")]
    UnknownProposal,
    #[msg("Wallet already holds a membership")]
    AlreadyMember,
    #[msg("Membership is not in the invited state")]
    InvalidState,
    #[msg("Proposal is not open for voting")]
    ProposalNotActive,
    #[msg("Voting period has not ended")]
    VotingStillOpen,
    #[msg("Wallet already voted on this proposal")]
    AlreadyVoted,
    #[msg("Proposal has not passed")]
    NotPassed,
    #[msg("Proposal already executed")]
    AlreadyExecuted,
    #[msg("Proposal has not been executed")]
    NotExecuted,
    #[msg("Operation does not apply to this proposal kind")]
    WrongProposalKind,
    #[msg("Share already claimed")]
    AlreadyClaimed,
    #[msg("Nothing to claim")]
    NothingToClaim,

    // arithmetic
    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
    #[msg("Arithmetic underflow")]
    ArithmeticUnderflow,
    #[msg("Division by zero")]
    DivisionByZero,

    // resources
    #[msg("Treasury balance below requested amount")]
    InsufficientTreasury,
    #[msg("Escrow balance below requested amount")]
    InsufficientEscrow,
}

/// Coarse failure classes reported to the submitting transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Authorization,
    State,
    Arithmetic,
    Resource,
}

impl DaoError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DaoError::InvalidConfig
            | DaoError::NameTooLong
            | DaoError::DescriptionTooLong
            | DaoError::InvalidAmount
            | DaoError::InvalidPayload => ErrorClass::Validation,
            DaoError::Unauthorized | DaoError::NotAMember => ErrorClass::Authorization,
            DaoError::ArithmeticOverflow
            | DaoError::ArithmeticUnderflow
            | DaoError::DivisionByZero => ErrorClass::Arithmetic,
            DaoError::InsufficientTreasury | DaoError::InsufficientEscrow => ErrorClass::Resource,
            _ => ErrorClass::State,
        }
    }
}
