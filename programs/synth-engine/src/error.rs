use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    program_error::{PrintProgramError, ProgramError},
    pubkey::Pubkey,
};
use thiserror::Error;

/// Failure reported by an external capability (oracle, collateral asset, debt token).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient allowance")]
    InsufficientAllowance,

    #[error("Price is stale (as of {as_of})")]
    StalePrice { as_of: i64 },

    #[error("Price is invalid")]
    InvalidPrice,

    #[error("Unknown price feed {0}")]
    UnknownFeed(Pubkey),

    #[error("Call rejected: {0}")]
    Rejected(String),
}

/// Coarse classification of engine failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected inputs or configuration
    Validation,
    /// A ledger balance too small for the request
    InsufficientState,
    /// Fixed-point overflow or a zero divisor
    Arithmetic,
    ExternalCallFailure,
    /// Health factor rules
    InvariantViolation,
    /// Entry while another operation is in flight
    Reentrancy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthEngineError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Collateral asset {0} is not registered")]
    AssetNotAllowed(Pubkey),

    #[error("Collateral assets ({assets}) and price feeds ({feeds}) differ in length")]
    ConfigLengthMismatch { assets: usize, feeds: usize },

    #[error("Collateral asset {0} registered twice")]
    DuplicateAsset(Pubkey),

    #[error("No collateral token capability for asset {0}")]
    MissingCollateralToken(Pubkey),

    #[error("Debt token capability {found} does not match configured {expected}")]
    DebtTokenMismatch { expected: Pubkey, found: Pubkey },

    #[error("Invalid config account data")]
    InvalidConfig,

    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    #[error("Oracle unavailable for asset {asset}: {source}")]
    OracleUnavailable {
        asset: Pubkey,
        #[source]
        source: CapabilityError,
    },

    #[error("Transfer failed: {0}")]
    TransferFailed(#[source] CapabilityError),

    #[error("Mint failed: {0}")]
    MintFailed(#[source] CapabilityError),

    #[error("Burn failed: {0}")]
    BurnFailed(#[source] CapabilityError),

    #[error("Health factor broken: {0}")]
    HealthFactorBroken(u128),

    #[error("Health factor is above the liquidation minimum")]
    HealthFactorOk,

    #[error("Liquidation did not improve health factor")]
    HealthFactorNotImproved,

    #[error("Reentrant call rejected")]
    ReentrantCall,

    #[error("{original}; {stranded} transfer(s) could not be undone and stay on the ledger")]
    CompensationFailed {
        #[source]
        original: Box<SynthEngineError>,
        stranded: usize,
    },
}

impl SynthEngineError {
    pub fn kind(&self) -> ErrorKind {
        use SynthEngineError::*;
        match self {
            ZeroAmount
            | AssetNotAllowed(_)
            | ConfigLengthMismatch { .. }
            | DuplicateAsset(_)
            | MissingCollateralToken(_)
            | DebtTokenMismatch { .. }
            | InvalidConfig
            | InvalidInstruction => ErrorKind::Validation,
            InsufficientBalance { .. } => ErrorKind::InsufficientState,
            ArithmeticOverflow | DivisionByZero => ErrorKind::Arithmetic,
            OracleUnavailable { .. }
            | TransferFailed(_)
            | MintFailed(_)
            | BurnFailed(_)
            | CompensationFailed { .. } => ErrorKind::ExternalCallFailure,
            HealthFactorBroken(_) | HealthFactorOk | HealthFactorNotImproved => {
                ErrorKind::InvariantViolation
            }
            ReentrantCall => ErrorKind::Reentrancy,
        }
    }

    pub fn code(&self) -> ErrorCode {
        use SynthEngineError::*;
        match self {
            ZeroAmount => ErrorCode::ZeroAmount,
            AssetNotAllowed(_) => ErrorCode::AssetNotAllowed,
            ConfigLengthMismatch { .. } => ErrorCode::ConfigLengthMismatch,
            DuplicateAsset(_) => ErrorCode::DuplicateAsset,
            MissingCollateralToken(_) => ErrorCode::MissingCollateralToken,
            DebtTokenMismatch { .. } => ErrorCode::DebtTokenMismatch,
            InvalidConfig => ErrorCode::InvalidConfig,
            InvalidInstruction => ErrorCode::InvalidInstruction,
            ArithmeticOverflow => ErrorCode::ArithmeticOverflow,
            DivisionByZero => ErrorCode::DivisionByZero,
            InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            OracleUnavailable { .. } => ErrorCode::OracleUnavailable,
            TransferFailed(_) => ErrorCode::TransferFailed,
            MintFailed(_) => ErrorCode::MintFailed,
            BurnFailed(_) => ErrorCode::BurnFailed,
            HealthFactorBroken(_) => ErrorCode::HealthFactorBroken,
            HealthFactorOk => ErrorCode::HealthFactorOk,
            HealthFactorNotImproved => ErrorCode::HealthFactorNotImproved,
            ReentrantCall => ErrorCode::ReentrantCall,
            CompensationFailed { .. } => ErrorCode::CompensationFailed,
        }
    }
}

/// Stable numeric codes surfaced through `ProgramError::Custom`.
#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum ErrorCode {
    #[error("Amount must be greater than zero")]
    ZeroAmount = 0,

    #[error("Collateral asset not registered")]
    AssetNotAllowed = 1,

    #[error("Collateral assets and price feeds differ in length")]
    ConfigLengthMismatch = 2,

    #[error("Duplicate collateral asset")]
    DuplicateAsset = 3,

    #[error("Missing collateral token capability")]
    MissingCollateralToken = 4,

    #[error("Debt token mismatch")]
    DebtTokenMismatch = 5,

    #[error("Invalid config")]
    InvalidConfig = 6,

    #[error("Invalid instruction")]
    InvalidInstruction = 7,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 8,

    #[error("Division by zero")]
    DivisionByZero = 9,

    #[error("Insufficient balance")]
    InsufficientBalance = 10,

    #[error("Oracle unavailable")]
    OracleUnavailable = 11,

    #[error("Transfer failed")]
    TransferFailed = 12,

    #[error("Mint failed")]
    MintFailed = 13,

    #[error("Burn failed")]
    BurnFailed = 14,

    #[error("Health factor broken")]
    HealthFactorBroken = 15,

    #[error("Health factor ok")]
    HealthFactorOk = 16,

    #[error("Health factor not improved")]
    HealthFactorNotImproved = 17,

    #[error("Reentrant call")]
    ReentrantCall = 18,

    #[error("Compensation failed")]
    CompensationFailed = 19,
}

impl PrintProgramError for ErrorCode {
    fn print<E>(&self) {
        use solana_program::msg;
        msg!("SynthEngineError: {}", self);
    }
}

impl From<ErrorCode> for ProgramError {
    fn from(e: ErrorCode) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl From<SynthEngineError> for ProgramError {
    fn from(e: SynthEngineError) -> Self {
        e.code().into()
    }
}

impl<T> DecodeError<T> for ErrorCode {
    fn type_of() -> &'static str {
        "SynthEngineError"
    }
}
