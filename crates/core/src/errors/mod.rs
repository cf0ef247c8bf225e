//! Error types and Result alias for the loyalty backend

use thiserror::Error;

/// Main error type for the loyalty backend
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Daily reward already claimed today")]
    AlreadyClaimedToday,

    #[error("You must be active in the game to claim this reward: your balance has not changed since your last reward")]
    ActivityRequired,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Raffle has already ended: {0}")]
    RaffleEnded(String),

    #[error("Raffle not found: {0}")]
    RaffleNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Store call timed out: {0}")]
    Timeout(String),

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// How a caller should treat an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input, rejected before any external call
    Validation,
    /// Expected, user-facing business outcome
    Denial,
    /// Infrastructure failure the caller may retry
    Transient,
    /// Anything else (corrupt data, bugs)
    Internal,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::InvalidArgument(_) | Error::PlayerNotFound(_) => ErrorClass::Validation,
            Error::AlreadyClaimedToday
            | Error::ActivityRequired
            | Error::InsufficientBalance { .. }
            | Error::RaffleEnded(_)
            | Error::RaffleNotFound(_) => ErrorClass::Denial,
            Error::DatabaseError(_) | Error::Timeout(_) | Error::Conflict(_) => {
                ErrorClass::Transient
            }
            Error::InvalidData(_) => ErrorClass::Internal,
        }
    }

    /// Business-rule denials are results, not failures
    pub fn is_denial(&self) -> bool {
        self.class() == ErrorClass::Denial
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
