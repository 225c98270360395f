//! Ledger error types.
//!
//! Every variant is a recoverable, user-facing condition. The presentation
//! layer maps them to messages through [`ErrorTag`].

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{Cents, PayoutMethod};

/// Errors returned by [`RewardLedger`](crate::RewardLedger) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Not enough liquid learning points
    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: u64, available: u64 },

    /// Not enough staked points to release
    #[error("Insufficient staked points: requested {requested}, staked {staked}")]
    InsufficientStake { requested: u64, staked: u64 },

    /// Not enough cash
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Cents, available: Cents },

    /// Withdrawal under the platform minimum
    #[error("Withdrawal of {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: Cents, minimum: Cents },

    /// Payout method not linked to the account
    #[error("Payout method not linked: {0}")]
    MethodNotLinked(PayoutMethod),

    /// Withdrawal above the KYC ceiling on an unverified account
    #[error("Verification required for withdrawals above {ceiling}")]
    VerificationRequired { amount: Cents, ceiling: Cents },

    /// Gift target cannot be resolved
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Zero amount where a positive one is required
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// No account with this ID is open in the ledger
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// An account with this ID is already open
    #[error("Account already open: {0}")]
    AccountExists(String),

    /// Replaying the log does not reproduce the stored account
    #[error("Ledger replay mismatch for account {0}")]
    ReplayMismatch(String),

    /// Transaction log is malformed
    #[error("Corrupt transaction log: {0}")]
    CorruptLog(String),

    /// Invalid ledger configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Amount does not fit the balance representation
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl LedgerError {
    /// Stable tag for display-layer translation.
    pub fn tag(&self) -> ErrorTag {
        match self {
            Self::InsufficientPoints { .. } => ErrorTag::InsufficientPoints,
            Self::InsufficientStake { .. } => ErrorTag::InsufficientStake,
            Self::InsufficientFunds { .. } => ErrorTag::InsufficientFunds,
            Self::BelowMinimum { .. } => ErrorTag::BelowMinimum,
            Self::MethodNotLinked(_) => ErrorTag::MethodNotLinked,
            Self::VerificationRequired { .. } => ErrorTag::VerificationRequired,
            Self::InvalidRecipient(_) => ErrorTag::InvalidRecipient,
            Self::InvalidAmount(_) => ErrorTag::InvalidAmount,
            Self::UnknownAccount(_) => ErrorTag::UnknownAccount,
            Self::AccountExists(_)
            | Self::ReplayMismatch(_)
            | Self::CorruptLog(_)
            | Self::Config(_)
            | Self::ArithmeticOverflow => ErrorTag::Internal,
        }
    }
}

/// Failure tag handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorTag {
    AlreadyClaimed,
    InsufficientPoints,
    InsufficientStake,
    InsufficientFunds,
    BelowMinimum,
    MethodNotLinked,
    VerificationRequired,
    InvalidRecipient,
    InvalidAmount,
    UnknownAccount,
    Internal,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
