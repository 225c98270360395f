//! Wallet error types.

use reward_ledger::LedgerError;

use crate::catalog::CatalogError;
use crate::store::StoreError;

/// Errors surfaced by [`WalletSession`](crate::WalletSession).
///
/// Recoverable ledger rejections are not errors at this layer; they come back
/// as tags on an [`IntentOutcome`](crate::IntentOutcome). Only internal
/// ledger failures reach this enum.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// Nothing stored under the session key
    #[error("No active session")]
    NoSession,

    /// Stored session is inconsistent with its own ledger
    #[error("Corrupt session: {0}")]
    CorruptSession(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WalletError>;
