//! Dual-currency reward ledger for the Learner Choice platform
//!
//! Accounts hold two currencies:
//!
//! - **Cash**: spendable balance in integer cents, paid out through linked methods
//! - **Learning Points**: non-liquid points, split into liquid and staked buckets
//!
//! Staked points raise the earning multiplier (`1 + staked / 1000`), which
//! scales cash rewards. Points rewards are never multiplied.
//!
//! # Key Components
//!
//! - [`RewardLedger`]: The only component that moves balances
//! - [`TransactionLog`]: Append-only record of every balance movement
//! - [`replay`](replay::replay): Rebuilds balances from opening state and the log
//! - [`render_ledger_report`]: Plain-text audit export
//!
//! # Example
//!
//! ```ignore
//! use reward_ledger::{Account, Cents, LedgerConfig, RewardLedger, RewardUnit};
//!
//! let mut ledger = RewardLedger::new(LedgerConfig::default())?;
//! ledger.open_account(Account::new("u1", "Alex Johnson", today))?;
//!
//! let lesson = RewardUnit::new("l1", 20, Cents::from_dollars(5));
//! ledger.claim_reward("u1", "course-1", &lesson)?;
//! ledger.stake("u1", 20)?;
//! ```

pub mod account;
pub mod clock;
pub mod completion;
pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod replay;
pub mod rewards;
pub mod snapshot;
pub mod transaction;
pub mod types;

// Re-export main types
pub use account::{Account, Balances, SavingsGoal};
pub use clock::{Clock, FixedClock, SystemClock};
pub use completion::CompletionRecord;
pub use config::LedgerConfig;
pub use error::{ErrorTag, LedgerError, Result};
pub use export::{render_ledger_report, report_file_name};
pub use ledger::{Claim, GiftReceipt, RewardLedger};
pub use snapshot::{AccountState, LedgerSnapshot};
pub use transaction::{PointDeltas, Transaction, TransactionKind, TransactionLog};
pub use types::*;
