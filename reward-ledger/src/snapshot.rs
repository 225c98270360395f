//! Serializable ledger state.
//!
//! A snapshot carries everything replay needs: each account with its opening
//! balances and completion records, plus the full transaction log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::account::{Account, Balances};
use crate::completion::CompletionRecord;
use crate::transaction::Transaction;

/// One account as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub account: Account,
    /// Balances when the account was opened; the replay baseline
    pub opening: Balances,
    /// Claimed unit IDs keyed by course or book ID
    #[serde(default)]
    pub completions: BTreeMap<String, CompletionRecord>,
}

/// Full ledger state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub accounts: Vec<AccountState>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    pub fn account(&self, account_id: &str) -> Option<&AccountState> {
        self.accounts
            .iter()
            .find(|state| state.account.id() == account_id)
    }
}
