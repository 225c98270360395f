//! Append-only transaction log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::error::{LedgerError, Result};
use crate::types::PayoutMethod;

/// What a transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Lesson or chapter reward
    Earn,
    /// Points moved into the staked bucket
    Stake,
    /// Points moved back out of the staked bucket
    Unstake,
    /// Cash paid out to a linked method
    Withdraw,
    /// Cash gifted to another account
    GiftSent,
    /// Cash gifted by another account
    GiftReceived,
    /// Referral bonus
    Referral,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earn => "EARN",
            Self::Stake => "STAKE",
            Self::Unstake => "UNSTAKE",
            Self::Withdraw => "WITHDRAW",
            Self::GiftSent => "GIFT_SENT",
            Self::GiftReceived => "GIFT_RECEIVED",
            Self::Referral => "REFERRAL",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed point movements, one per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PointDeltas {
    pub learning: i64,
    pub staked: i64,
}

impl PointDeltas {
    pub fn learning(delta: i64) -> Self {
        Self {
            learning: delta,
            staked: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.learning == 0 && self.staked == 0
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Monotonic ID, unique within the ledger
    pub id: u64,
    /// Account whose balances moved
    pub account_id: String,
    pub kind: TransactionKind,
    /// Signed cash movement in cents
    pub amount_cash: i64,
    pub amount_points: PointDeltas,
    /// Metadata only; never an input to balance math
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Shared by both legs of a gift
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Payout method, for withdrawals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<PayoutMethod>,
}

/// A transaction before the log assigns it an ID.
#[derive(Debug, Clone)]
pub(crate) struct TransactionDraft {
    pub account_id: String,
    pub kind: TransactionKind,
    pub amount_cash: i64,
    pub amount_points: PointDeltas,
    pub description: String,
    pub correlation_id: Option<String>,
    pub method: Option<PayoutMethod>,
}

impl TransactionDraft {
    pub fn new(account_id: &str, kind: TransactionKind, description: impl Into<String>) -> Self {
        Self {
            account_id: account_id.to_string(),
            kind,
            amount_cash: 0,
            amount_points: PointDeltas::default(),
            description: description.into(),
            correlation_id: None,
            method: None,
        }
    }

    pub fn cash(mut self, delta: i64) -> Self {
        self.amount_cash = delta;
        self
    }

    pub fn points(mut self, deltas: PointDeltas) -> Self {
        self.amount_points = deltas;
        self
    }

    pub fn correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn method(mut self, method: PayoutMethod) -> Self {
        self.method = Some(method);
        self
    }
}

/// Ordered, append-only transaction log.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
    next_id: u64,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a log from persisted entries.
    ///
    /// IDs must be strictly increasing.
    pub fn from_entries(entries: Vec<Transaction>) -> Result<Self> {
        let mut last = 0u64;
        for tx in &entries {
            if tx.id <= last {
                return Err(LedgerError::CorruptLog(format!(
                    "transaction id {} follows {}",
                    tx.id, last
                )));
            }
            last = tx.id;
        }
        let next_id = last.checked_add(1).ok_or_else(|| {
            LedgerError::CorruptLog(format!("transaction id {} leaves no room for another entry", last))
        })?;
        Ok(Self { entries, next_id })
    }

    /// ID the next appended transaction will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id.max(1)
    }

    /// Check that `count` more entries can be appended without exhausting IDs.
    pub(crate) fn reserve(&self, count: u64) -> Result<()> {
        self.next_id()
            .checked_add(count)
            .map(|_| ())
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    pub(crate) fn append(&mut self, draft: TransactionDraft, timestamp: DateTime<Utc>) -> Transaction {
        let tx = Transaction {
            id: self.next_id(),
            account_id: draft.account_id,
            kind: draft.kind,
            amount_cash: draft.amount_cash,
            amount_points: draft.amount_points,
            timestamp,
            description: draft.description,
            correlation_id: draft.correlation_id,
            method: draft.method,
        };
        // reserve() keeps the last usable id below u64::MAX
        self.next_id = tx.id.saturating_add(1);
        self.entries.push(tx.clone());
        tx
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Transaction> {
        self.entries
            .binary_search_by_key(&id, |tx| tx.id)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Entries for one account, oldest first.
    pub fn for_account<'a>(&'a self, account_id: &'a str) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.entries.iter().filter(move |tx| tx.account_id == account_id)
    }

    /// Most recent entries for an account, newest first.
    pub fn recent(&self, account_id: &str, limit: usize) -> Vec<&Transaction> {
        self.entries
            .iter()
            .rev()
            .filter(|tx| tx.account_id == account_id)
            .take(limit)
            .collect()
    }

    /// Entries of one kind for an account, oldest first.
    pub fn by_kind(&self, account_id: &str, kind: TransactionKind) -> Vec<&Transaction> {
        self.entries
            .iter()
            .filter(|tx| tx.account_id == account_id && tx.kind == kind)
            .collect()
    }

    /// Both legs of a gift.
    pub fn correlated(&self, correlation_id: &str) -> Vec<&Transaction> {
        self.entries
            .iter()
            .filter(|tx| tx.correlation_id.as_deref() == Some(correlation_id))
            .collect()
    }
}
