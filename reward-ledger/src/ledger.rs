//! RewardLedger - the single authority for balance-affecting operations.
//!
//! Every operation validates first and mutates last, so a failed operation
//! leaves accounts and the log untouched. Balances are always derived by
//! applying the logged deltas, which keeps the account and the fold of its
//! transactions in lockstep.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::account::{Account, Balances};
use crate::clock::{Clock, SystemClock};
use crate::completion::CompletionRecord;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::replay;
use crate::rewards;
use crate::snapshot::{AccountState, LedgerSnapshot};
use crate::transaction::{PointDeltas, Transaction, TransactionDraft, TransactionKind, TransactionLog};
use crate::types::{Cents, PayoutMethod, RewardUnit, Role};

/// Result of a reward claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Reward paid; the EARN transaction
    Claimed(Transaction),
    /// Unit was already claimed; nothing changed
    AlreadyClaimed,
}

impl Claim {
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Claimed(tx) => Some(tx),
            Self::AlreadyClaimed => None,
        }
    }
}

/// Both legs of a gift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftReceipt {
    pub correlation_id: String,
    pub sent: Transaction,
    pub received: Transaction,
}

#[derive(Debug, Clone)]
struct AccountEntry {
    account: Account,
    opening: Balances,
    completions: BTreeMap<String, CompletionRecord>,
}

/// Applies reward, staking, withdrawal, gift and referral events to accounts.
pub struct RewardLedger {
    config: LedgerConfig,
    accounts: BTreeMap<String, AccountEntry>,
    log: TransactionLog,
    clock: Arc<dyn Clock>,
}

impl RewardLedger {
    /// Create an empty ledger.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            accounts: BTreeMap::new(),
            log: TransactionLog::new(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Use a different timestamp source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Rebuild a ledger from a snapshot, verifying every account against its log.
    pub fn from_snapshot(config: LedgerConfig, snapshot: LedgerSnapshot) -> Result<Self> {
        let mut ledger = Self::new(config)?;
        ledger.log = TransactionLog::from_entries(snapshot.transactions)?;

        for state in snapshot.accounts {
            let id = state.account.id().to_string();
            if ledger.accounts.contains_key(&id) {
                return Err(LedgerError::AccountExists(id));
            }
            ledger.accounts.insert(
                id,
                AccountEntry {
                    account: state.account,
                    opening: state.opening,
                    completions: state.completions,
                },
            );
        }

        if let Some(orphan) = ledger
            .log
            .entries()
            .iter()
            .find(|tx| !ledger.accounts.contains_key(&tx.account_id))
        {
            return Err(LedgerError::CorruptLog(format!(
                "transaction {} references unknown account {}",
                orphan.id, orphan.account_id
            )));
        }

        for id in ledger.accounts.keys() {
            if !ledger.verify(id)? {
                return Err(LedgerError::ReplayMismatch(id.clone()));
            }
        }

        debug!(
            accounts = ledger.accounts.len(),
            transactions = ledger.log.len(),
            "Restored ledger from snapshot"
        );
        Ok(ledger)
    }

    /// Capture accounts, opening balances, completions and the full log.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self
                .accounts
                .values()
                .map(|entry| AccountState {
                    account: entry.account.clone(),
                    opening: entry.opening,
                    completions: entry.completions.clone(),
                })
                .collect(),
            transactions: self.log.entries().to_vec(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open an account. Its current balances become the replay baseline.
    pub fn open_account(&mut self, account: Account) -> Result<()> {
        let id = account.id().to_string();
        if self.accounts.contains_key(&id) {
            return Err(LedgerError::AccountExists(id));
        }

        debug!(account_id = %id, "Opened account");
        self.accounts.insert(
            id,
            AccountEntry {
                opening: account.balances(),
                account,
                completions: BTreeMap::new(),
            },
        );
        Ok(())
    }

    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.get(account_id).map(|entry| &entry.account)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values().map(|entry| &entry.account)
    }

    /// Find an account by ID or referral code.
    pub fn resolve(&self, reference: &str) -> Option<&Account> {
        if let Some(entry) = self.accounts.get(reference.trim()) {
            return Some(&entry.account);
        }
        self.accounts()
            .find(|account| account.matches_reference(reference))
    }

    pub fn opening_balances(&self, account_id: &str) -> Option<Balances> {
        self.accounts.get(account_id).map(|entry| entry.opening)
    }

    pub fn completion(&self, account_id: &str, scope_id: &str) -> Option<&CompletionRecord> {
        self.accounts
            .get(account_id)
            .and_then(|entry| entry.completions.get(scope_id))
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Transactions for an account, oldest first.
    pub fn history(&self, account_id: &str) -> Vec<&Transaction> {
        self.log
            .entries()
            .iter()
            .filter(|tx| tx.account_id == account_id)
            .collect()
    }

    /// Fold an account's transactions over its opening balances.
    pub fn replay(&self, account_id: &str) -> Result<Balances> {
        let entry = self.entry(account_id)?;
        replay::replay(entry.opening, self.log.for_account(account_id))
    }

    /// Whether the replayed balances equal the live account.
    pub fn verify(&self, account_id: &str) -> Result<bool> {
        let replayed = self.replay(account_id)?;
        Ok(replayed == self.entry(account_id)?.account.balances())
    }

    /// Pay out a lesson or chapter reward once per unit and scope.
    ///
    /// Cash is scaled by the account's earning multiplier; points are not.
    pub fn claim_reward(&mut self, account_id: &str, scope_id: &str, unit: &RewardUnit) -> Result<Claim> {
        let entry = self.entry(account_id)?;
        if entry
            .completions
            .get(scope_id)
            .is_some_and(|record| record.contains(&unit.id))
        {
            debug!(account_id, scope_id, unit_id = %unit.id, "Reward already claimed");
            return Ok(Claim::AlreadyClaimed);
        }

        let cash = rewards::scaled_reward(unit.reward_cash, entry.account.staked_points())
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let label = if unit.title.is_empty() { &unit.id } else { &unit.title };
        let draft = TransactionDraft::new(account_id, TransactionKind::Earn, format!("Reward: {}", label))
            .cash(signed(cash)?)
            .points(PointDeltas::learning(signed_points(unit.reward_points)?));

        let next = self.prepare(account_id, &draft)?;
        let tx = self.apply(account_id, next, draft);
        if let Some(entry) = self.accounts.get_mut(account_id) {
            entry
                .completions
                .entry(scope_id.to_string())
                .or_default()
                .insert(&unit.id);
        }

        debug!(
            account_id,
            scope_id,
            unit_id = %unit.id,
            cash = %cash,
            points = unit.reward_points,
            "Reward claimed"
        );
        Ok(Claim::Claimed(tx))
    }

    /// Move liquid points into the staked bucket.
    pub fn stake(&mut self, account_id: &str, points: u64) -> Result<Transaction> {
        if points == 0 {
            return Err(LedgerError::InvalidAmount("stake must be at least 1 point".to_string()));
        }
        let account = &self.entry(account_id)?.account;
        if account.learning_points() < points {
            return Err(LedgerError::InsufficientPoints {
                requested: points,
                available: account.learning_points(),
            });
        }

        let delta = signed_points(points)?;
        let staked_after = account
            .staked_points()
            .checked_add(points)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let draft = TransactionDraft::new(
            account_id,
            TransactionKind::Stake,
            format!(
                "Staked {} LP for {:.1}x earning multiplier",
                points,
                rewards::earning_multiplier(staked_after)
            ),
        )
        .points(PointDeltas {
            learning: -delta,
            staked: delta,
        });

        let next = self.prepare(account_id, &draft)?;
        let tx = self.apply(account_id, next, draft);
        debug!(account_id, points, staked = next.staked_points, "Points staked");
        Ok(tx)
    }

    /// Move staked points back to the liquid bucket.
    pub fn unstake(&mut self, account_id: &str, points: u64) -> Result<Transaction> {
        if points == 0 {
            return Err(LedgerError::InvalidAmount("unstake must be at least 1 point".to_string()));
        }
        let account = &self.entry(account_id)?.account;
        if account.staked_points() < points {
            return Err(LedgerError::InsufficientStake {
                requested: points,
                staked: account.staked_points(),
            });
        }

        let delta = signed_points(points)?;
        let draft = TransactionDraft::new(account_id, TransactionKind::Unstake, format!("Unstaked {} LP", points))
            .points(PointDeltas {
                learning: delta,
                staked: -delta,
            });

        let next = self.prepare(account_id, &draft)?;
        let tx = self.apply(account_id, next, draft);
        debug!(account_id, points, staked = next.staked_points, "Points unstaked");
        Ok(tx)
    }

    /// Pay cash out to a linked method.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// linked method, minimum amount, verification ceiling, balance.
    pub fn withdraw(&mut self, account_id: &str, amount: Cents, method: PayoutMethod) -> Result<Transaction> {
        let account = &self.entry(account_id)?.account;

        let rejection = if !account.is_linked(method) {
            Some(LedgerError::MethodNotLinked(method))
        } else if amount < self.config.min_withdrawal {
            Some(LedgerError::BelowMinimum {
                amount,
                minimum: self.config.min_withdrawal,
            })
        } else if self.config.kyc_required && !account.is_verified() && amount > self.config.kyc_ceiling {
            Some(LedgerError::VerificationRequired {
                amount,
                ceiling: self.config.kyc_ceiling,
            })
        } else if amount > account.cash_balance() {
            Some(LedgerError::InsufficientFunds {
                requested: amount,
                available: account.cash_balance(),
            })
        } else {
            None
        };

        if let Some(err) = rejection {
            warn!(account_id, amount = %amount, method = %method, error = %err, "Withdrawal rejected");
            return Err(err);
        }
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("withdrawal must be positive".to_string()));
        }

        let draft = TransactionDraft::new(account_id, TransactionKind::Withdraw, format!("Withdrawal to {}", method))
            .cash(-signed(amount)?)
            .method(method);

        let next = self.prepare(account_id, &draft)?;
        let tx = self.apply(account_id, next, draft);
        info!(account_id, amount = %amount, method = %method, "Withdrawal recorded");
        Ok(tx)
    }

    /// Move cash from one account to another.
    ///
    /// The recipient may be named by account ID or referral code.
    pub fn gift(&mut self, sender_id: &str, recipient_ref: &str, amount: Cents) -> Result<GiftReceipt> {
        let sender = &self.entry(sender_id)?.account;
        let recipient = self
            .resolve(recipient_ref)
            .ok_or_else(|| LedgerError::InvalidRecipient(recipient_ref.to_string()))?;
        if recipient.id() == sender.id() {
            return Err(LedgerError::InvalidRecipient("cannot gift to yourself".to_string()));
        }
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("gift must be positive".to_string()));
        }
        if amount > sender.cash_balance() {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: sender.cash_balance(),
            });
        }

        let recipient_id = recipient.id().to_string();
        let correlation_id = format!("gift-{}", self.log.next_id());
        let cash = signed(amount)?;
        let sent_draft = TransactionDraft::new(
            sender_id,
            TransactionKind::GiftSent,
            format!("Gift to {}", recipient.name()),
        )
        .cash(-cash)
        .correlation(correlation_id.clone());
        let received_draft = TransactionDraft::new(
            &recipient_id,
            TransactionKind::GiftReceived,
            format!("Gift from {}", sender.name()),
        )
        .cash(cash)
        .correlation(correlation_id.clone());

        self.log.reserve(2)?;
        let sender_next = self.prepare(sender_id, &sent_draft)?;
        let recipient_next = self.prepare(&recipient_id, &received_draft)?;
        let sent = self.apply(sender_id, sender_next, sent_draft);
        let received = self.apply(&recipient_id, recipient_next, received_draft);

        info!(
            sender_id,
            recipient_id = %recipient_id,
            amount = %amount,
            correlation_id = %correlation_id,
            "Gift transferred"
        );
        Ok(GiftReceipt {
            correlation_id,
            sent,
            received,
        })
    }

    /// Credit a referrer with a percentage of what their referee earned.
    pub fn apply_referral_bonus(&mut self, referrer_id: &str, earned: Cents, percentage: u32) -> Result<Transaction> {
        let account = &self.entry(referrer_id)?.account;
        let bonus = rewards::referral_bonus(earned, percentage).ok_or(LedgerError::ArithmeticOverflow)?;
        let total = account
            .total_referral_earnings()
            .checked_add(bonus)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        let draft = TransactionDraft::new(
            referrer_id,
            TransactionKind::Referral,
            format!("Referral bonus: {}% of {}", percentage, earned),
        )
        .cash(signed(bonus)?);

        let next = self.prepare(referrer_id, &draft)?;
        let tx = self.apply(referrer_id, next, draft);
        if let Some(entry) = self.accounts.get_mut(referrer_id) {
            entry.account.set_referral_earnings(total);
        }

        debug!(referrer_id, earned = %earned, percentage, bonus = %bonus, "Referral bonus applied");
        Ok(tx)
    }

    /// Referral bonus at the configured platform percentage.
    pub fn apply_platform_referral(&mut self, referrer_id: &str, earned: Cents) -> Result<Transaction> {
        let percentage = self.config.referral_percentage;
        self.apply_referral_bonus(referrer_id, earned, percentage)
    }

    /// Link a payout method. Returns `false` if it was already linked.
    pub fn link_method(&mut self, account_id: &str, method: PayoutMethod) -> Result<bool> {
        let linked = self.entry_mut(account_id)?.account.link(method);
        debug!(account_id, method = %method, linked, "Payout method linked");
        Ok(linked)
    }

    /// Unlink a payout method. Returns `false` if it was not linked.
    pub fn unlink_method(&mut self, account_id: &str, method: PayoutMethod) -> Result<bool> {
        let removed = self.entry_mut(account_id)?.account.unlink(method);
        debug!(account_id, method = %method, removed, "Payout method unlinked");
        Ok(removed)
    }

    /// Record the outcome of an identity check.
    pub fn set_verified(&mut self, account_id: &str, verified: bool) -> Result<()> {
        self.entry_mut(account_id)?.account.set_verified(verified);
        info!(account_id, verified, "Verification updated");
        Ok(())
    }

    /// Switch between student and teacher. Admins drop to student.
    pub fn toggle_role(&mut self, account_id: &str) -> Result<Role> {
        let account = &mut self.entry_mut(account_id)?.account;
        let next = match account.role() {
            Role::Student => Role::Teacher,
            Role::Teacher | Role::Admin => Role::Student,
        };
        account.set_role(next);
        Ok(next)
    }

    fn entry(&self, account_id: &str) -> Result<&AccountEntry> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| LedgerError::UnknownAccount(account_id.to_string()))
    }

    fn entry_mut(&mut self, account_id: &str) -> Result<&mut AccountEntry> {
        self.accounts
            .get_mut(account_id)
            .ok_or_else(|| LedgerError::UnknownAccount(account_id.to_string()))
    }

    /// Balances after applying a draft, without mutating anything.
    fn prepare(&self, account_id: &str, draft: &TransactionDraft) -> Result<Balances> {
        self.log.reserve(1)?;
        self.entry(account_id)?
            .account
            .balances()
            .apply_deltas(draft.amount_cash, draft.amount_points)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Commit prepared balances and append the transaction.
    fn apply(&mut self, account_id: &str, next: Balances, draft: TransactionDraft) -> Transaction {
        if let Some(entry) = self.accounts.get_mut(account_id) {
            entry.account.set_balances(next);
        }
        self.log.append(draft, self.clock.now())
    }
}

fn signed(amount: Cents) -> Result<i64> {
    amount.to_signed().ok_or(LedgerError::ArithmeticOverflow)
}

fn signed_points(points: u64) -> Result<i64> {
    i64::try_from(points).map_err(|_| LedgerError::ArithmeticOverflow)
}
