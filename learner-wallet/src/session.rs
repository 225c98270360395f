//! WalletSession - what the presentation layer talks to.
//!
//! A session owns the ledger for one signed-in account plus the peers it can
//! gift to. Intents never fail for ordinary user mistakes: a rejected intent
//! still returns an [`IntentOutcome`] carrying the error tag and the
//! unchanged account. `Err` is reserved for catalog lookups, storage and
//! internal ledger faults.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use reward_ledger::{
    render_ledger_report, report_file_name, Account, Cents, Claim, Clock, ErrorTag, LedgerConfig,
    LedgerError, PayoutMethod, RewardLedger, Role, Transaction,
};

use crate::catalog::CatalogProvider;
use crate::error::{Result, WalletError};
use crate::messages::user_message;
use crate::presets::{self, SignIn};
use crate::store::{self, SessionSnapshot, SessionStore};

/// Account as shown to the learner, with derived values filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    pub earning_multiplier: f64,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            earning_multiplier: account.earning_multiplier(),
            account: account.clone(),
        }
    }
}

/// Result of one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct IntentOutcome {
    /// Account after the intent
    pub account: AccountView,
    /// Why the intent was rejected, if it was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorTag>,
    /// Transaction recorded for the signed-in account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
}

impl IntentOutcome {
    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }

    /// Text for the rejection, if any.
    pub fn message(&self) -> Option<&'static str> {
        self.error.map(user_message)
    }
}

/// A downloadable audit report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerExport {
    pub file_name: String,
    pub contents: String,
}

/// Active wallet session for one signed-in account.
pub struct WalletSession {
    ledger: RewardLedger,
    catalog: Arc<dyn CatalogProvider>,
    clock: Arc<dyn Clock>,
    user_id: String,
}

impl WalletSession {
    /// Start a session for `user`, with `peers` as the other known accounts.
    pub fn start(
        config: LedgerConfig,
        catalog: Arc<dyn CatalogProvider>,
        clock: Arc<dyn Clock>,
        user: Account,
        peers: Vec<Account>,
    ) -> Result<Self> {
        let user_id = user.id().to_string();
        let mut ledger = RewardLedger::new(config)?.with_clock(clock.clone());
        ledger.open_account(user)?;
        for peer in peers.into_iter().filter(|peer| peer.id() != user_id) {
            ledger.open_account(peer)?;
        }

        info!(user_id = %user_id, "Session started");
        Ok(Self {
            ledger,
            catalog,
            clock,
            user_id,
        })
    }

    /// Start a session from a sign-in preset with the built-in peers.
    pub fn sign_in(
        config: LedgerConfig,
        catalog: Arc<dyn CatalogProvider>,
        clock: Arc<dyn Clock>,
        sign_in: &SignIn,
    ) -> Result<Self> {
        let user = sign_in.account(clock.now().date_naive());
        Self::start(config, catalog, clock, user, presets::peers())
    }

    /// Rebuild a session from a snapshot, verifying the ledger on the way.
    pub fn restore(
        config: LedgerConfig,
        catalog: Arc<dyn CatalogProvider>,
        clock: Arc<dyn Clock>,
        snapshot: SessionSnapshot,
    ) -> Result<Self> {
        let user_id = snapshot.user.id().to_string();
        let ledger = RewardLedger::from_snapshot(config, snapshot.ledger)?.with_clock(clock.clone());
        match ledger.account(&user_id) {
            Some(account) if *account == snapshot.user => {}
            Some(_) => {
                return Err(WalletError::CorruptSession(format!(
                    "account {} differs from its ledger entry",
                    user_id
                )))
            }
            None => {
                return Err(WalletError::CorruptSession(format!(
                    "account {} missing from ledger",
                    user_id
                )))
            }
        }

        debug!(user_id = %user_id, transactions = ledger.log().len(), "Session restored");
        Ok(Self {
            ledger,
            catalog,
            clock,
            user_id,
        })
    }

    /// Restore the session stored under `key`, if there is one.
    pub async fn load(
        store: &dyn SessionStore,
        key: &str,
        config: LedgerConfig,
        catalog: Arc<dyn CatalogProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Option<Self>> {
        match store::load_snapshot(store, key).await? {
            Some(snapshot) => Ok(Some(Self::restore(config, catalog, clock, snapshot)?)),
            None => Ok(None),
        }
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        Ok(SessionSnapshot {
            user: self.account()?.clone(),
            ledger: self.ledger.snapshot(),
            saved_at: self.clock.now(),
        })
    }

    /// Persist the session under `key`.
    pub async fn save(&self, store: &dyn SessionStore, key: &str) -> Result<()> {
        let snapshot = self.snapshot()?;
        store::save_snapshot(store, key, &snapshot).await?;
        Ok(())
    }

    /// End the session and clear it from the store.
    pub async fn sign_out(self, store: &dyn SessionStore, key: &str) -> Result<bool> {
        let removed = store.remove(key).await?;
        info!(user_id = %self.user_id, removed, "Signed out");
        Ok(removed)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn account(&self) -> Result<&Account> {
        self.ledger.account(&self.user_id).ok_or(WalletError::NoSession)
    }

    pub fn view(&self) -> Result<AccountView> {
        Ok(AccountView::from(self.account()?))
    }

    /// Accounts other than the signed-in one.
    pub fn peers(&self) -> Vec<&Account> {
        self.ledger
            .accounts()
            .filter(|account| account.id() != self.user_id)
            .collect()
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &dyn CatalogProvider {
        self.catalog.as_ref()
    }

    /// Claim the reward for a completed lesson or chapter.
    pub fn claim_reward(&mut self, scope_id: &str, unit_id: &str) -> Result<IntentOutcome> {
        let unit = self.catalog.unit(scope_id, unit_id)?;
        match self.ledger.claim_reward(&self.user_id, scope_id, &unit) {
            Ok(Claim::Claimed(tx)) => self.accepted(tx),
            Ok(Claim::AlreadyClaimed) => self.outcome(Some(ErrorTag::AlreadyClaimed), None),
            Err(err) => self.rejected(err),
        }
    }

    pub fn stake(&mut self, points: u64) -> Result<IntentOutcome> {
        let result = self.ledger.stake(&self.user_id, points);
        self.finish(result)
    }

    pub fn unstake(&mut self, points: u64) -> Result<IntentOutcome> {
        let result = self.ledger.unstake(&self.user_id, points);
        self.finish(result)
    }

    pub fn withdraw(&mut self, amount: Cents, method: PayoutMethod) -> Result<IntentOutcome> {
        let result = self.ledger.withdraw(&self.user_id, amount, method);
        self.finish(result)
    }

    /// Gift cash to a peer named by ID or referral code.
    pub fn gift(&mut self, recipient: &str, amount: Cents) -> Result<IntentOutcome> {
        let result = self
            .ledger
            .gift(&self.user_id, recipient, amount)
            .map(|receipt| receipt.sent);
        self.finish(result)
    }

    /// Credit the signed-in account for something a referee earned.
    pub fn referral(&mut self, earned: Cents) -> Result<IntentOutcome> {
        let result = self.ledger.apply_platform_referral(&self.user_id, earned);
        self.finish(result)
    }

    pub fn link_method(&mut self, method: PayoutMethod) -> Result<IntentOutcome> {
        if let Err(err) = self.ledger.link_method(&self.user_id, method) {
            return self.rejected(err);
        }
        self.outcome(None, None)
    }

    pub fn unlink_method(&mut self, method: PayoutMethod) -> Result<IntentOutcome> {
        if let Err(err) = self.ledger.unlink_method(&self.user_id, method) {
            return self.rejected(err);
        }
        self.outcome(None, None)
    }

    /// Switch between student and teacher views.
    pub fn toggle_role(&mut self) -> Result<IntentOutcome> {
        match self.ledger.toggle_role(&self.user_id) {
            Ok(role) => {
                debug!(user_id = %self.user_id, role = %role, "Role toggled");
                self.outcome(None, None)
            }
            Err(err) => self.rejected(err),
        }
    }

    /// Record an identity check result.
    pub fn set_verified(&mut self, verified: bool) -> Result<IntentOutcome> {
        if let Err(err) = self.ledger.set_verified(&self.user_id, verified) {
            return self.rejected(err);
        }
        self.outcome(None, None)
    }

    pub fn role(&self) -> Result<Role> {
        Ok(self.account()?.role())
    }

    /// Full history, oldest first.
    pub fn history(&self) -> Vec<&Transaction> {
        self.ledger.history(&self.user_id)
    }

    /// Most recent transactions, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&Transaction> {
        self.ledger.log().recent(&self.user_id, limit)
    }

    /// Completion percentage for a course or book.
    pub fn progress(&self, scope_id: &str) -> Option<u8> {
        self.catalog
            .progress(scope_id, self.ledger.completion(&self.user_id, scope_id))
    }

    /// Whether replaying the log reproduces the account.
    pub fn verify(&self) -> Result<bool> {
        Ok(self.ledger.verify(&self.user_id)?)
    }

    /// Plain-text audit report, newest transactions first.
    pub fn export(&self) -> Result<LedgerExport> {
        let account = self.account()?;
        let transactions = self.ledger.log().recent(&self.user_id, usize::MAX);
        Ok(LedgerExport {
            file_name: report_file_name(account.name()),
            contents: render_ledger_report(account, transactions, self.clock.now().date_naive()),
        })
    }

    fn finish(&self, result: reward_ledger::Result<Transaction>) -> Result<IntentOutcome> {
        match result {
            Ok(tx) => self.accepted(tx),
            Err(err) => self.rejected(err),
        }
    }

    fn accepted(&self, tx: Transaction) -> Result<IntentOutcome> {
        self.outcome(None, Some(tx))
    }

    fn rejected(&self, err: LedgerError) -> Result<IntentOutcome> {
        let tag = err.tag();
        if tag == ErrorTag::Internal {
            return Err(err.into());
        }
        debug!(user_id = %self.user_id, tag = ?tag, error = %err, "Intent rejected");
        self.outcome(Some(tag), None)
    }

    fn outcome(&self, error: Option<ErrorTag>, transaction: Option<Transaction>) -> Result<IntentOutcome> {
        Ok(IntentOutcome {
            account: self.view()?,
            error,
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use chrono::{TimeZone, Utc};
    use reward_ledger::{FixedClock, TransactionKind};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()))
    }

    fn member() -> WalletSession {
        WalletSession::sign_in(
            LedgerConfig::default(),
            Arc::new(StaticCatalog::seeded()),
            clock(),
            &SignIn::Returning { name: None, email: None },
        )
        .unwrap()
    }

    fn signup() -> WalletSession {
        WalletSession::sign_in(
            LedgerConfig::default(),
            Arc::new(StaticCatalog::seeded()),
            clock(),
            &SignIn::Signup {
                name: None,
                email: None,
                role: Role::Student,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_claim_uses_multiplier_and_tags_repeat() {
        let mut session = member();
        let outcome = session.claim_reward("1", "l1").unwrap();
        assert!(outcome.is_accepted());
        // 500 staked -> 1.5x on $5.00
        assert_eq!(outcome.transaction.as_ref().unwrap().amount_cash, 750);
        assert_eq!(outcome.account.account.cash_balance(), Cents::new(125750));
        assert_eq!(outcome.account.account.learning_points(), 470);

        let again = session.claim_reward("1", "l1").unwrap();
        assert_eq!(again.error, Some(ErrorTag::AlreadyClaimed));
        assert!(again.transaction.is_none());
        assert_eq!(again.account.account.cash_balance(), Cents::new(125750));
        assert!(again.message().is_some());
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        let mut session = member();
        assert!(matches!(
            session.claim_reward("1", "nope"),
            Err(WalletError::Catalog(_))
        ));
    }

    #[test]
    fn test_book_progress() {
        let mut session = signup();
        assert_eq!(session.progress("b1"), Some(0));
        session.claim_reward("b1", "c1").unwrap();
        assert_eq!(session.progress("b1"), Some(50));
        session.claim_reward("b1", "c2").unwrap();
        assert_eq!(session.progress("b1"), Some(100));
        assert_eq!(session.account().unwrap().learning_points(), 30);
        assert!(session.account().unwrap().cash_balance().is_zero());
    }

    #[test]
    fn test_course_progress_rounds_half_up() {
        let mut session = signup();
        session.claim_reward("1", "l1").unwrap();
        assert_eq!(session.progress("1"), Some(33));
        session.claim_reward("1", "l2").unwrap();
        assert_eq!(session.progress("1"), Some(67));
    }

    #[test]
    fn test_rejections_come_back_as_tags() {
        let mut session = signup();
        assert_eq!(session.stake(10).unwrap().error, Some(ErrorTag::InsufficientPoints));
        assert_eq!(
            session.withdraw(Cents::from_dollars(20), PayoutMethod::Bank).unwrap().error,
            Some(ErrorTag::MethodNotLinked)
        );
        assert_eq!(
            session.gift("u2", Cents::from_dollars(1)).unwrap().error,
            Some(ErrorTag::InsufficientFunds)
        );
        assert_eq!(
            session.gift("nobody", Cents::from_dollars(1)).unwrap().error,
            Some(ErrorTag::InvalidRecipient)
        );
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_gift_to_peer_by_referral_code() {
        let mut session = member();
        let outcome = session.gift("SARAH10", Cents::from_dollars(25)).unwrap();
        let tx = outcome.transaction.unwrap();
        assert_eq!(tx.kind, TransactionKind::GiftSent);
        assert_eq!(outcome.account.account.cash_balance(), Cents::from_dollars(1225));

        let sarah = session.ledger().account("u2").unwrap();
        assert_eq!(sarah.cash_balance(), Cents::from_dollars(8425));
        assert_eq!(session.peers().len(), 2);
    }

    #[test]
    fn test_toggle_role_for_signup() {
        let mut session = signup();
        session.toggle_role().unwrap();
        assert_eq!(session.role().unwrap(), Role::Teacher);

        let mut admin = member();
        admin.toggle_role().unwrap();
        assert_eq!(admin.role().unwrap(), Role::Student);
        admin.toggle_role().unwrap();
        assert_eq!(admin.role().unwrap(), Role::Teacher);
    }

    #[test]
    fn test_link_then_withdraw() {
        let mut session = member();
        session.unlink_method(PayoutMethod::Crypto).unwrap();
        assert_eq!(
            session.withdraw(Cents::from_dollars(20), PayoutMethod::Crypto).unwrap().error,
            Some(ErrorTag::MethodNotLinked)
        );
        session.link_method(PayoutMethod::Crypto).unwrap();
        let outcome = session.withdraw(Cents::from_dollars(20), PayoutMethod::Crypto).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(outcome.transaction.unwrap().method, Some(PayoutMethod::Crypto));
    }

    #[test]
    fn test_export_lists_newest_first() {
        let mut session = member();
        session.claim_reward("1", "l1").unwrap();
        session.stake(100).unwrap();

        let export = session.export().unwrap();
        assert_eq!(export.file_name, "learner_ledger_alex_johnson.txt");
        let lines: Vec<_> = export.contents.lines().collect();
        assert_eq!(lines[0], "LEARNER CHOICE - FINANCIAL AUDIT REPORT");
        assert_eq!(lines[2], "Date: 2024-03-01");
        assert_eq!(lines[9], "2024-03-01 | STAKE | Staked 100 LP for 1.6x earning multiplier | -100 LP");
        assert_eq!(lines[10], "2024-03-01 | EARN | Reward: Mindset Shift | +7.50");
    }

    #[test]
    fn test_referral_uses_platform_percentage() {
        let mut session = signup();
        let outcome = session.referral(Cents::from_dollars(10)).unwrap();
        assert_eq!(outcome.transaction.unwrap().amount_cash, 50);
        assert_eq!(outcome.account.account.total_referral_earnings(), Cents::new(50));
    }

    #[test]
    fn test_snapshot_restores() {
        let mut session = member();
        session.claim_reward("2", "rl1").unwrap();
        session.gift("u3", Cents::from_dollars(5)).unwrap();

        let snapshot = session.snapshot().unwrap();
        let restored = WalletSession::restore(
            LedgerConfig::default(),
            Arc::new(StaticCatalog::seeded()),
            clock(),
            snapshot,
        )
        .unwrap();
        assert_eq!(restored.account().unwrap(), session.account().unwrap());
        assert_eq!(restored.history().len(), 2);
        assert!(restored.verify().unwrap());
        assert_eq!(restored.progress("2"), Some(50));
    }

    #[test]
    fn test_save_and_sign_out() {
        let store = crate::store::MemorySessionStore::new();
        let session = member();
        tokio_test::block_on(session.save(&store, crate::SESSION_KEY)).unwrap();
        assert_eq!(tokio_test::block_on(store.len()), 1);

        let removed = tokio_test::block_on(session.sign_out(&store, crate::SESSION_KEY)).unwrap();
        assert!(removed);
        assert!(tokio_test::block_on(store.is_empty()));
    }

    #[test]
    fn test_restore_rejects_edited_user() {
        let session = member();
        let mut snapshot = session.snapshot().unwrap();
        snapshot.user = snapshot.user.with_verified(false);
        assert!(matches!(
            WalletSession::restore(
                LedgerConfig::default(),
                Arc::new(StaticCatalog::seeded()),
                clock(),
                snapshot
            ),
            Err(WalletError::CorruptSession(_))
        ));
    }
}
