//! Account model.
//!
//! Balance fields are private to this crate: once an account is opened in a
//! [`RewardLedger`](crate::RewardLedger), only ledger operations move them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::error::{LedgerError, Result};
use crate::rewards;
use crate::transaction::{PointDeltas, Transaction};
use crate::types::{Cents, PayoutMethod, Role};

/// The three balance buckets of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    /// Spendable cash
    pub cash_balance: Cents,
    /// Liquid learning points
    pub learning_points: u64,
    /// Points locked for the earning multiplier
    pub staked_points: u64,
}

impl Balances {
    pub fn new(cash_balance: Cents, learning_points: u64, staked_points: u64) -> Self {
        Self {
            cash_balance,
            learning_points,
            staked_points,
        }
    }

    /// Apply signed deltas. `None` if a bucket would go negative or overflow.
    pub fn apply_deltas(&self, cash: i64, points: PointDeltas) -> Option<Balances> {
        Some(Balances::new(
            Cents::new(add_signed(self.cash_balance.as_cents(), cash)?),
            add_signed(self.learning_points, points.learning)?,
            add_signed(self.staked_points, points.staked)?,
        ))
    }

    /// Apply the deltas of one logged transaction.
    pub fn apply(&self, tx: &Transaction) -> Result<Balances> {
        self.apply_deltas(tx.amount_cash, tx.amount_points)
            .ok_or_else(|| {
                LedgerError::CorruptLog(format!(
                    "transaction {} cannot be applied to account {}",
                    tx.id, tx.account_id
                ))
            })
    }

    /// Total points across both buckets.
    pub fn total_points(&self) -> Option<u64> {
        self.learning_points.checked_add(self.staked_points)
    }
}

fn add_signed(value: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        value.checked_add(delta as u64)
    } else {
        value.checked_sub(delta.unsigned_abs())
    }
}

/// Something a learner is saving toward.
///
/// Goals are profile data: the ledger never moves money into or out of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target_amount: Cents,
    pub current_amount: Cents,
    #[serde(default)]
    pub icon: String,
}

impl SavingsGoal {
    pub fn new(id: impl Into<String>, name: impl Into<String>, target_amount: Cents) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_amount,
            current_amount: Cents::ZERO,
            icon: String::new(),
        }
    }

    pub fn with_current(mut self, current_amount: Cents) -> Self {
        self.current_amount = current_amount;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Percentage of the target reached, capped at 100.
    pub fn progress(&self) -> u8 {
        if self.target_amount.is_zero() {
            return 100;
        }
        let target = self.target_amount.as_cents() as u128;
        let current = self.current_amount.as_cents() as u128;
        (current * 100 / target).min(100) as u8
    }
}

/// A learner, teacher or admin holding a reward balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Account {
    id: String,
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: Role,
    #[serde(flatten)]
    balances: Balances,
    #[serde(default, rename = "isVerified")]
    verified: bool,
    #[serde(default)]
    linked_methods: BTreeSet<PayoutMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    referral_code: Option<String>,
    #[serde(default)]
    total_referral_earnings: Cents,
    #[serde(default)]
    savings_goals: Vec<SavingsGoal>,
    joined_at: NaiveDate,
}

impl Account {
    /// Create an account with empty balances.
    pub fn new(id: impl Into<String>, name: impl Into<String>, joined_at: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            role: Role::Student,
            balances: Balances::default(),
            verified: false,
            linked_methods: BTreeSet::new(),
            referral_code: None,
            total_referral_earnings: Cents::ZERO,
            savings_goals: Vec::new(),
            joined_at,
        }
    }

    /// Seed opening balances. Only meaningful before the account is opened.
    pub fn with_balances(mut self, balances: Balances) -> Self {
        self.balances = balances;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn with_linked(mut self, method: PayoutMethod) -> Self {
        self.linked_methods.insert(method);
        self
    }

    pub fn with_referral_code(mut self, code: impl Into<String>) -> Self {
        self.referral_code = Some(code.into());
        self
    }

    pub fn with_referral_earnings(mut self, earnings: Cents) -> Self {
        self.total_referral_earnings = earnings;
        self
    }

    pub fn with_savings_goal(mut self, goal: SavingsGoal) -> Self {
        self.savings_goals.push(goal);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn balances(&self) -> Balances {
        self.balances
    }

    pub fn cash_balance(&self) -> Cents {
        self.balances.cash_balance
    }

    pub fn learning_points(&self) -> u64 {
        self.balances.learning_points
    }

    pub fn staked_points(&self) -> u64 {
        self.balances.staked_points
    }

    /// Derived from staked points on every read.
    pub fn earning_multiplier(&self) -> f64 {
        rewards::earning_multiplier(self.balances.staked_points)
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn linked_methods(&self) -> &BTreeSet<PayoutMethod> {
        &self.linked_methods
    }

    pub fn is_linked(&self, method: PayoutMethod) -> bool {
        self.linked_methods.contains(&method)
    }

    pub fn referral_code(&self) -> Option<&str> {
        self.referral_code.as_deref()
    }

    pub fn total_referral_earnings(&self) -> Cents {
        self.total_referral_earnings
    }

    pub fn savings_goals(&self) -> &[SavingsGoal] {
        &self.savings_goals
    }

    pub fn joined_at(&self) -> NaiveDate {
        self.joined_at
    }

    /// Whether `reference` names this account by ID or referral code.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.id == reference
            || self
                .referral_code
                .as_deref()
                .is_some_and(|code| code.eq_ignore_ascii_case(reference))
    }

    pub(crate) fn set_balances(&mut self, balances: Balances) {
        self.balances = balances;
    }

    pub(crate) fn set_verified(&mut self, verified: bool) {
        self.verified = verified;
    }

    pub(crate) fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub(crate) fn link(&mut self, method: PayoutMethod) -> bool {
        self.linked_methods.insert(method)
    }

    pub(crate) fn unlink(&mut self, method: PayoutMethod) -> bool {
        self.linked_methods.remove(&method)
    }

    pub(crate) fn set_referral_earnings(&mut self, total: Cents) {
        self.total_referral_earnings = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 10, 15).unwrap()
    }

    #[test]
    fn test_snapshot_json_shape() {
        let account = Account::new("u1", "Alex Johnson", joined())
            .with_email("alex@example.com")
            .with_balances(Balances::new(Cents::new(125000), 450, 500))
            .with_linked(PayoutMethod::Bank)
            .with_verified(true);

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["cashBalance"], 125000);
        assert_eq!(json["learningPoints"], 450);
        assert_eq!(json["stakedPoints"], 500);
        assert_eq!(json["isVerified"], true);
        assert_eq!(json["linkedMethods"][0], "BANK");
        assert_eq!(json["role"], "STUDENT");
        assert_eq!(json["joinedAt"], "2023-10-15");

        let parsed: Account = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, account);
    }

    #[test]
    fn test_savings_goals_round_trip() {
        let account = Account::new("u1", "Alex Johnson", joined()).with_savings_goal(
            SavingsGoal::new("g1", "New MacBook Pro", Cents::from_dollars(2400))
                .with_current(Cents::from_dollars(850))
                .with_icon("💻"),
        );

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["savingsGoals"][0]["id"], "g1");
        assert_eq!(json["savingsGoals"][0]["targetAmount"], 240000);
        assert_eq!(json["savingsGoals"][0]["currentAmount"], 85000);
        assert_eq!(account.savings_goals()[0].progress(), 35);

        let parsed: Account = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, account);

        let mut legacy = serde_json::to_value(Account::new("u2", "B", joined())).unwrap();
        legacy.as_object_mut().unwrap().remove("savingsGoals");
        let parsed: Account = serde_json::from_value(legacy).unwrap();
        assert!(parsed.savings_goals().is_empty());
    }

    #[test]
    fn test_goal_progress_caps_at_target() {
        let goal = SavingsGoal::new("g", "Done", Cents::from_dollars(10)).with_current(Cents::from_dollars(12));
        assert_eq!(goal.progress(), 100);
        assert_eq!(SavingsGoal::new("g", "Empty", Cents::ZERO).progress(), 100);
    }

    #[test]
    fn test_multiplier_is_derived() {
        let account = Account::new("u1", "A", joined())
            .with_balances(Balances::new(Cents::ZERO, 50, 100));
        assert!((account.earning_multiplier() - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_matches_reference() {
        let account = Account::new("u2", "Sarah Webb", joined()).with_referral_code("SARAH10");
        assert!(account.matches_reference("u2"));
        assert!(account.matches_reference("sarah10"));
        assert!(!account.matches_reference("u3"));
    }
}
