//! Sign-in presets and the peer directory.
//!
//! There is no real authentication: signing in picks one of two account
//! presets, and a fixed set of peers stands in for the rest of the platform.

use chrono::NaiveDate;
use uuid::Uuid;

use reward_ledger::{Account, Balances, Cents, PayoutMethod, Role, SavingsGoal};

/// ID of the returning-member preset.
pub const RETURNING_MEMBER_ID: &str = "u1";

/// How a session was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignIn {
    /// Existing member with a funded, verified account
    Returning {
        name: Option<String>,
        email: Option<String>,
    },
    /// Fresh signup with empty balances
    Signup {
        name: Option<String>,
        email: Option<String>,
        role: Role,
    },
}

impl SignIn {
    /// Build the account for this sign-in, joined on `today`.
    pub fn account(&self, today: NaiveDate) -> Account {
        match self {
            Self::Returning { name, email } => returning_member(name.as_deref(), email.as_deref(), today),
            Self::Signup { name, email, role } => new_signup(name.as_deref(), email.as_deref(), *role, today),
        }
    }
}

/// The returning member: funded, verified, every method linked.
pub fn returning_member(name: Option<&str>, email: Option<&str>, today: NaiveDate) -> Account {
    Account::new(RETURNING_MEMBER_ID, name.unwrap_or("Alex Johnson"), today)
        .with_email(email.unwrap_or("alex@example.com"))
        .with_role(Role::Admin)
        .with_balances(Balances::new(Cents::from_dollars(1250), 450, 500))
        .with_linked(PayoutMethod::Bank)
        .with_linked(PayoutMethod::QrPay)
        .with_linked(PayoutMethod::Crypto)
        .with_verified(true)
        .with_referral_code("ALEX-77")
        .with_referral_earnings(Cents::new(8450))
        .with_savings_goal(
            SavingsGoal::new("g1", "New MacBook Pro", Cents::from_dollars(2400))
                .with_current(Cents::from_dollars(850))
                .with_icon("💻"),
        )
        .with_savings_goal(
            SavingsGoal::new("g2", "Vacation Fund", Cents::from_dollars(1500))
                .with_current(Cents::from_dollars(320))
                .with_icon("🌴"),
        )
}

/// A new learner or teacher with nothing linked and nothing earned.
///
/// Sign-up counts as passing the identity check.
pub fn new_signup(name: Option<&str>, email: Option<&str>, role: Role, today: NaiveDate) -> Account {
    let id = Uuid::new_v4().simple().to_string();
    let code = format!("NEW-{}", id[..6].to_uppercase());
    Account::new(format!("u-{}", id), name.unwrap_or("New User"), today)
        .with_email(email.unwrap_or("new@user.com"))
        .with_role(role)
        .with_verified(true)
        .with_referral_code(code)
}

/// Other members, reachable as gift recipients.
pub fn peers() -> Vec<Account> {
    let joined = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    vec![
        Account::new("u2", "Sarah Webb", joined(2023, 8, 20))
            .with_email("sarah@academy.edu")
            .with_role(Role::Teacher)
            .with_balances(Balances::new(Cents::from_dollars(8400), 1200, 0))
            .with_linked(PayoutMethod::Bank)
            .with_verified(true)
            .with_referral_code("SARAH10")
            .with_referral_earnings(Cents::from_dollars(450)),
        Account::new("u3", "Mike Miller", joined(2023, 11, 30))
            .with_email("mike@test.com")
            .with_balances(Balances::new(Cents::from_dollars(50), 20, 0)),
    ]
}
