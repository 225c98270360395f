//! Plain-text audit report.

use chrono::NaiveDate;

use crate::account::Account;
use crate::transaction::Transaction;
use crate::types::format_signed_cents;

pub const REPORT_TITLE: &str = "LEARNER CHOICE - FINANCIAL AUDIT REPORT";

/// Signed amount column: cash if any moved, otherwise the learning-points delta.
pub fn signed_amount(tx: &Transaction) -> String {
    if tx.amount_cash != 0 || tx.amount_points.is_zero() {
        format_signed_cents(tx.amount_cash)
    } else {
        let sign = if tx.amount_points.learning > 0 { "+" } else { "" };
        format!("{}{} LP", sign, tx.amount_points.learning)
    }
}

/// One report line: `<date> | <KIND> | <description> | <signed amount>`.
pub fn report_line(tx: &Transaction) -> String {
    format!(
        "{} | {} | {} | {}",
        tx.timestamp.format("%Y-%m-%d"),
        tx.kind,
        tx.description,
        signed_amount(tx)
    )
}

/// Render the report for an account. Transactions are listed in the order given.
pub fn render_ledger_report<'a, I>(account: &Account, transactions: I, date: NaiveDate) -> String
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push('\n');
    out.push_str(&format!("User: {}\n", account.name()));
    out.push_str(&format!("Date: {}\n", date.format("%Y-%m-%d")));
    out.push_str(&"-".repeat(40));
    out.push('\n');
    out.push_str(&format!("Current Balance: {}\n", account.cash_balance()));
    out.push_str(&format!("Learning Points: {}\n", account.learning_points()));
    out.push_str(&format!("Staked Points: {}\n", account.staked_points()));
    out.push_str("\nRECENT TRANSACTIONS:\n");
    for tx in transactions {
        out.push_str(&report_line(tx));
        out.push('\n');
    }
    out
}

/// File name offered for a downloaded report.
pub fn report_file_name(user_name: &str) -> String {
    let slug: String = user_name
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("learner_ledger_{}.txt", slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Balances;
    use crate::transaction::{PointDeltas, TransactionKind};
    use crate::types::{Cents, PayoutMethod};
    use chrono::{TimeZone, Utc};

    fn tx(id: u64, kind: TransactionKind, cash: i64, points: PointDeltas, description: &str) -> Transaction {
        Transaction {
            id,
            account_id: "u1".to_string(),
            kind,
            amount_cash: cash,
            amount_points: points,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            description: description.to_string(),
            correlation_id: None,
            method: None,
        }
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(
            signed_amount(&tx(1, TransactionKind::Earn, 500, PointDeltas::learning(20), "r")),
            "+5.00"
        );
        assert_eq!(
            signed_amount(&tx(2, TransactionKind::Withdraw, -20000, PointDeltas::default(), "w")),
            "-200.00"
        );
        assert_eq!(
            signed_amount(&tx(
                3,
                TransactionKind::Stake,
                0,
                PointDeltas { learning: -100, staked: 100 },
                "s"
            )),
            "-100 LP"
        );
        assert_eq!(
            signed_amount(&tx(4, TransactionKind::Earn, 0, PointDeltas::learning(15), "c")),
            "+15 LP"
        );
    }

    #[test]
    fn test_points_only_rows_carry_sign() {
        let chapter = tx(5, TransactionKind::Earn, 0, PointDeltas::learning(15), "Reward: c1");
        assert_eq!(report_line(&chapter), "2024-03-01 | EARN | Reward: c1 | +15 LP");

        let unstake = tx(
            6,
            TransactionKind::Unstake,
            0,
            PointDeltas { learning: 40, staked: -40 },
            "Unstaked 40 LP",
        );
        assert_eq!(report_line(&unstake), "2024-03-01 | UNSTAKE | Unstaked 40 LP | +40 LP");
    }

    #[test]
    fn test_render_report() {
        let account = Account::new("u1", "Alex Johnson", NaiveDate::from_ymd_opt(2023, 10, 15).unwrap())
            .with_balances(Balances::new(Cents::new(125000), 450, 500))
            .with_linked(PayoutMethod::Bank);
        let mut withdrawal = tx(2, TransactionKind::Withdraw, -5000, PointDeltas::default(), "Withdrawal to BANK");
        withdrawal.method = Some(PayoutMethod::Bank);
        let txs = vec![
            withdrawal,
            tx(1, TransactionKind::Earn, 500, PointDeltas::learning(20), "Reward: l1"),
        ];

        let report = render_ledger_report(&account, &txs, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        let expected = "\
LEARNER CHOICE - FINANCIAL AUDIT REPORT
User: Alex Johnson
Date: 2024-03-02
----------------------------------------
Current Balance: $1250.00
Learning Points: 450
Staked Points: 500

RECENT TRANSACTIONS:
2024-03-01 | WITHDRAW | Withdrawal to BANK | -50.00
2024-03-01 | EARN | Reward: l1 | +5.00
";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("Alex Johnson"), "learner_ledger_alex_johnson.txt");
        assert_eq!(report_file_name("  Sarah  Webb "), "learner_ledger_sarah_webb.txt");
    }
}
