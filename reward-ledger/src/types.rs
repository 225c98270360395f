//! Core value types for the reward ledger.
//!
//! Money is held as integer cents so that reward arithmetic never touches
//! floating point. Points are plain unsigned integers.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the browser front end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// A non-negative amount of money in the smallest currency unit (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct Cents(u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Create from a raw cent count.
    pub const fn new(cents: u64) -> Self {
        Self(cents)
    }

    /// Create from a whole dollar amount.
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars * 100)
    }

    /// Raw cent count.
    pub const fn as_cents(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Cents) -> Option<Cents> {
        self.0.checked_add(other.0).map(Cents)
    }

    pub fn checked_sub(self, other: Cents) -> Option<Cents> {
        self.0.checked_sub(other.0).map(Cents)
    }

    /// Signed cent value, for transaction deltas.
    pub fn to_signed(self) -> Option<i64> {
        i64::try_from(self.0).ok()
    }

    /// Dollars with exactly two decimals, without a currency sign.
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.to_decimal_string())
    }
}

/// Error parsing a dollar amount such as `"12.50"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseMoneyError {
    #[error("empty amount")]
    Empty,

    #[error("invalid amount: {0}")]
    Invalid(String),

    #[error("amounts are limited to two decimal places: {0}")]
    TooPrecise(String),

    #[error("amount too large: {0}")]
    Overflow(String),
}

impl FromStr for Cents {
    type Err = ParseMoneyError;

    /// Parse a non-negative dollar amount, with an optional leading `$`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(ParseMoneyError::Empty);
        }

        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };

        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
            return Err(ParseMoneyError::Invalid(s.to_string()));
        }
        if frac.len() > 2 {
            return Err(ParseMoneyError::TooPrecise(s.to_string()));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| ParseMoneyError::Overflow(s.to_string()))?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse().unwrap_or(0),
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Cents)
            .ok_or_else(|| ParseMoneyError::Overflow(s.to_string()))
    }
}

/// Format a signed cent delta as dollars with an explicit sign, e.g. `+5.00` or `-200.00`.
pub fn format_signed_cents(delta: i64) -> String {
    let magnitude = delta.unsigned_abs();
    let sign = if delta > 0 {
        "+"
    } else if delta < 0 {
        "-"
    } else {
        ""
    };
    format!("{}{}.{:02}", sign, magnitude / 100, magnitude % 100)
}

/// A payout method an account can link for withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutMethod {
    /// Bank transfer
    Bank,
    /// QR-based instant payout
    #[serde(rename = "QRPAY")]
    QrPay,
    /// Crypto wallet address
    Crypto,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bank => "BANK",
            Self::QrPay => "QRPAY",
            Self::Crypto => "CRYPTO",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Bank, Self::QrPay, Self::Crypto]
    }
}

impl fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BANK" => Ok(Self::Bank),
            "QRPAY" | "QR" | "QR_PAY" => Ok(Self::QrPay),
            "CRYPTO" => Ok(Self::Crypto),
            other => Err(format!("unknown payout method: {}", other)),
        }
    }
}

/// Platform role of an account holder. Presentation routing only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Self::Student),
            "TEACHER" => Ok(Self::Teacher),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A lesson or chapter that pays out when completed.
///
/// Supplied by the catalog and never mutated by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RewardUnit {
    /// Unit ID, unique within its course or book
    pub id: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Learning points granted on completion
    #[serde(default)]
    pub reward_points: u64,
    /// Cash granted on completion, before the earning multiplier
    #[serde(default)]
    pub reward_cash: Cents,
}

impl RewardUnit {
    pub fn new(id: impl Into<String>, reward_points: u64, reward_cash: Cents) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            reward_points,
            reward_cash,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dollars() {
        assert_eq!("12.50".parse::<Cents>().unwrap(), Cents::new(1250));
        assert_eq!("$5".parse::<Cents>().unwrap(), Cents::new(500));
        assert_eq!("0.5".parse::<Cents>().unwrap(), Cents::new(50));
        assert_eq!(".07".parse::<Cents>().unwrap(), Cents::new(7));
        assert_eq!(
            "1.005".parse::<Cents>(),
            Err(ParseMoneyError::TooPrecise("1.005".to_string()))
        );
        assert!("-3".parse::<Cents>().is_err());
        assert!("abc".parse::<Cents>().is_err());
        assert!(".".parse::<Cents>().is_err());
        assert_eq!("".parse::<Cents>(), Err(ParseMoneyError::Empty));
    }

    #[test]
    fn test_display() {
        assert_eq!(Cents::new(125000).to_string(), "$1250.00");
        assert_eq!(Cents::new(5).to_decimal_string(), "0.05");
        assert_eq!(format_signed_cents(500), "+5.00");
        assert_eq!(format_signed_cents(-20000), "-200.00");
        assert_eq!(format_signed_cents(0), "0.00");
    }

    #[test]
    fn test_payout_method_wire_names() {
        let json = serde_json::to_string(&PayoutMethod::QrPay).unwrap();
        assert_eq!(json, "\"QRPAY\"");
        assert_eq!("qrpay".parse::<PayoutMethod>().unwrap(), PayoutMethod::QrPay);
        assert!("paypal".parse::<PayoutMethod>().is_err());
    }
}
