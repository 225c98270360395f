//! Platform policy for the ledger.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::types::Cents;

/// Ledger policy, set by platform administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Referral bonus, as a whole percentage of what the referee earned
    pub referral_percentage: u32,
    /// Smallest withdrawal accepted
    #[serde(rename = "min_withdrawal_cents")]
    pub min_withdrawal: Cents,
    /// Whether unverified accounts are capped at `kyc_ceiling`
    pub kyc_required: bool,
    /// Largest withdrawal an unverified account may make
    #[serde(rename = "kyc_ceiling_cents")]
    pub kyc_ceiling: Cents,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            referral_percentage: 5,
            min_withdrawal: Cents::from_dollars(10),
            kyc_required: true,
            kyc_ceiling: Cents::from_dollars(250),
        }
    }
}

impl LedgerConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Check the values an administrator can set out of range.
    pub fn validate(&self) -> Result<()> {
        if self.referral_percentage > 100 {
            return Err(LedgerError::Config(format!(
                "referral_percentage must be at most 100, got {}",
                self.referral_percentage
            )));
        }
        Ok(())
    }
}
