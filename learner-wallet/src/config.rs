//! Configuration for the wallet.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use reward_ledger::LedgerConfig;

use crate::error::{Result, WalletError};
use crate::store::SESSION_KEY;

/// Top-level wallet configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Ledger policy
    pub ledger: LedgerConfig,
    /// Session store settings
    pub store: StoreConfig,
    /// Optional catalog file; the built-in catalog is used when unset
    pub catalog_file: Option<PathBuf>,
    /// General settings
    pub general: GeneralConfig,
}

impl WalletConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.ledger.validate()?;
        if self.store.session_key.is_empty() {
            return Err(WalletError::Config("store.session_key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Session store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding session files
    pub data_dir: PathBuf,
    /// Key the active session is saved under
    pub session_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".learner-wallet"),
            session_key: SESSION_KEY.to_string(),
        }
    }
}

/// General settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Transactions shown by `history` when no limit is given
    pub history_limit: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            history_limit: 20,
        }
    }
}
