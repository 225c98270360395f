//! Learner Choice wallet
//!
//! The layer between the reward ledger and whatever renders it. A
//! [`WalletSession`] turns learner intents (claim a lesson reward, stake,
//! withdraw, gift) into ledger operations and hands back an
//! [`IntentOutcome`] the front end can render directly.
//!
//! # Key Components
//!
//! - [`WalletSession`]: Signed-in session owning the ledger
//! - [`CatalogProvider`]: Source of lesson and chapter rewards
//! - [`SessionStore`]: Where sessions are saved between runs
//! - [`WalletConfig`]: Ledger policy, store location and logging
//!
//! # Example
//!
//! ```ignore
//! use learner_wallet::{SignIn, StaticCatalog, WalletConfig, WalletSession};
//!
//! let config = WalletConfig::default();
//! let mut session = WalletSession::sign_in(
//!     config.ledger,
//!     Arc::new(StaticCatalog::seeded()),
//!     Arc::new(SystemClock),
//!     &SignIn::Returning { name: None, email: None },
//! )?;
//!
//! let outcome = session.claim_reward("1", "l1")?;
//! session.save(&store, SESSION_KEY).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod messages;
pub mod presets;
pub mod session;
pub mod store;

// Re-export main types
pub use catalog::{CatalogError, CatalogProvider, CatalogScope, ScopeKind, StaticCatalog};
pub use config::{GeneralConfig, StoreConfig, WalletConfig};
pub use error::{Result, WalletError};
pub use messages::user_message;
pub use presets::SignIn;
pub use session::{AccountView, IntentOutcome, LedgerExport, WalletSession};
pub use store::{FileSessionStore, MemorySessionStore, SessionSnapshot, SessionStore, StoreError, SESSION_KEY};
