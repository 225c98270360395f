//! learner-wallet: command-line front end for the Learner Choice wallet
//!
//! Each invocation restores the saved session, applies one intent, and saves
//! the session again. `sign-in` creates the session and `sign-out` clears it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use learner_wallet::{
    CatalogProvider, FileSessionStore, IntentOutcome, SignIn, StaticCatalog, WalletConfig, WalletSession,
};
use reward_ledger::{Account, Cents, Clock, PayoutMethod, Role, SystemClock};

#[derive(Parser)]
#[command(name = "learner-wallet")]
#[command(about = "Learner Choice reward wallet")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "learner-wallet.yaml")]
    config: String,

    /// Data directory (overrides config file)
    #[arg(short, long, env = "LEARNER_WALLET_DATA_DIR")]
    data_dir: Option<String>,

    /// Catalog YAML file (overrides config file)
    #[arg(long, env = "LEARNER_WALLET_CATALOG")]
    catalog: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a session
    SignIn {
        /// Create a new account instead of signing in as the returning member
        #[arg(long)]
        new: bool,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// Role for a new account (STUDENT or TEACHER)
        #[arg(long, default_value = "STUDENT")]
        role: Role,
    },

    /// Show balances and linked methods
    Show,

    /// Claim the reward for a completed lesson or chapter
    Claim {
        /// Course or book ID
        scope: String,
        /// Lesson or chapter ID
        unit: String,
    },

    /// Stake learning points
    Stake { points: u64 },

    /// Release staked points
    Unstake { points: u64 },

    /// Withdraw cash to a linked payout method
    Withdraw {
        /// Dollar amount, e.g. 25.00
        amount: Cents,
        /// BANK, QRPAY or CRYPTO
        #[arg(short, long, default_value = "BANK")]
        method: PayoutMethod,
    },

    /// Gift cash to another member
    Gift {
        /// Account ID or referral code
        recipient: String,
        /// Dollar amount
        amount: Cents,
    },

    /// Record a referral bonus for something a referee earned
    Referral {
        /// What the referee earned, in dollars
        earned: Cents,
    },

    /// Link a payout method
    Link { method: PayoutMethod },

    /// Unlink a payout method
    Unlink { method: PayoutMethod },

    /// Switch between student and teacher
    ToggleRole,

    /// Mark identity verification as passed (or revoked)
    Kyc {
        #[arg(long)]
        revoke: bool,
    },

    /// Show recent transactions
    History {
        /// Number of transactions to show
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Write the audit report
    Export {
        /// Output path (defaults to the generated file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that replaying the log reproduces the balances
    Verify,

    /// List courses and books with their rewards
    Catalog,

    /// End the session
    SignOut,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = if std::path::Path::new(&cli.config).exists() {
        let content = std::fs::read_to_string(&cli.config)?;
        WalletConfig::from_yaml(&content).with_context(|| format!("Invalid config file {}", cli.config))?
    } else {
        WalletConfig::default()
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Apply CLI overrides
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = PathBuf::from(data_dir);
    }
    if let Some(catalog) = cli.catalog {
        config.catalog_file = Some(PathBuf::from(catalog));
    }
    config.validate()?;

    let catalog: Arc<dyn CatalogProvider> = match &config.catalog_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read catalog {}", path.display()))?;
            Arc::new(StaticCatalog::from_yaml(&content)?)
        }
        None => Arc::new(StaticCatalog::seeded()),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = FileSessionStore::new(&config.store.data_dir);
    let key = config.store.session_key.clone();

    info!(data_dir = %config.store.data_dir.display(), "Using session store");

    if let Command::SignIn {
        new,
        name,
        email,
        role,
    } = &cli.command
    {
        let sign_in = if *new {
            SignIn::Signup {
                name: name.clone(),
                email: email.clone(),
                role: *role,
            }
        } else {
            SignIn::Returning {
                name: name.clone(),
                email: email.clone(),
            }
        };
        let session = WalletSession::sign_in(config.ledger.clone(), catalog, clock, &sign_in)?;
        session.save(&store, &key).await?;
        print_account(session.account()?);
        return Ok(());
    }

    if let Command::Catalog = &cli.command {
        for scope in catalog.scopes() {
            println!("{} [{:?}] {}", scope.id, scope.kind, scope.title);
            for unit in &scope.units {
                println!(
                    "  {:<4} {:<32} {:>4} LP  {}",
                    unit.id, unit.title, unit.reward_points, unit.reward_cash
                );
            }
        }
        return Ok(());
    }

    let Some(mut session) = WalletSession::load(&store, &key, config.ledger.clone(), catalog, clock).await? else {
        eprintln!("No active session. Run `learner-wallet sign-in` first.");
        std::process::exit(1);
    };

    let outcome = match cli.command {
        Command::SignIn { .. } | Command::Catalog => return Ok(()),
        Command::Show => {
            print_account(session.account()?);
            return Ok(());
        }
        Command::History { count } => {
            let limit = count.unwrap_or(config.general.history_limit);
            for tx in session.recent(limit) {
                println!("{}", reward_ledger::export::report_line(tx));
            }
            return Ok(());
        }
        Command::Export { output } => {
            let export = session.export()?;
            let path = output.unwrap_or_else(|| PathBuf::from(&export.file_name));
            tokio::fs::write(&path, &export.contents).await?;
            println!("Report written to {}", path.display());
            return Ok(());
        }
        Command::Verify => {
            if session.verify()? {
                println!("Ledger verified: replay matches current balances");
                return Ok(());
            }
            eprintln!("Ledger mismatch: replay does not match current balances");
            std::process::exit(1);
        }
        Command::SignOut => {
            session.sign_out(&store, &key).await?;
            println!("Signed out");
            return Ok(());
        }
        Command::Claim { scope, unit } => session.claim_reward(&scope, &unit)?,
        Command::Stake { points } => session.stake(points)?,
        Command::Unstake { points } => session.unstake(points)?,
        Command::Withdraw { amount, method } => session.withdraw(amount, method)?,
        Command::Gift { recipient, amount } => session.gift(&recipient, amount)?,
        Command::Referral { earned } => session.referral(earned)?,
        Command::Link { method } => session.link_method(method)?,
        Command::Unlink { method } => session.unlink_method(method)?,
        Command::ToggleRole => session.toggle_role()?,
        Command::Kyc { revoke } => session.set_verified(!revoke)?,
    };

    report(&outcome);
    if !outcome.is_accepted() {
        std::process::exit(1);
    }
    session.save(&store, &key).await?;
    Ok(())
}

fn report(outcome: &IntentOutcome) {
    if let Some(message) = outcome.message() {
        eprintln!("Rejected: {}", message);
        return;
    }
    if let Some(tx) = &outcome.transaction {
        println!("{}", reward_ledger::export::report_line(tx));
    }
    print_account(&outcome.account.account);
}

fn print_account(account: &Account) {
    let methods: Vec<_> = account.linked_methods().iter().map(|m| m.as_str()).collect();
    println!("{} ({}) [{}]", account.name(), account.id(), account.role());
    println!("  Cash balance:     {}", account.cash_balance());
    println!("  Learning points:  {}", account.learning_points());
    println!(
        "  Staked points:    {} ({:.1}x multiplier)",
        account.staked_points(),
        account.earning_multiplier()
    );
    println!("  Referral earnings: {}", account.total_referral_earnings());
    println!(
        "  Verified:         {}",
        if account.is_verified() { "yes" } else { "no" }
    );
    println!(
        "  Linked methods:   {}",
        if methods.is_empty() { "none".to_string() } else { methods.join(", ") }
    );
}
