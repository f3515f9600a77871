pub mod entries;
pub mod goals;
pub mod init;
pub mod settings;
pub mod status;
pub mod summary;
pub mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::config::{load_config, Config};
use crate::db::{get_connection, init_db};
use crate::error::{MoneyboxError, Result};
use crate::months::{month_key, now_millis, parse_date};
use crate::remote::{FolderRemote, NoOpRemote, RemoteEndpoint};

/// Open the configured database, failing with a hint when `init` never ran.
pub(crate) fn open_store() -> Result<(Config, Connection)> {
    let config = load_config();
    let db_path = config.db_path();
    if !db_path.exists() {
        return Err(MoneyboxError::Config(format!(
            "database not found at {}. Run `moneybox init` to set up.",
            db_path.display()
        )));
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    Ok((config, conn))
}

pub(crate) fn remote_for(config: &Config) -> Box<dyn RemoteEndpoint> {
    match &config.remote {
        Some(dir) => Box::new(FolderRemote::new(&PathBuf::from(dir), &config.owner_id)),
        None => Box::new(NoOpRemote),
    }
}

/// `YYYY-MM-DD` or today, as local-midnight millis.
pub(crate) fn parse_date_opt(date: &Option<String>) -> Result<i64> {
    match date {
        Some(raw) => Ok(crate::months::date_to_millis(parse_date(raw)?)),
        None => Ok(now_millis()),
    }
}

pub(crate) fn month_or_current(month: &Option<String>) -> Result<String> {
    match month {
        Some(m) => {
            crate::months::parse_month(m)?;
            Ok(m.clone())
        }
        None => Ok(month_key(now_millis())),
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[derive(Parser)]
#[command(name = "moneybox", about = "Offline-first personal budget tracker with folder sync.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up moneybox: choose a data directory and initialize the database.
    Init {
        /// Path for moneybox data (default: ~/Documents/moneybox)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Owner id used for sync (default: local)
        #[arg(long)]
        owner: Option<String>,
        /// Shared folder to sync through
        #[arg(long)]
        remote: Option<String>,
        /// Stop syncing and run local-only
        #[arg(long = "no-remote", conflicts_with = "remote")]
        no_remote: bool,
    },
    /// Record an expense or income.
    Add {
        /// Amount (positive)
        amount: f64,
        /// Category (default: first category of the type)
        #[arg(long)]
        category: Option<String>,
        /// Record as income instead of expense
        #[arg(long)]
        income: bool,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Repeat monthly this many more times
        #[arg(long, default_value = "0")]
        repeat: u32,
    },
    /// Move money into (or out of) a savings goal.
    Save {
        /// Goal ID (shown in `moneybox goals list`)
        goal: String,
        /// Amount (positive)
        amount: f64,
        /// Take money out of the goal instead
        #[arg(long)]
        withdraw: bool,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Edit an existing transaction.
    Edit {
        /// Transaction ID (prefix allowed)
        id: String,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        /// Date: YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Change type: expense or income
        #[arg(long = "type")]
        tx_type: Option<String>,
    },
    /// Delete a transaction.
    Delete {
        /// Transaction ID (prefix allowed)
        id: String,
    },
    /// List transactions.
    List {
        /// Month: YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Most recently edited entries instead of a month
        #[arg(long, conflicts_with_all = ["month", "planned", "before"])]
        recent: Option<usize>,
        /// Upcoming planned entries
        #[arg(long, conflicts_with_all = ["month", "before"])]
        planned: bool,
        /// Local history before this month: YYYY-MM
        #[arg(long, conflicts_with = "month")]
        before: Option<String>,
        /// Date range start: YYYY-MM-DD
        #[arg(long = "from", requires = "to_date", conflicts_with_all = ["month", "planned", "before"])]
        from_date: Option<String>,
        /// Date range end (inclusive): YYYY-MM-DD
        #[arg(long = "to", requires = "from_date")]
        to_date: Option<String>,
    },
    /// Month and budget-cycle summary.
    Summary {
        /// Month: YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Show category spending over this many months
        #[arg(long, default_value = "1")]
        months: usize,
    },
    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Manage savings goals.
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Synchronize with the configured remote.
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Show configuration, database and sync state.
    Status,
    /// Permanently remove synced deletions older than the retention window.
    Purge {
        /// Retention in days (default: from config)
        #[arg(long)]
        days: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print current settings.
    Show,
    /// Set one setting.
    Set {
        /// language, currency, theme, accent, budget, cycle-day, expense-categories, income-categories
        key: String,
        /// New value (comma-separated for category lists, `none` clears the budget)
        value: String,
    },
    /// Set the opening balance baseline.
    Baseline {
        amount: f64,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove the opening balance baseline.
    ClearBaseline,
}

#[derive(Subcommand)]
pub enum GoalsCommands {
    /// List savings goals with progress.
    List,
    /// Add a savings goal.
    Add {
        name: String,
        #[arg(long)]
        target: f64,
        /// Deadline: YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Update a savings goal.
    Update {
        /// Goal ID (prefix allowed)
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        /// Deadline: YYYY-MM-DD, or `none` to clear
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Delete a savings goal.
    Delete {
        /// Goal ID (prefix allowed)
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Pull then push (the default).
    All,
    /// Pull remote changes only.
    Pull,
    /// Push local changes only.
    Push,
    /// Merge and push savings goals only.
    Goals,
    /// Show remote history older than a month without storing it.
    Older {
        /// Month: YYYY-MM (exclusive)
        #[arg(long)]
        before: String,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}
