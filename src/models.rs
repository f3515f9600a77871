use serde::{Deserialize, Serialize};

use crate::months::month_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxType {
    Expense,
    Income,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Expense => "EXPENSE",
            TxType::Income => "INCOME",
        }
    }

    /// Unknown stored values read as `Expense`.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("INCOME") {
            TxType::Income
        } else {
            TxType::Expense
        }
    }
}

/// The operation to replay against the remote on the next push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PendingOp {
    Insert,
    Update,
    Delete,
}

impl PendingOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingOp::Insert => "INSERT",
            PendingOp::Update => "UPDATE",
            PendingOp::Delete => "DELETE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "INSERT" => Some(PendingOp::Insert),
            "UPDATE" => Some(PendingOp::Update),
            "DELETE" => Some(PendingOp::Delete),
            _ => None,
        }
    }

    /// Op to re-offer after a bootstrap: keep INSERT/DELETE, tombstones become
    /// DELETE, everything else UPDATE.
    pub fn for_bootstrap(current: Option<PendingOp>, deleted: bool) -> PendingOp {
        match current {
            Some(PendingOp::Delete) => PendingOp::Delete,
            Some(PendingOp::Insert) => PendingOp::Insert,
            _ if deleted => PendingOp::Delete,
            _ => PendingOp::Update,
        }
    }
}

/// Sync envelope carried by every synchronizable row.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncMeta {
    pub dirty: bool,
    pub pending_op: Option<PendingOp>,
    pub updated_at_local: i64,
    /// Server timestamp of the last value known to be persisted remotely.
    pub updated_at_server: Option<i64>,
    pub deleted: bool,
}

impl SyncMeta {
    pub fn new_local(now: i64) -> Self {
        Self {
            dirty: true,
            pending_op: Some(PendingOp::Insert),
            updated_at_local: now,
            updated_at_server: None,
            deleted: false,
        }
    }

    pub fn clean(server_ts: i64, now: i64, deleted: bool) -> Self {
        Self {
            dirty: false,
            pending_op: None,
            updated_at_local: now,
            updated_at_server: Some(server_ts),
            deleted,
        }
    }

    pub fn server_version(&self) -> i64 {
        self.updated_at_server.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub owner_id: String,
    pub amount: f64,
    pub currency: String,
    pub date_millis: i64,
    pub month_key: String,
    pub category: String,
    pub note: Option<String>,
    /// Future or recurring-generated entry.
    pub planned: bool,
    pub tx_type: TxType,
    pub savings_goal_id: Option<String>,
    pub savings_impact: f64,
    pub sync: SyncMeta,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: &str,
        amount: f64,
        currency: &str,
        date_millis: i64,
        category: &str,
        tx_type: TxType,
        note: Option<String>,
        now: i64,
    ) -> Self {
        Self {
            id: new_id(),
            owner_id: owner_id.to_string(),
            amount,
            currency: currency.to_string(),
            date_millis,
            month_key: month_key(date_millis),
            category: category.to_string(),
            note,
            planned: false,
            tx_type,
            savings_goal_id: None,
            savings_impact: 0.0,
            sync: SyncMeta::new_local(now),
        }
    }

    /// A zero-amount transfer into (or, with `withdraw`, out of) a savings goal.
    #[allow(clippy::too_many_arguments)]
    pub fn savings_entry(
        owner_id: &str,
        goal: &SavingsGoal,
        amount: f64,
        withdraw: bool,
        currency: &str,
        date_millis: i64,
        note: Option<String>,
        now: i64,
    ) -> Self {
        let (tx_type, impact) = if withdraw {
            (TxType::Expense, -amount.abs())
        } else {
            (TxType::Income, amount.abs())
        };
        let mut tx = Self::new(owner_id, 0.0, currency, date_millis, &goal.name, tx_type, note, now);
        tx.savings_goal_id = Some(goal.id.clone());
        tx.savings_impact = impact;
        tx
    }

    /// Signed effect on the running balance.
    pub fn signed_amount(&self) -> f64 {
        match self.tx_type {
            TxType::Income => self.amount,
            TxType::Expense => -self.amount,
        }
    }

    /// Blank goal ids become `None`; impact is zero without a goal.
    pub fn normalize_savings(&mut self) {
        self.savings_goal_id = self
            .savings_goal_id
            .take()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
        if self.savings_goal_id.is_none() {
            self.savings_impact = 0.0;
        }
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target: f64,
    #[serde(default)]
    pub deadline_millis: Option<i64>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub pending_op: Option<PendingOp>,
}

impl SavingsGoal {
    pub fn is_dirty(&self) -> bool {
        self.pending_op.is_some()
    }

    /// Deleted and already acknowledged; must not be retained.
    pub fn is_stale_tombstone(&self) -> bool {
        self.deleted && self.pending_op.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceBaseline {
    pub amount: f64,
    pub date_millis: i64,
}

/// Singleton settings record; the whole object is replaced in each sync direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnapshot {
    pub language: String,
    pub currency: String,
    pub expense_categories: Vec<String>,
    pub income_categories: Vec<String>,
    pub budget_monthly: Option<f64>,
    pub budget_cycle_start_day: u32,
    pub theme_mode: String,
    pub accent_color: String,
    pub balance_baseline: Option<BalanceBaseline>,
    pub updated_at: i64,
    pub dirty: bool,
}

pub mod defaults {
    pub const LANGUAGE: &str = "en";
    pub const CURRENCY: &str = "EUR";
    pub const THEME_MODE: &str = "dark";
    pub const ACCENT_COLOR: &str = "teal";
    pub const BUDGET_CYCLE_START_DAY: u32 = 1;
    pub const GOAL_NAME: &str = "Savings";
    pub const EXPENSE_CATEGORIES: &[&str] = &["Housing", "Transport", "Food", "Entertainment", "Other"];
    pub const INCOME_CATEGORIES: &[&str] = &["Salary", "Bonus", "Other"];
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            language: defaults::LANGUAGE.to_string(),
            currency: defaults::CURRENCY.to_string(),
            expense_categories: defaults::EXPENSE_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            income_categories: defaults::INCOME_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            budget_monthly: None,
            budget_cycle_start_day: defaults::BUDGET_CYCLE_START_DAY,
            theme_mode: defaults::THEME_MODE.to_string(),
            accent_color: defaults::ACCENT_COLOR.to_string(),
            balance_baseline: None,
            updated_at: 0,
            dirty: false,
        }
    }
}
