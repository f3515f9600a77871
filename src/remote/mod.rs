//! The remote side of sync: the endpoint contract, its wire records, and the
//! two shipped endpoints (`NoOpRemote` for local-only mode, `FolderRemote` for a
//! shared directory).

mod folder;

pub use folder::FolderRemote;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{BalanceBaseline, SavingsGoal, SettingsSnapshot, SyncMeta, Transaction, TxType};
use crate::months::month_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsureIdentity {
    /// The remote has no memory of this device's earlier sync history.
    pub bootstrapped: bool,
}

/// Every call is fallible I/O; the synchronizer treats any `Err` as a soft
/// transport failure.
pub trait RemoteEndpoint {
    /// `None` means no identity is available and the cycle is skipped.
    fn ensure_identity(&self) -> Result<Option<EnsureIdentity>>;
    fn pull_deltas(&self, since: i64) -> Result<Vec<TransactionDto>>;
    /// Returns the ack timestamp; anything `<= 0` is a rejection.
    fn push_dirty(&self, rows: &[TransactionDto]) -> Result<i64>;
    fn fetch_transactions_before(&self, month_key_exclusive: &str, limit: usize) -> Result<Vec<TransactionDto>>;
    fn fetch_settings(&self) -> Result<Option<SettingsDto>>;
    /// `true` once the snapshot is persisted remotely.
    fn push_settings(&self, settings: &SettingsDto) -> Result<bool>;
    fn fetch_savings_goals(&self) -> Result<Vec<SavingsGoal>>;
    /// Returns the canonical server copy of each persisted goal.
    fn push_savings_goals(&self, goals: &[SavingsGoal]) -> Result<Vec<SavingsGoal>>;
}

/// Local-only mode: nothing is ever sent or received.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpRemote;

impl RemoteEndpoint for NoOpRemote {
    fn ensure_identity(&self) -> Result<Option<EnsureIdentity>> {
        Ok(None)
    }

    fn pull_deltas(&self, _since: i64) -> Result<Vec<TransactionDto>> {
        Ok(Vec::new())
    }

    fn push_dirty(&self, _rows: &[TransactionDto]) -> Result<i64> {
        Ok(0)
    }

    fn fetch_transactions_before(&self, _month_key_exclusive: &str, _limit: usize) -> Result<Vec<TransactionDto>> {
        Ok(Vec::new())
    }

    fn fetch_settings(&self) -> Result<Option<SettingsDto>> {
        Ok(None)
    }

    fn push_settings(&self, _settings: &SettingsDto) -> Result<bool> {
        Ok(false)
    }

    fn fetch_savings_goals(&self) -> Result<Vec<SavingsGoal>> {
        Ok(Vec::new())
    }

    fn push_savings_goals(&self, _goals: &[SavingsGoal]) -> Result<Vec<SavingsGoal>> {
        Ok(Vec::new())
    }
}

fn expense() -> TxType {
    TxType::Expense
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    pub date_millis: i64,
    #[serde(default)]
    pub month_key: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub planned: bool,
    #[serde(rename = "type", default = "expense")]
    pub tx_type: TxType,
    #[serde(default)]
    pub savings_goal_id: Option<String>,
    #[serde(default)]
    pub savings_impact: f64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub updated_at_server: Option<i64>,
}

impl From<&Transaction> for TransactionDto {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            owner_id: tx.owner_id.clone(),
            amount: tx.amount,
            currency: tx.currency.clone(),
            date_millis: tx.date_millis,
            month_key: tx.month_key.clone(),
            category: tx.category.clone(),
            note: tx.note.clone(),
            planned: tx.planned,
            tx_type: tx.tx_type,
            savings_goal_id: tx.savings_goal_id.clone(),
            savings_impact: tx.savings_impact,
            deleted: tx.sync.deleted,
            updated_at_server: tx.sync.updated_at_server,
        }
    }
}

impl TransactionDto {
    /// A clean local row carrying the delta's server timestamp.
    pub fn into_transaction(self) -> Transaction {
        let month_key = if self.month_key.trim().is_empty() {
            month_key(self.date_millis)
        } else {
            self.month_key
        };
        let mut tx = Transaction {
            id: self.id,
            owner_id: self.owner_id,
            amount: self.amount,
            currency: self.currency,
            date_millis: self.date_millis,
            month_key,
            category: self.category,
            note: self.note,
            planned: self.planned,
            tx_type: self.tx_type,
            savings_goal_id: self.savings_goal_id,
            savings_impact: self.savings_impact,
            sync: SyncMeta {
                dirty: false,
                pending_op: None,
                updated_at_local: 0,
                updated_at_server: self.updated_at_server,
                deleted: self.deleted,
            },
        };
        tx.normalize_savings();
        tx
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineDto {
    pub amount: f64,
    pub date_millis: i64,
}

/// Wire form of the settings singleton. Missing fields fall back to the
/// defaults so an older or partial remote record still reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsDto {
    pub language: String,
    pub currency: String,
    pub expense_categories: Vec<String>,
    pub income_categories: Vec<String>,
    pub budget_monthly: Option<f64>,
    pub budget_cycle_start_day: i64,
    pub theme_mode: String,
    pub accent_color: String,
    pub balance_baseline: Option<BaselineDto>,
    pub updated_at: i64,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self::from(&SettingsSnapshot::default())
    }
}

impl From<&SettingsSnapshot> for SettingsDto {
    fn from(s: &SettingsSnapshot) -> Self {
        Self {
            language: s.language.clone(),
            currency: s.currency.clone(),
            expense_categories: s.expense_categories.clone(),
            income_categories: s.income_categories.clone(),
            budget_monthly: s.budget_monthly,
            budget_cycle_start_day: s.budget_cycle_start_day as i64,
            theme_mode: s.theme_mode.clone(),
            accent_color: s.accent_color.clone(),
            balance_baseline: s.balance_baseline.map(|b| BaselineDto {
                amount: b.amount,
                date_millis: b.date_millis,
            }),
            updated_at: s.updated_at,
        }
    }
}

impl SettingsDto {
    /// Unsanitized; the settings reconciler sanitizes on apply.
    pub fn to_snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            language: self.language.clone(),
            currency: self.currency.clone(),
            expense_categories: self.expense_categories.clone(),
            income_categories: self.income_categories.clone(),
            budget_monthly: self.budget_monthly,
            budget_cycle_start_day: self.budget_cycle_start_day.clamp(0, u32::MAX as i64) as u32,
            theme_mode: self.theme_mode.clone(),
            accent_color: self.accent_color.clone(),
            balance_baseline: self.balance_baseline.as_ref().map(|b| BalanceBaseline {
                amount: b.amount,
                date_millis: b.date_millis,
            }),
            updated_at: self.updated_at,
            dirty: false,
        }
    }
}
