use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{EnsureIdentity, RemoteEndpoint, SettingsDto, TransactionDto};
use crate::error::{MoneyboxError, Result};
use crate::models::SavingsGoal;
use crate::months::now_millis;

/// One owner's state as stored in the shared folder.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Mailbox {
    last_server_ts: i64,
    transactions: BTreeMap<String, TransactionDto>,
    settings: Option<SettingsDto>,
    savings_goals: Vec<SavingsGoal>,
}

impl Mailbox {
    /// Strictly increasing, never behind the wall clock.
    fn next_server_ts(&mut self) -> i64 {
        self.last_server_ts = now_millis().max(self.last_server_ts + 1);
        self.last_server_ts
    }
}

/// A remote backed by `<root>/<owner>.json`. Several devices pointing at the
/// same folder (a synced drive, a network share) see each other's pushes.
#[derive(Debug, Clone)]
pub struct FolderRemote {
    root: PathBuf,
    owner_id: String,
}

fn transport(action: &str, path: &Path, e: impl std::fmt::Display) -> MoneyboxError {
    MoneyboxError::Remote(format!("{action} {}: {e}", path.display()))
}

impl FolderRemote {
    pub fn new(root: &Path, owner_id: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            owner_id: owner_id.to_string(),
        }
    }

    fn mailbox_path(&self) -> PathBuf {
        let safe: String = self
            .owner_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{safe}.json"))
    }

    fn read(&self) -> Result<Option<Mailbox>> {
        let path = self.mailbox_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(|e| transport("failed reading", &path, e))?;
        let mailbox = serde_json::from_slice(&bytes).map_err(|e| transport("failed parsing", &path, e))?;
        log::debug!("read mailbox {}", path.display());
        Ok(Some(mailbox))
    }

    fn load(&self) -> Result<Mailbox> {
        self.read()?
            .ok_or_else(|| MoneyboxError::Remote(format!("no mailbox for owner {}", self.owner_id)))
    }

    fn write(&self, mailbox: &Mailbox) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| transport("failed creating", &self.root, e))?;
        let path = self.mailbox_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(mailbox).map_err(|e| transport("failed serializing", &path, e))?;
        std::fs::write(&tmp, json).map_err(|e| transport("failed writing", &tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| transport("failed replacing", &path, e))?;
        log::debug!("wrote mailbox {}", path.display());
        Ok(())
    }
}

impl RemoteEndpoint for FolderRemote {
    fn ensure_identity(&self) -> Result<Option<EnsureIdentity>> {
        if self.read()?.is_some() {
            return Ok(Some(EnsureIdentity { bootstrapped: false }));
        }
        self.write(&Mailbox::default())?;
        log::info!("created mailbox for owner {}", self.owner_id);
        Ok(Some(EnsureIdentity { bootstrapped: true }))
    }

    fn pull_deltas(&self, since: i64) -> Result<Vec<TransactionDto>> {
        let mailbox = self.load()?;
        let mut deltas: Vec<TransactionDto> = mailbox
            .transactions
            .into_values()
            .filter(|t| t.updated_at_server.unwrap_or(0) > since)
            .collect();
        deltas.sort_by_key(|t| t.updated_at_server);
        Ok(deltas)
    }

    fn push_dirty(&self, rows: &[TransactionDto]) -> Result<i64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut mailbox = self.load()?;
        let ts = mailbox.next_server_ts();
        for row in rows {
            let stored = TransactionDto {
                updated_at_server: Some(ts),
                ..row.clone()
            };
            mailbox.transactions.insert(stored.id.clone(), stored);
        }
        self.write(&mailbox)?;
        Ok(ts)
    }

    fn fetch_transactions_before(&self, month_key_exclusive: &str, limit: usize) -> Result<Vec<TransactionDto>> {
        let mailbox = self.load()?;
        let mut older: Vec<TransactionDto> = mailbox
            .transactions
            .into_values()
            .filter(|t| !t.deleted && t.month_key.as_str() < month_key_exclusive)
            .collect();
        older.sort_by(|a, b| b.date_millis.cmp(&a.date_millis));
        older.truncate(limit);
        Ok(older)
    }

    fn fetch_settings(&self) -> Result<Option<SettingsDto>> {
        Ok(self.load()?.settings)
    }

    fn push_settings(&self, settings: &SettingsDto) -> Result<bool> {
        let mut mailbox = self.load()?;
        mailbox.settings = Some(settings.clone());
        self.write(&mailbox)?;
        Ok(true)
    }

    fn fetch_savings_goals(&self) -> Result<Vec<SavingsGoal>> {
        Ok(self.load()?.savings_goals)
    }

    fn push_savings_goals(&self, goals: &[SavingsGoal]) -> Result<Vec<SavingsGoal>> {
        let mut mailbox = self.load()?;
        let mut acks = Vec::with_capacity(goals.len());
        for goal in goals {
            let canonical = SavingsGoal {
                updated_at: mailbox.next_server_ts(),
                pending_op: None,
                ..goal.clone()
            };
            match mailbox.savings_goals.iter_mut().find(|g| g.id == goal.id) {
                Some(existing) => *existing = canonical.clone(),
                None => mailbox.savings_goals.push(canonical.clone()),
            }
            acks.push(canonical);
        }
        self.write(&mailbox)?;
        Ok(acks)
    }
}
