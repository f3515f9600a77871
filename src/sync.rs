use log::{debug, info, warn};
use rusqlite::Connection;

use crate::db::with_transaction;
use crate::error::Result;
use crate::models::{SavingsGoal, Transaction};
use crate::months::now_millis;
use crate::preferences;
use crate::reconcile::transactions::merge_delta;
use crate::remote::{RemoteEndpoint, SettingsDto, TransactionDto};
use crate::transactions;

/// Runs pull/push cycles between the local store and one remote endpoint.
///
/// Remote failures are soft: they are logged and the affected stage returns
/// nothing, leaving dirty state in place for the next cycle. Local store
/// errors still propagate. Callers must not run two cycles at once against
/// the same database.
pub struct Synchronizer<'a, R: RemoteEndpoint + ?Sized> {
    conn: &'a Connection,
    remote: &'a R,
    clock: fn() -> i64,
}

impl<'a, R: RemoteEndpoint + ?Sized> Synchronizer<'a, R> {
    pub fn new(conn: &'a Connection, remote: &'a R) -> Self {
        Self {
            conn,
            remote,
            clock: now_millis,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// `Some(bootstrapped)` when the remote is reachable. A failed or absent
    /// identity skips the whole cycle without touching local state.
    fn ensure_identity(&self) -> Result<Option<bool>> {
        let identity = match self.remote.ensure_identity() {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                debug!("no remote identity; skipping sync");
                return Ok(None);
            }
            Err(e) => {
                warn!("ensure identity failed: {e}");
                return Ok(None);
            }
        };
        if identity.bootstrapped {
            self.bootstrap()?;
        }
        Ok(Some(identity.bootstrapped))
    }

    /// Re-offer all local state to a remote that has no memory of this device.
    fn bootstrap(&self) -> Result<()> {
        let now = (self.clock)();
        let (rows, goals) = with_transaction(self.conn, |c| {
            let rows = transactions::mark_all_dirty(c, now)?;
            let goals = preferences::flag_goals_for_bootstrap(c, now)?;
            preferences::mark_settings_dirty(c)?;
            preferences::set_last_delta_sync_at(c, 0)?;
            Ok((rows, goals))
        })?;
        info!("bootstrap: re-flagged {rows} transactions and {goals} goals, checkpoint reset");
        Ok(())
    }

    /// Pull remote changes into the local store. Returns how many local
    /// records changed across settings, transactions and goals.
    pub fn pull_and_merge(&self) -> Result<usize> {
        let Some(bootstrapped) = self.ensure_identity()? else {
            return Ok(0);
        };
        let mut changed = 0;
        if !bootstrapped {
            changed += self.merge_settings()?;
        }
        changed += self.merge_deltas()?;
        changed += self.merge_goals()?;
        Ok(changed)
    }

    fn merge_settings(&self) -> Result<usize> {
        let remote = match self.remote.fetch_settings() {
            Ok(Some(remote)) => remote,
            Ok(None) => return Ok(0),
            Err(e) => {
                warn!("settings fetch failed: {e}");
                return Ok(0);
            }
        };
        let applied = preferences::apply_remote_settings(self.conn, &remote.to_snapshot(), (self.clock)())?;
        if applied {
            info!("applied remote settings from {}", remote.updated_at);
        }
        Ok(usize::from(applied))
    }

    fn merge_deltas(&self) -> Result<usize> {
        let since = preferences::last_delta_sync_at(self.conn)?;
        let deltas = match self.remote.pull_deltas(since) {
            Ok(deltas) => deltas,
            Err(e) => {
                warn!("delta pull since {since} failed: {e}");
                return Ok(0);
            }
        };
        let now = (self.clock)();
        let (applied, high_water) = with_transaction(self.conn, |c| {
            let mut accepted: Vec<Transaction> = Vec::new();
            let mut high_water = since;
            for delta in deltas {
                let carried = delta.updated_at_server;
                let local = transactions::get_by_id(c, &delta.id)?;
                match merge_delta(local.as_ref(), delta.into_transaction(), now) {
                    Some(row) => {
                        accepted.push(row);
                        if let Some(ts) = carried {
                            high_water = high_water.max(ts);
                        }
                    }
                    None => {
                        if let Some(kept) = local {
                            debug!("kept local copy of {}", kept.id);
                        }
                    }
                }
            }
            transactions::upsert_all(c, &accepted)?;
            preferences::advance_checkpoint(c, high_water)?;
            Ok((accepted.len(), high_water))
        })?;
        if applied > 0 {
            info!("applied {applied} deltas, checkpoint {high_water}");
        }
        Ok(applied)
    }

    fn merge_goals(&self) -> Result<usize> {
        let remote = match self.remote.fetch_savings_goals() {
            Ok(goals) => goals,
            Err(e) => {
                warn!("savings goal fetch failed: {e}");
                return Ok(0);
            }
        };
        let applied = preferences::merge_remote_goals(self.conn, &remote)?;
        if applied > 0 {
            info!("merged {applied} remote savings goals");
        }
        Ok(applied)
    }

    /// Push up to `limit` dirty transactions plus dirty settings and pending
    /// goals. Returns how many items were promoted to clean.
    pub fn push_dirty_batch(&self, limit: usize) -> Result<usize> {
        let Some(bootstrapped) = self.ensure_identity()? else {
            return Ok(0);
        };
        let rows = transactions::select_dirty(self.conn, limit)?;
        let goals = preferences::pending_goals(self.conn)?;
        let settings = preferences::snapshot(self.conn)?;
        if rows.is_empty() && goals.is_empty() && !settings.dirty && !bootstrapped {
            return Ok(0);
        }

        let mut promoted = 0;
        if !rows.is_empty() {
            promoted += self.push_transactions(&rows)?;
        }
        if settings.dirty {
            promoted += self.push_settings(&SettingsDto::from(&settings))?;
        }
        if !goals.is_empty() {
            promoted += self.push_goals(goals)?;
        }
        Ok(promoted)
    }

    fn push_transactions(&self, rows: &[Transaction]) -> Result<usize> {
        let batch: Vec<TransactionDto> = rows.iter().map(TransactionDto::from).collect();
        let ack = match self.remote.push_dirty(&batch) {
            Ok(ack) => ack,
            Err(e) => {
                warn!("push of {} transactions failed: {e}", batch.len());
                return Ok(0);
            }
        };
        if ack <= 0 {
            warn!("push of {} transactions rejected", batch.len());
            return Ok(0);
        }
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let cleaned = with_transaction(self.conn, |c| {
            let cleaned = transactions::mark_clean(c, &ids, ack)?;
            preferences::advance_checkpoint(c, ack)?;
            Ok(cleaned)
        })?;
        info!("push acknowledged at {ack}: {cleaned} transactions clean");
        Ok(cleaned)
    }

    fn push_settings(&self, settings: &SettingsDto) -> Result<usize> {
        match self.remote.push_settings(settings) {
            Ok(true) => {
                let cleaned = preferences::mark_settings_synced_if_unchanged(self.conn, settings.updated_at)?;
                Ok(usize::from(cleaned))
            }
            Ok(false) => {
                warn!("settings push rejected");
                Ok(0)
            }
            Err(e) => {
                warn!("settings push failed: {e}");
                Ok(0)
            }
        }
    }

    fn push_goals(&self, pending: Vec<SavingsGoal>) -> Result<usize> {
        let now = (self.clock)();
        let outgoing: Vec<SavingsGoal> = pending
            .into_iter()
            .map(|g| SavingsGoal {
                updated_at: if g.updated_at == 0 { now } else { g.updated_at },
                ..g
            })
            .collect();
        let acks = match self.remote.push_savings_goals(&outgoing) {
            Ok(acks) => acks,
            Err(e) => {
                warn!("savings goal push failed: {e}");
                return Ok(0);
            }
        };
        preferences::mark_goals_synced(self.conn, &acks)?;
        debug!("{} savings goals acknowledged", acks.len());
        Ok(acks.len())
    }

    /// Goal-only cycle: merge the remote list, then push what is still pending.
    pub fn sync_savings_goals(&self) -> Result<usize> {
        if self.ensure_identity()?.is_none() {
            return Ok(0);
        }
        let mut changed = self.merge_goals()?;
        let pending = preferences::pending_goals(self.conn)?;
        if !pending.is_empty() {
            changed += self.push_goals(pending)?;
        }
        Ok(changed)
    }

    /// Read-only fetch of remote history before `month_key_exclusive`. Nothing
    /// is written locally.
    pub fn fetch_older_transactions(&self, month_key_exclusive: &str, limit: usize) -> Result<Vec<Transaction>> {
        if self.ensure_identity()?.is_none() {
            return Ok(Vec::new());
        }
        match self.remote.fetch_transactions_before(month_key_exclusive, limit) {
            Ok(rows) => Ok(rows.into_iter().map(TransactionDto::into_transaction).collect()),
            Err(e) => {
                warn!("fetch before {month_key_exclusive} failed: {e}");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::db::test_db;
    use crate::error::MoneyboxError;
    use crate::models::{PendingOp, TxType};
    use crate::remote::{EnsureIdentity, NoOpRemote};
    use crate::transactions::tests::sample;

    const NOW: i64 = 1_700_000_000_000;

    fn clock() -> i64 {
        NOW
    }

    /// Scripted endpoint. `None` in `identity` means unreachable.
    struct ScriptedRemote {
        identity: Cell<Option<bool>>,
        deltas: RefCell<Vec<TransactionDto>>,
        ack: Cell<i64>,
        fail_push: Cell<bool>,
        settings: RefCell<Option<SettingsDto>>,
        goals: RefCell<Vec<SavingsGoal>>,
        pushed: RefCell<Vec<Vec<TransactionDto>>>,
        pushed_settings: RefCell<Vec<SettingsDto>>,
        pushed_goals: RefCell<Vec<SavingsGoal>>,
        pulled_since: RefCell<Vec<i64>>,
    }

    impl ScriptedRemote {
        fn new() -> Self {
            Self {
                identity: Cell::new(Some(false)),
                deltas: RefCell::new(Vec::new()),
                ack: Cell::new(5_000),
                fail_push: Cell::new(false),
                settings: RefCell::new(None),
                goals: RefCell::new(Vec::new()),
                pushed: RefCell::new(Vec::new()),
                pushed_settings: RefCell::new(Vec::new()),
                pushed_goals: RefCell::new(Vec::new()),
                pulled_since: RefCell::new(Vec::new()),
            }
        }
    }

    impl RemoteEndpoint for ScriptedRemote {
        fn ensure_identity(&self) -> Result<Option<EnsureIdentity>> {
            match self.identity.get() {
                Some(bootstrapped) => {
                    // Bootstrap is reported once.
                    self.identity.set(Some(false));
                    Ok(Some(EnsureIdentity { bootstrapped }))
                }
                None => Err(MoneyboxError::Remote("offline".into())),
            }
        }

        fn pull_deltas(&self, since: i64) -> Result<Vec<TransactionDto>> {
            self.pulled_since.borrow_mut().push(since);
            Ok(self.deltas.borrow().clone())
        }

        fn push_dirty(&self, rows: &[TransactionDto]) -> Result<i64> {
            if self.fail_push.get() {
                return Err(MoneyboxError::Remote("timeout".into()));
            }
            self.pushed.borrow_mut().push(rows.to_vec());
            Ok(self.ack.get())
        }

        fn fetch_transactions_before(&self, month_key_exclusive: &str, limit: usize) -> Result<Vec<TransactionDto>> {
            let mut rows: Vec<TransactionDto> = self
                .deltas
                .borrow()
                .iter()
                .filter(|d| d.month_key.as_str() < month_key_exclusive)
                .cloned()
                .collect();
            rows.truncate(limit);
            Ok(rows)
        }

        fn fetch_settings(&self) -> Result<Option<SettingsDto>> {
            Ok(self.settings.borrow().clone())
        }

        fn push_settings(&self, settings: &SettingsDto) -> Result<bool> {
            self.pushed_settings.borrow_mut().push(settings.clone());
            Ok(true)
        }

        fn fetch_savings_goals(&self) -> Result<Vec<SavingsGoal>> {
            Ok(self.goals.borrow().clone())
        }

        fn push_savings_goals(&self, goals: &[SavingsGoal]) -> Result<Vec<SavingsGoal>> {
            self.pushed_goals.borrow_mut().extend(goals.iter().cloned());
            Ok(goals
                .iter()
                .map(|g| SavingsGoal {
                    pending_op: None,
                    ..g.clone()
                })
                .collect())
        }
    }

    fn delta(id: &str, amount: f64, server_ts: i64) -> TransactionDto {
        let mut tx = sample(id, amount, "2024-03-10", TxType::Expense);
        tx.sync.updated_at_server = Some(server_ts);
        TransactionDto::from(&tx)
    }

    fn stored(conn: &Connection, id: &str) -> Transaction {
        transactions::get_by_id(conn, id).unwrap().unwrap()
    }

    #[test]
    fn test_push_then_push_again_is_noop() {
        let (_dir, conn) = test_db();
        transactions::upsert(&conn, &sample("t1", 10.0, "2024-03-01", TxType::Expense)).unwrap();
        let remote = ScriptedRemote::new();
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.push_dirty_batch(100).unwrap(), 1);
        let row = stored(&conn, "t1");
        assert!(!row.sync.dirty);
        assert_eq!(row.sync.pending_op, None);
        assert_eq!(row.sync.updated_at_server, Some(5_000));
        assert_eq!(preferences::last_delta_sync_at(&conn).unwrap(), 5_000);

        assert_eq!(sync.push_dirty_batch(100).unwrap(), 0);
        assert_eq!(remote.pushed.borrow().len(), 1);
    }

    #[test]
    fn test_zero_ack_leaves_rows_dirty() {
        let (_dir, conn) = test_db();
        transactions::upsert(&conn, &sample("t1", 10.0, "2024-03-01", TxType::Expense)).unwrap();
        preferences::set_last_delta_sync_at(&conn, 700).unwrap();
        let remote = ScriptedRemote::new();
        remote.ack.set(0);
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.push_dirty_batch(100).unwrap(), 0);
        assert!(stored(&conn, "t1").sync.dirty);
        assert_eq!(preferences::last_delta_sync_at(&conn).unwrap(), 700);
    }

    #[test]
    fn test_push_transport_failure_leaves_rows_dirty_and_pushes_other_legs() {
        let (_dir, conn) = test_db();
        transactions::upsert(&conn, &sample("t1", 10.0, "2024-03-01", TxType::Expense)).unwrap();
        preferences::set_currency(&conn, "USD", 10).unwrap();
        let remote = ScriptedRemote::new();
        remote.fail_push.set(true);
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.push_dirty_batch(100).unwrap(), 1);
        assert!(stored(&conn, "t1").sync.dirty);
        assert!(!preferences::snapshot(&conn).unwrap().dirty);
    }

    #[test]
    fn test_push_respects_limit() {
        let (_dir, conn) = test_db();
        for i in 0..3 {
            transactions::upsert(&conn, &sample(&format!("t{i}"), 1.0, "2024-03-01", TxType::Expense)).unwrap();
        }
        let remote = ScriptedRemote::new();
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);
        assert_eq!(sync.push_dirty_batch(2).unwrap(), 2);
        assert_eq!(transactions::count_dirty(&conn).unwrap(), 1);
    }

    #[test]
    fn test_dirty_local_wins_over_delta() {
        let (_dir, conn) = test_db();
        transactions::upsert(&conn, &sample("t1", 10.0, "2024-03-01", TxType::Expense)).unwrap();
        let remote = ScriptedRemote::new();
        remote.deltas.borrow_mut().push(delta("t1", 999.0, 9_000_000));
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.pull_and_merge().unwrap(), 0);
        let row = stored(&conn, "t1");
        assert_eq!(row.amount, 10.0);
        assert!(row.sync.dirty);
    }

    #[test]
    fn test_pull_applies_new_rows_clean_and_advances_checkpoint() {
        let (_dir, conn) = test_db();
        preferences::set_last_delta_sync_at(&conn, 100).unwrap();
        let remote = ScriptedRemote::new();
        remote.deltas.borrow_mut().extend([delta("a", 1.0, 300), delta("b", 2.0, 200)]);
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.pull_and_merge().unwrap(), 2);
        assert_eq!(remote.pulled_since.borrow()[0], 100);
        let a = stored(&conn, "a");
        assert!(!a.sync.dirty);
        assert_eq!(a.sync.updated_at_server, Some(300));
        assert_eq!(a.sync.updated_at_local, NOW);
        assert_eq!(preferences::last_delta_sync_at(&conn).unwrap(), 300);
    }

    #[test]
    fn test_stale_delta_does_not_regress_row_or_checkpoint() {
        let (_dir, conn) = test_db();
        let mut local = sample("t1", 10.0, "2024-03-01", TxType::Expense);
        local.sync = crate::models::SyncMeta::clean(500, 1, false);
        transactions::upsert(&conn, &local).unwrap();
        preferences::set_last_delta_sync_at(&conn, 800).unwrap();
        let remote = ScriptedRemote::new();
        remote.deltas.borrow_mut().push(delta("t1", 1.0, 400));
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        sync.pull_and_merge().unwrap();
        assert_eq!(stored(&conn, "t1").amount, 10.0);
        assert_eq!(preferences::last_delta_sync_at(&conn).unwrap(), 800);
    }

    #[test]
    fn test_first_contact_settings_applied() {
        let (_dir, conn) = test_db();
        let remote = ScriptedRemote::new();
        *remote.settings.borrow_mut() = Some(SettingsDto {
            currency: "SEK".into(),
            language: "sv-SE".into(),
            updated_at: 0,
            ..Default::default()
        });
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.pull_and_merge().unwrap(), 1);
        let s = preferences::snapshot(&conn).unwrap();
        assert_eq!(s.currency, "SEK");
        assert_eq!(s.language, "sv");
        assert!(!s.dirty);
    }

    #[test]
    fn test_bootstrap_reflags_everything_and_skips_settings_merge() {
        let (_dir, conn) = test_db();
        let mut synced = sample("clean", 10.0, "2024-03-01", TxType::Expense);
        synced.sync = crate::models::SyncMeta::clean(500, 1, false);
        let mut gone = sample("gone", 5.0, "2024-03-02", TxType::Expense);
        gone.sync = crate::models::SyncMeta::clean(500, 1, true);
        transactions::upsert_all(
            &conn,
            &[synced, gone, sample("fresh", 1.0, "2024-03-03", TxType::Income)],
        )
        .unwrap();
        let goal = preferences::add_goal(&conn, "Trip", 100.0, None, 1).unwrap();
        preferences::mark_goals_synced(&conn, &[SavingsGoal { pending_op: None, ..goal }]).unwrap();
        preferences::set_last_delta_sync_at(&conn, 900).unwrap();

        let remote = ScriptedRemote::new();
        remote.identity.set(Some(true));
        remote.ack.set(0);
        *remote.settings.borrow_mut() = Some(SettingsDto {
            currency: "SEK".into(),
            updated_at: 99_999,
            ..Default::default()
        });
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        sync.pull_and_merge().unwrap();
        assert_eq!(stored(&conn, "clean").sync.pending_op, Some(PendingOp::Update));
        assert_eq!(stored(&conn, "gone").sync.pending_op, Some(PendingOp::Delete));
        assert_eq!(stored(&conn, "fresh").sync.pending_op, Some(PendingOp::Insert));
        assert_eq!(transactions::count_dirty(&conn).unwrap(), 3);
        assert_eq!(preferences::last_delta_sync_at(&conn).unwrap(), 0);
        let s = preferences::snapshot(&conn).unwrap();
        assert!(s.dirty);
        assert_eq!(s.currency, "EUR");
        assert_eq!(preferences::pending_goals(&conn).unwrap()[0].pending_op, Some(PendingOp::Update));
    }

    #[test]
    fn test_bootstrap_push_reoffers_settings_even_when_nothing_else_is_dirty() {
        let (_dir, conn) = test_db();
        let remote = ScriptedRemote::new();
        remote.identity.set(Some(true));
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.push_dirty_batch(10).unwrap(), 1);
        assert_eq!(remote.pushed_settings.borrow().len(), 1);
        assert!(!preferences::snapshot(&conn).unwrap().dirty);
    }

    #[test]
    fn test_identity_failure_mutates_nothing() {
        let (_dir, conn) = test_db();
        transactions::upsert(&conn, &sample("t1", 10.0, "2024-03-01", TxType::Expense)).unwrap();
        let remote = ScriptedRemote::new();
        remote.identity.set(None);
        remote.deltas.borrow_mut().push(delta("t2", 1.0, 50));
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.pull_and_merge().unwrap(), 0);
        assert_eq!(sync.push_dirty_batch(10).unwrap(), 0);
        assert!(transactions::get_by_id(&conn, "t2").unwrap().is_none());
        assert!(stored(&conn, "t1").sync.dirty);
        assert!(remote.pushed.borrow().is_empty());
    }

    #[test]
    fn test_noop_remote_is_local_only() {
        let (_dir, conn) = test_db();
        transactions::upsert(&conn, &sample("t1", 10.0, "2024-03-01", TxType::Expense)).unwrap();
        let remote = NoOpRemote;
        let sync = Synchronizer::new(&conn, &remote);
        assert_eq!(sync.pull_and_merge().unwrap(), 0);
        assert_eq!(sync.push_dirty_batch(10).unwrap(), 0);
        assert!(stored(&conn, "t1").sync.dirty);
    }

    #[test]
    fn test_goals_merge_on_pull_and_push_pending() {
        let (_dir, conn) = test_db();
        let local = preferences::add_goal(&conn, "Car", 500.0, None, 0).unwrap();
        let remote = ScriptedRemote::new();
        remote.goals.borrow_mut().push(SavingsGoal {
            id: "g1".into(),
            name: "Trip".into(),
            target: 150.0,
            deadline_millis: None,
            updated_at: 20,
            deleted: false,
            pending_op: None,
        });
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        assert_eq!(sync.pull_and_merge().unwrap(), 1);
        assert_eq!(preferences::visible_goals(&conn).unwrap().len(), 2);

        assert_eq!(sync.push_dirty_batch(10).unwrap(), 1);
        let pushed = remote.pushed_goals.borrow();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].id, local.id);
        assert_eq!(pushed[0].updated_at, NOW);
        assert!(preferences::pending_goals(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_sync_savings_goals_standalone() {
        let (_dir, conn) = test_db();
        preferences::add_goal(&conn, "Bike", 300.0, None, 10).unwrap();
        let remote = ScriptedRemote::new();
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);
        assert_eq!(sync.sync_savings_goals().unwrap(), 1);
        assert!(preferences::pending_goals(&conn).unwrap().is_empty());
        assert!(remote.pushed.borrow().is_empty());
    }

    #[test]
    fn test_fetch_older_is_read_only() {
        let (_dir, conn) = test_db();
        let remote = ScriptedRemote::new();
        remote.deltas.borrow_mut().push(delta("old", 3.0, 10));
        let sync = Synchronizer::new(&conn, &remote).with_clock(clock);

        let older = sync.fetch_older_transactions("2024-04", 10).unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].id, "old");
        assert!(transactions::get_by_id(&conn, "old").unwrap().is_none());
        assert!(sync.fetch_older_transactions("2024-01", 10).unwrap().is_empty());
    }
}
