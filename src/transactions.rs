use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::with_transaction;
use crate::error::{MoneyboxError, Result};
use crate::models::{new_id, PendingOp, SyncMeta, Transaction, TxType};
use crate::months::{add_months_to_millis, month_key};

const COLUMNS: &str = "id, owner_id, amount, currency, date_millis, month_key, category, note, planned, \
                       tx_type, savings_goal_id, savings_impact, deleted, dirty, pending_op, \
                       updated_at_local, updated_at_server";

fn from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let tx_type: String = row.get(9)?;
    let pending_op: Option<String> = row.get(14)?;
    Ok(Transaction {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        date_millis: row.get(4)?,
        month_key: row.get(5)?,
        category: row.get(6)?,
        note: row.get(7)?,
        planned: row.get(8)?,
        tx_type: TxType::parse(&tx_type),
        savings_goal_id: row.get(10)?,
        savings_impact: row.get(11)?,
        sync: SyncMeta {
            deleted: row.get(12)?,
            dirty: row.get(13)?,
            pending_op: pending_op.as_deref().and_then(PendingOp::parse),
            updated_at_local: row.get(15)?,
            updated_at_server: row.get(16)?,
        },
    })
}

fn query(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Record store: sync envelope operations
// ---------------------------------------------------------------------------

pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Transaction>> {
    let sql = format!("SELECT {COLUMNS} FROM transactions WHERE id = ?1 LIMIT 1");
    Ok(conn.query_row(&sql, [id], from_row).optional()?)
}

/// Resolve a unique id prefix among live rows.
pub fn resolve_id(conn: &Connection, prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(MoneyboxError::UnknownTransaction(prefix.to_string()));
    }
    let mut stmt =
        conn.prepare("SELECT id FROM transactions WHERE deleted = 0 AND substr(id, 1, length(?1)) = ?1 LIMIT 2")?;
    let ids = stmt
        .query_map([prefix], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match ids.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(MoneyboxError::UnknownTransaction(prefix.to_string())),
        _ => Err(MoneyboxError::InvalidInput(format!("id prefix '{prefix}' is ambiguous"))),
    }
}

pub fn upsert(conn: &Connection, tx: &Transaction) -> Result<()> {
    conn.execute(
        "INSERT INTO transactions (id, owner_id, amount, currency, date_millis, month_key, category, note, \
         planned, tx_type, savings_goal_id, savings_impact, deleted, dirty, pending_op, updated_at_local, \
         updated_at_server) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17) \
         ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, amount = excluded.amount, \
         currency = excluded.currency, date_millis = excluded.date_millis, month_key = excluded.month_key, \
         category = excluded.category, note = excluded.note, planned = excluded.planned, \
         tx_type = excluded.tx_type, savings_goal_id = excluded.savings_goal_id, \
         savings_impact = excluded.savings_impact, deleted = excluded.deleted, dirty = excluded.dirty, \
         pending_op = excluded.pending_op, updated_at_local = excluded.updated_at_local, \
         updated_at_server = excluded.updated_at_server",
        params![
            tx.id,
            tx.owner_id,
            tx.amount,
            tx.currency,
            tx.date_millis,
            tx.month_key,
            tx.category,
            tx.note,
            tx.planned,
            tx.tx_type.as_str(),
            tx.savings_goal_id,
            tx.savings_impact,
            tx.sync.deleted,
            tx.sync.dirty,
            tx.sync.pending_op.map(|op| op.as_str()),
            tx.sync.updated_at_local,
            tx.sync.updated_at_server,
        ],
    )?;
    Ok(())
}

pub fn upsert_all(conn: &Connection, rows: &[Transaction]) -> Result<()> {
    with_transaction(conn, |c| {
        for tx in rows {
            upsert(c, tx)?;
        }
        Ok(())
    })
}

/// Soft-delete. The row stays until the delete is acknowledged remotely.
pub fn mark_tombstoned(conn: &Connection, id: &str, now: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE transactions SET deleted = 1, dirty = 1, pending_op = 'DELETE', updated_at_local = ?2 \
         WHERE id = ?1",
        params![id, now],
    )?;
    Ok(changed > 0)
}

pub fn select_dirty(conn: &Connection, limit: usize) -> Result<Vec<Transaction>> {
    let sql = format!("SELECT {COLUMNS} FROM transactions WHERE dirty = 1 ORDER BY updated_at_local LIMIT ?1");
    query(conn, &sql, [limit as i64])
}

pub fn count_dirty(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM transactions WHERE dirty = 1", [], |r| r.get(0))?)
}

/// Promote rows to clean after the remote acknowledged them at `ack`.
pub fn mark_clean(conn: &Connection, ids: &[String], ack: i64) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    with_transaction(conn, |c| {
        let mut stmt = c.prepare(
            "UPDATE transactions SET dirty = 0, pending_op = NULL, updated_at_server = ?2 WHERE id = ?1",
        )?;
        let mut changed = 0;
        for id in ids {
            changed += stmt.execute(params![id, ack])?;
        }
        Ok(changed)
    })
}

pub fn mark_all_dirty(conn: &Connection, now: i64) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE transactions SET dirty = 1, \
         pending_op = CASE \
             WHEN pending_op = 'DELETE' THEN 'DELETE' \
             WHEN pending_op = 'INSERT' THEN 'INSERT' \
             WHEN deleted = 1 THEN 'DELETE' \
             ELSE 'UPDATE' \
         END, \
         updated_at_local = ?1",
        [now],
    )?)
}

/// Hard-delete acknowledged tombstones whose occurrence date is before `older_than`.
pub fn purge_deleted(conn: &Connection, older_than: i64) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM transactions WHERE deleted = 1 AND dirty = 0 AND date_millis < ?1",
        [older_than],
    )?)
}

// ---------------------------------------------------------------------------
// Repository: local mutations
// ---------------------------------------------------------------------------

/// Persist a locally created or edited transaction as dirty.
pub fn add_or_update(conn: &Connection, tx: &Transaction, now: i64) -> Result<Transaction> {
    let mut updated = tx.clone();
    updated.normalize_savings();
    updated.month_key = month_key(updated.date_millis);
    updated.sync.pending_op = Some(match tx.sync.pending_op {
        Some(PendingOp::Delete) => PendingOp::Delete,
        Some(PendingOp::Insert) => PendingOp::Insert,
        _ if tx.sync.updated_at_server.is_none() => PendingOp::Insert,
        _ => PendingOp::Update,
    });
    updated.sync.dirty = true;
    updated.sync.updated_at_local = now;
    upsert(conn, &updated)?;
    Ok(updated)
}

/// Monthly series starting at `base`: `repeat + 1` planned rows, the first
/// keeping the base id.
pub fn expand_recurring(base: &Transaction, repeat: u32) -> Vec<Transaction> {
    let mut first = base.clone();
    first.planned = true;
    let mut series = vec![first];
    for i in 1..=repeat {
        let mut next = base.clone();
        next.id = new_id();
        next.date_millis = add_months_to_millis(base.date_millis, i as i32);
        next.month_key = month_key(next.date_millis);
        next.planned = true;
        series.push(next);
    }
    series
}

/// Store every row of a recurring series in one transaction.
pub fn add_series(conn: &Connection, series: &[Transaction], now: i64) -> Result<Vec<Transaction>> {
    with_transaction(conn, |c| series.iter().map(|tx| add_or_update(c, tx, now)).collect())
}

pub fn delete(conn: &Connection, id: &str, now: i64) -> Result<()> {
    if !mark_tombstoned(conn, id, now)? {
        return Err(MoneyboxError::UnknownTransaction(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Aggregates and listings (tombstones excluded)
// ---------------------------------------------------------------------------

pub fn list_month(conn: &Connection, month: &str) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions WHERE month_key = ?1 AND deleted = 0 ORDER BY date_millis DESC"
    );
    query(conn, &sql, [month])
}

/// Most recently touched entries, hiding zero-amount savings transfers.
pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions \
         WHERE deleted = 0 AND NOT (amount = 0 AND savings_goal_id IS NOT NULL) \
         ORDER BY updated_at_local DESC, date_millis DESC LIMIT ?1"
    );
    query(conn, &sql, [limit as i64])
}

pub fn list_future(conn: &Connection, from_millis: i64) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions WHERE deleted = 0 AND date_millis > ?1 ORDER BY date_millis ASC"
    );
    query(conn, &sql, [from_millis])
}

pub fn transactions_between(conn: &Connection, start: i64, end: i64) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions \
         WHERE deleted = 0 AND date_millis >= ?1 AND date_millis <= ?2 ORDER BY date_millis ASC"
    );
    query(conn, &sql, [start, end])
}

pub fn list_older_than(conn: &Connection, month_exclusive: &str, limit: usize) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions \
         WHERE deleted = 0 AND month_key < ?1 ORDER BY date_millis DESC LIMIT ?2"
    );
    query(conn, &sql, params![month_exclusive, limit as i64])
}

/// Sum of amounts in a month, optionally restricted to one type.
pub fn sum_month(conn: &Connection, month: &str, tx_type: Option<TxType>) -> Result<f64> {
    let total = match tx_type {
        Some(t) => conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions \
             WHERE month_key = ?1 AND deleted = 0 AND tx_type = ?2",
            params![month, t.as_str()],
            |r| r.get(0),
        )?,
        None => conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions WHERE month_key = ?1 AND deleted = 0",
            [month],
            |r| r.get(0),
        )?,
    };
    Ok(total)
}

/// Sum over the half-open range `[start, end)`.
pub fn sum_between(conn: &Connection, start: i64, end: i64, tx_type: TxType) -> Result<f64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM transactions \
         WHERE deleted = 0 AND date_millis >= ?1 AND date_millis < ?2 AND tx_type = ?3",
        params![start, end, tx_type.as_str()],
        |r| r.get(0),
    )?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMonthlySum {
    pub month_key: String,
    pub category: String,
    pub total: f64,
}

pub fn category_series(conn: &Connection, months: &[String], tx_type: TxType) -> Result<Vec<CategoryMonthlySum>> {
    if months.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (0..months.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT month_key, category, SUM(ABS(amount)) AS total FROM transactions \
         WHERE tx_type = ?1 AND deleted = 0 AND month_key IN ({placeholders}) \
         GROUP BY month_key, category ORDER BY month_key, total DESC"
    );
    let type_str = tx_type.as_str();
    let mut values: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(months.len() + 1);
    values.push(&type_str);
    for m in months {
        values.push(m);
    }
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(values.as_slice(), |row| {
            Ok(CategoryMonthlySum {
                month_key: row.get(0)?,
                category: row.get(1)?,
                total: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Net savings contribution per goal id.
pub fn savings_balances(conn: &Connection) -> Result<HashMap<String, f64>> {
    let mut stmt = conn.prepare(
        "SELECT savings_goal_id, COALESCE(SUM(savings_impact), 0.0) FROM transactions \
         WHERE deleted = 0 AND savings_goal_id IS NOT NULL GROUP BY savings_goal_id",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

pub fn count_all(conn: &Connection) -> Result<(i64, i64)> {
    Ok(conn.query_row(
        "SELECT count(*), COALESCE(SUM(deleted), 0) FROM transactions",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::months::{date_to_millis, parse_date};

    pub(crate) fn sample(id: &str, amount: f64, date: &str, tx_type: TxType) -> Transaction {
        let mut tx = Transaction::new(
            "owner",
            amount,
            "EUR",
            date_to_millis(parse_date(date).unwrap()),
            "Food",
            tx_type,
            None,
            1_000,
        );
        tx.id = id.to_string();
        tx
    }

    #[test]
    fn test_upsert_and_get_roundtrip() {
        let (_dir, conn) = test_db();
        let mut tx = sample("t1", 12.5, "2024-03-10", TxType::Expense);
        tx.note = Some("lunch".into());
        upsert(&conn, &tx).unwrap();
        let loaded = get_by_id(&conn, "t1").unwrap().unwrap();
        assert_eq!(loaded, tx);
        assert!(get_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_resolve_id_by_prefix() {
        let (_dir, conn) = test_db();
        upsert(&conn, &sample("abc123", 1.0, "2024-03-10", TxType::Expense)).unwrap();
        upsert(&conn, &sample("abd456", 1.0, "2024-03-10", TxType::Expense)).unwrap();
        assert_eq!(resolve_id(&conn, "abc").unwrap(), "abc123");
        assert!(matches!(resolve_id(&conn, "ab"), Err(MoneyboxError::InvalidInput(_))));
        assert!(matches!(resolve_id(&conn, "zz"), Err(MoneyboxError::UnknownTransaction(_))));
        delete(&conn, "abc123", 5).unwrap();
        assert!(resolve_id(&conn, "abc").is_err());
    }

    #[test]
    fn test_recurring_expansion() {
        let (_dir, conn) = test_db();
        let base = sample("base", 50.0, "2024-01-31", TxType::Expense);
        let series = expand_recurring(&base, 2);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].id, "base");
        assert!(series.iter().all(|t| t.planned));
        let months: Vec<&str> = series.iter().map(|t| t.month_key.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
        assert_ne!(series[1].id, series[2].id);

        let stored = add_series(&conn, &series, 9).unwrap();
        assert!(stored.iter().all(|t| t.sync.pending_op == Some(PendingOp::Insert)));
        assert_eq!(count_dirty(&conn).unwrap(), 3);
    }

    #[test]
    fn test_no_repeat_is_single_planned_row() {
        let base = sample("one", 5.0, "2024-05-01", TxType::Income);
        let series = expand_recurring(&base, 0);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].id, "one");
    }

    #[test]
    fn test_add_or_update_pending_op_rules() {
        let (_dir, conn) = test_db();
        let mut tx = sample("t1", 10.0, "2024-03-10", TxType::Expense);
        tx.sync.pending_op = None;
        let stored = add_or_update(&conn, &tx, 2_000).unwrap();
        assert_eq!(stored.sync.pending_op, Some(PendingOp::Insert));

        let mut synced = stored.clone();
        synced.sync = SyncMeta::clean(5_000, 5_000, false);
        let stored = add_or_update(&conn, &synced, 6_000).unwrap();
        assert_eq!(stored.sync.pending_op, Some(PendingOp::Update));
        assert!(stored.sync.dirty);
        assert_eq!(stored.sync.updated_at_local, 6_000);
    }

    #[test]
    fn test_delete_goes_through_tombstone() {
        let (_dir, conn) = test_db();
        let tx = sample("t1", 10.0, "2024-03-10", TxType::Expense);
        upsert(&conn, &tx).unwrap();
        delete(&conn, "t1", 3_000).unwrap();
        let row = get_by_id(&conn, "t1").unwrap().unwrap();
        assert!(row.sync.deleted);
        assert!(row.sync.dirty);
        assert_eq!(row.sync.pending_op, Some(PendingOp::Delete));
        assert!(list_month(&conn, &row.month_key).unwrap().is_empty());
        assert!(matches!(delete(&conn, "nope", 1), Err(MoneyboxError::UnknownTransaction(_))));
    }

    #[test]
    fn test_select_dirty_and_mark_clean() {
        let (_dir, conn) = test_db();
        for id in ["a", "b", "c"] {
            upsert(&conn, &sample(id, 1.0, "2024-03-10", TxType::Expense)).unwrap();
        }
        assert_eq!(select_dirty(&conn, 2).unwrap().len(), 2);
        let changed = mark_clean(&conn, &["a".to_string(), "b".to_string()], 9_000).unwrap();
        assert_eq!(changed, 2);
        let a = get_by_id(&conn, "a").unwrap().unwrap();
        assert!(!a.sync.dirty);
        assert_eq!(a.sync.pending_op, None);
        assert_eq!(a.sync.updated_at_server, Some(9_000));
        assert_eq!(count_dirty(&conn).unwrap(), 1);
    }

    #[test]
    fn test_mark_all_dirty_recomputes_ops() {
        let (_dir, conn) = test_db();
        let mut clean = sample("clean", 1.0, "2024-03-10", TxType::Expense);
        clean.sync = SyncMeta::clean(100, 100, false);
        let mut tomb = sample("tomb", 1.0, "2024-03-10", TxType::Expense);
        tomb.sync = SyncMeta::clean(100, 100, true);
        let insert = sample("insert", 1.0, "2024-03-10", TxType::Expense);
        upsert_all(&conn, &[clean, tomb, insert]).unwrap();

        assert_eq!(mark_all_dirty(&conn, 7_000).unwrap(), 3);
        let op = |id: &str| get_by_id(&conn, id).unwrap().unwrap().sync.pending_op;
        assert_eq!(op("clean"), Some(PendingOp::Update));
        assert_eq!(op("tomb"), Some(PendingOp::Delete));
        assert_eq!(op("insert"), Some(PendingOp::Insert));
        assert_eq!(count_dirty(&conn).unwrap(), 3);
    }

    #[test]
    fn test_purge_keeps_pending_tombstones() {
        let (_dir, conn) = test_db();
        let mut acked = sample("acked", 1.0, "2020-01-10", TxType::Expense);
        acked.sync = SyncMeta::clean(100, 100, true);
        let mut pending = sample("pending", 1.0, "2020-01-10", TxType::Expense);
        pending.sync.deleted = true;
        pending.sync.pending_op = Some(PendingOp::Delete);
        let mut recent = sample("recent", 1.0, "2024-06-10", TxType::Expense);
        recent.sync = SyncMeta::clean(100, 100, true);
        upsert_all(&conn, &[acked, pending, recent]).unwrap();

        let cutoff = date_to_millis(parse_date("2023-01-01").unwrap());
        assert_eq!(purge_deleted(&conn, cutoff).unwrap(), 1);
        assert!(get_by_id(&conn, "acked").unwrap().is_none());
        assert!(get_by_id(&conn, "pending").unwrap().is_some());
        assert!(get_by_id(&conn, "recent").unwrap().is_some());
    }

    #[test]
    fn test_monthly_sums_by_type() {
        let (_dir, conn) = test_db();
        upsert(&conn, &sample("e1", 30.0, "2024-03-10", TxType::Expense)).unwrap();
        upsert(&conn, &sample("e2", 20.0, "2024-03-12", TxType::Expense)).unwrap();
        upsert(&conn, &sample("i1", 100.0, "2024-03-15", TxType::Income)).unwrap();
        upsert(&conn, &sample("other", 5.0, "2024-04-01", TxType::Expense)).unwrap();
        assert_eq!(sum_month(&conn, "2024-03", Some(TxType::Expense)).unwrap(), 50.0);
        assert_eq!(sum_month(&conn, "2024-03", Some(TxType::Income)).unwrap(), 100.0);
        assert_eq!(sum_month(&conn, "2024-03", None).unwrap(), 150.0);
    }

    #[test]
    fn test_category_series_groups_by_month() {
        let (_dir, conn) = test_db();
        let mut rent = sample("r", 500.0, "2024-03-01", TxType::Expense);
        rent.category = "Housing".into();
        upsert(&conn, &rent).unwrap();
        upsert(&conn, &sample("f1", 10.0, "2024-03-05", TxType::Expense)).unwrap();
        upsert(&conn, &sample("f2", 15.0, "2024-04-05", TxType::Expense)).unwrap();
        let series = category_series(&conn, &["2024-03".to_string(), "2024-04".to_string()], TxType::Expense).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].category, "Housing");
        assert_eq!(series[0].total, 500.0);
        assert_eq!(series[2].month_key, "2024-04");
    }

    #[test]
    fn test_savings_balances_and_recent_hides_transfers() {
        let (_dir, conn) = test_db();
        let mut deposit = sample("s1", 0.0, "2024-03-05", TxType::Income);
        deposit.savings_goal_id = Some("g1".into());
        deposit.savings_impact = 40.0;
        let mut withdraw = sample("s2", 0.0, "2024-03-06", TxType::Expense);
        withdraw.savings_goal_id = Some("g1".into());
        withdraw.savings_impact = -15.0;
        upsert_all(&conn, &[deposit, withdraw, sample("x", 9.0, "2024-03-07", TxType::Expense)]).unwrap();

        let balances = savings_balances(&conn).unwrap();
        assert_eq!(balances.get("g1").copied(), Some(25.0));
        let recent = list_recent(&conn, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "x");
    }

    #[test]
    fn test_list_older_than_and_future() {
        let (_dir, conn) = test_db();
        upsert(&conn, &sample("old", 1.0, "2023-12-10", TxType::Expense)).unwrap();
        upsert(&conn, &sample("new", 1.0, "2024-02-10", TxType::Expense)).unwrap();
        let older = list_older_than(&conn, "2024-01", 10).unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].id, "old");
        let cutoff = date_to_millis(parse_date("2024-01-01").unwrap());
        let future = list_future(&conn, cutoff).unwrap();
        assert_eq!(future.len(), 1);
        assert_eq!(future[0].id, "new");
    }
}
