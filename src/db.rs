use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    amount REAL NOT NULL,
    currency TEXT NOT NULL,
    date_millis INTEGER NOT NULL,
    month_key TEXT NOT NULL,
    category TEXT NOT NULL,
    note TEXT,
    planned INTEGER NOT NULL DEFAULT 0,
    tx_type TEXT NOT NULL DEFAULT 'EXPENSE',
    savings_goal_id TEXT,
    savings_impact REAL NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    dirty INTEGER NOT NULL DEFAULT 1,
    pending_op TEXT DEFAULT 'INSERT',
    updated_at_local INTEGER NOT NULL,
    updated_at_server INTEGER
);

CREATE INDEX IF NOT EXISTS idx_transactions_month ON transactions(month_key, deleted);
CREATE INDEX IF NOT EXISTS idx_transactions_dirty ON transactions(dirty);

CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS budgets (
    id INTEGER PRIMARY KEY,
    amount REAL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS expense_categories (
    name TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS savings_goals (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    target REAL NOT NULL,
    deadline_millis INTEGER,
    updated_at INTEGER NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0,
    pending_op TEXT
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Run `f` inside a SQL transaction. When the connection is already inside
/// one, `f` joins it and the outer caller owns the commit.
pub fn with_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = conn.unchecked_transaction()?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["transactions", "preferences", "budgets", "expense_categories", "savings_goals"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_with_transaction_rolls_back_on_error() {
        let (_dir, conn) = test_db();
        let result: Result<()> = with_transaction(&conn, |c| {
            c.execute("INSERT INTO preferences (key, value) VALUES ('a', '1')", [])?;
            Err(crate::error::MoneyboxError::InvalidInput("boom".into()))
        });
        assert!(result.is_err());
        let count: i64 = conn.query_row("SELECT count(*) FROM preferences", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_with_transaction_nests_into_outer() {
        let (_dir, conn) = test_db();
        with_transaction(&conn, |outer| {
            with_transaction(outer, |inner| {
                inner.execute("INSERT INTO preferences (key, value) VALUES ('a', '1')", [])?;
                Ok(())
            })
        })
        .unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM preferences", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
