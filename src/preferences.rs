use std::collections::HashMap;
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::with_transaction;
use crate::error::{MoneyboxError, Result};
use crate::language;
use crate::models::{defaults, new_id, BalanceBaseline, PendingOp, SavingsGoal, SettingsSnapshot};
use crate::reconcile::goals::{self, GoalMerge};
use crate::reconcile::settings::{
    clamp_cycle_day, cycle_end_to_start, sanitize_budget, sanitize_categories, sanitize_remote, should_apply,
};

pub mod keys {
    pub const LANGUAGE: &str = "language";
    pub const CURRENCY: &str = "currency";
    pub const EXPENSE_CATEGORIES: &str = "expense_categories";
    pub const INCOME_CATEGORIES: &str = "income_categories";
    pub const BUDGET_MONTHLY: &str = "budget_monthly";
    pub const BUDGET_CYCLE_START_DAY: &str = "budget_cycle_start_day";
    pub const LEGACY_BUDGET_CYCLE_END_DAY: &str = "budget_cycle_end_day";
    pub const THEME_MODE: &str = "theme_mode";
    pub const ACCENT_COLOR: &str = "accent_color";
    pub const BASELINE_AMOUNT: &str = "baseline_amount";
    pub const BASELINE_DATE: &str = "baseline_date";
    pub const SETTINGS_UPDATED_AT: &str = "settings_updated_at";
    pub const SETTINGS_DIRTY: &str = "settings_dirty";
    pub const LAST_DELTA_SYNC_AT: &str = "last_delta_sync_at";
    pub const SAVINGS_GOALS: &str = "savings_goals";
}

pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM preferences WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn remove(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM preferences WHERE key = ?1", [key])?;
    Ok(())
}

fn read_all(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

/// Malformed stored values read as `None` and are logged, never fatal.
fn parse_value<T: FromStr>(prefs: &HashMap<String, String>, key: &str) -> Option<T> {
    let raw = prefs.get(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring malformed preference {key}={raw:?}");
            None
        }
    }
}

fn parse_list(prefs: &HashMap<String, String>, key: &str, fallback: &[&str]) -> Vec<String> {
    let fallback = || fallback.iter().map(|s| s.to_string()).collect();
    match prefs.get(key) {
        None => fallback(),
        Some(raw) => match serde_json::from_str::<Vec<String>>(raw) {
            Ok(list) => sanitize_categories(&list),
            Err(e) => {
                log::warn!("ignoring malformed preference {key}: {e}");
                fallback()
            }
        },
    }
}

fn text_or(prefs: &HashMap<String, String>, key: &str, fallback: &str) -> String {
    prefs
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

// ---------------------------------------------------------------------------
// Settings snapshot
// ---------------------------------------------------------------------------

pub fn snapshot(conn: &Connection) -> Result<SettingsSnapshot> {
    let prefs = read_all(conn)?;
    let cycle_day = match parse_value::<i64>(&prefs, keys::BUDGET_CYCLE_START_DAY) {
        Some(day) => clamp_cycle_day(day),
        None => parse_value::<i64>(&prefs, keys::LEGACY_BUDGET_CYCLE_END_DAY)
            .map(cycle_end_to_start)
            .unwrap_or(defaults::BUDGET_CYCLE_START_DAY),
    };
    let baseline = match (
        parse_value::<f64>(&prefs, keys::BASELINE_AMOUNT),
        parse_value::<i64>(&prefs, keys::BASELINE_DATE),
    ) {
        (Some(amount), Some(date_millis)) => Some(BalanceBaseline { amount, date_millis }),
        _ => None,
    };
    Ok(SettingsSnapshot {
        language: prefs
            .get(keys::LANGUAGE)
            .map(|l| language::sanitize(l))
            .unwrap_or_else(|| defaults::LANGUAGE.to_string()),
        currency: text_or(&prefs, keys::CURRENCY, defaults::CURRENCY),
        expense_categories: parse_list(&prefs, keys::EXPENSE_CATEGORIES, defaults::EXPENSE_CATEGORIES),
        income_categories: parse_list(&prefs, keys::INCOME_CATEGORIES, defaults::INCOME_CATEGORIES),
        budget_monthly: sanitize_budget(parse_value(&prefs, keys::BUDGET_MONTHLY)),
        budget_cycle_start_day: cycle_day,
        theme_mode: text_or(&prefs, keys::THEME_MODE, defaults::THEME_MODE),
        accent_color: text_or(&prefs, keys::ACCENT_COLOR, defaults::ACCENT_COLOR),
        balance_baseline: baseline,
        updated_at: parse_value(&prefs, keys::SETTINGS_UPDATED_AT).unwrap_or(0),
        dirty: prefs.get(keys::SETTINGS_DIRTY).map(|v| v == "1").unwrap_or(false),
    })
}

/// Persist the whole snapshot plus its query mirrors. Callers wrap this in a
/// transaction so a partial write is never visible.
fn write_snapshot(conn: &Connection, s: &SettingsSnapshot, now: i64) -> Result<()> {
    set(conn, keys::LANGUAGE, &s.language)?;
    set(conn, keys::CURRENCY, &s.currency)?;
    set(conn, keys::EXPENSE_CATEGORIES, &serde_json::to_string(&s.expense_categories)?)?;
    set(conn, keys::INCOME_CATEGORIES, &serde_json::to_string(&s.income_categories)?)?;
    match s.budget_monthly {
        Some(b) => set(conn, keys::BUDGET_MONTHLY, &b.to_string())?,
        None => remove(conn, keys::BUDGET_MONTHLY)?,
    }
    set(conn, keys::BUDGET_CYCLE_START_DAY, &s.budget_cycle_start_day.to_string())?;
    remove(conn, keys::LEGACY_BUDGET_CYCLE_END_DAY)?;
    set(conn, keys::THEME_MODE, &s.theme_mode)?;
    set(conn, keys::ACCENT_COLOR, &s.accent_color)?;
    match s.balance_baseline {
        Some(b) => {
            set(conn, keys::BASELINE_AMOUNT, &b.amount.to_string())?;
            set(conn, keys::BASELINE_DATE, &b.date_millis.to_string())?;
        }
        None => {
            remove(conn, keys::BASELINE_AMOUNT)?;
            remove(conn, keys::BASELINE_DATE)?;
        }
    }
    set(conn, keys::SETTINGS_UPDATED_AT, &s.updated_at.to_string())?;
    set(conn, keys::SETTINGS_DIRTY, if s.dirty { "1" } else { "0" })?;

    conn.execute(
        "INSERT INTO budgets (id, amount, updated_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET amount = excluded.amount, updated_at = excluded.updated_at",
        params![s.budget_monthly, now],
    )?;
    conn.execute("UPDATE expense_categories SET deleted = 1, updated_at = ?1", [now])?;
    for (position, name) in s.expense_categories.iter().enumerate() {
        conn.execute(
            "INSERT INTO expense_categories (name, position, updated_at, deleted) VALUES (?1, ?2, ?3, 0)
             ON CONFLICT(name) DO UPDATE SET position = excluded.position,
                updated_at = excluded.updated_at, deleted = 0",
            params![name, position as i64, now],
        )?;
    }
    Ok(())
}

/// Read-modify-write of the snapshot. Only a real change bumps `updated_at`
/// and marks the snapshot dirty.
fn edit_settings(conn: &Connection, now: i64, f: impl FnOnce(&mut SettingsSnapshot)) -> Result<bool> {
    with_transaction(conn, |c| {
        let current = snapshot(c)?;
        let mut next = current.clone();
        f(&mut next);
        if next == current {
            return Ok(false);
        }
        next.updated_at = now.max(current.updated_at + 1);
        next.dirty = true;
        write_snapshot(c, &next, now)?;
        Ok(true)
    })
}

fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MoneyboxError::InvalidInput(format!("{field} cannot be blank")));
    }
    Ok(trimmed.to_string())
}

pub fn set_language(conn: &Connection, code: &str, now: i64) -> Result<bool> {
    let code = language::sanitize(code);
    edit_settings(conn, now, |s| s.language = code)
}

pub fn set_currency(conn: &Connection, currency: &str, now: i64) -> Result<bool> {
    let currency = require_text("currency", currency)?.to_uppercase();
    edit_settings(conn, now, |s| s.currency = currency)
}

pub fn set_expense_categories(conn: &Connection, categories: &[String], now: i64) -> Result<bool> {
    let categories = sanitize_categories(categories);
    edit_settings(conn, now, |s| s.expense_categories = categories)
}

pub fn set_income_categories(conn: &Connection, categories: &[String], now: i64) -> Result<bool> {
    let categories = sanitize_categories(categories);
    edit_settings(conn, now, |s| s.income_categories = categories)
}

pub fn set_budget_monthly(conn: &Connection, budget: Option<f64>, now: i64) -> Result<bool> {
    let budget = sanitize_budget(budget);
    edit_settings(conn, now, |s| s.budget_monthly = budget)
}

pub fn set_budget_cycle_start_day(conn: &Connection, day: i64, now: i64) -> Result<bool> {
    let day = clamp_cycle_day(day);
    edit_settings(conn, now, |s| s.budget_cycle_start_day = day)
}

pub fn set_theme_mode(conn: &Connection, mode: &str, now: i64) -> Result<bool> {
    let mode = require_text("theme", mode)?;
    edit_settings(conn, now, |s| s.theme_mode = mode)
}

pub fn set_accent_color(conn: &Connection, accent: &str, now: i64) -> Result<bool> {
    let accent = require_text("accent", accent)?;
    edit_settings(conn, now, |s| s.accent_color = accent)
}

pub fn set_balance_baseline(conn: &Connection, amount: f64, date_millis: i64, now: i64) -> Result<bool> {
    if !amount.is_finite() {
        return Err(MoneyboxError::InvalidInput(format!("baseline amount {amount}")));
    }
    let baseline = BalanceBaseline {
        amount: amount.max(0.0),
        date_millis: date_millis.max(0),
    };
    edit_settings(conn, now, |s| s.balance_baseline = Some(baseline))
}

pub fn clear_balance_baseline(conn: &Connection, now: i64) -> Result<bool> {
    edit_settings(conn, now, |s| s.balance_baseline = None)
}

/// Replace local settings with a sanitized remote snapshot when the apply
/// rule allows it. Returns whether anything was written.
pub fn apply_remote_settings(conn: &Connection, remote: &SettingsSnapshot, now: i64) -> Result<bool> {
    with_transaction(conn, |c| {
        let local = snapshot(c)?;
        if !should_apply(&local, remote) {
            return Ok(false);
        }
        write_snapshot(c, &sanitize_remote(remote), now)?;
        Ok(true)
    })
}

/// Clear the dirty flag only if no local edit landed after `pushed_at`.
pub fn mark_settings_synced_if_unchanged(conn: &Connection, pushed_at: i64) -> Result<bool> {
    with_transaction(conn, |c| {
        let stored: i64 = get(c, keys::SETTINGS_UPDATED_AT)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        if stored != pushed_at {
            return Ok(false);
        }
        set(c, keys::SETTINGS_DIRTY, "0")?;
        Ok(true)
    })
}

pub fn mark_settings_dirty(conn: &Connection) -> Result<()> {
    set(conn, keys::SETTINGS_DIRTY, "1")
}

// ---------------------------------------------------------------------------
// Delta checkpoint
// ---------------------------------------------------------------------------

pub fn last_delta_sync_at(conn: &Connection) -> Result<i64> {
    Ok(get(conn, keys::LAST_DELTA_SYNC_AT)?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

pub fn set_last_delta_sync_at(conn: &Connection, value: i64) -> Result<()> {
    set(conn, keys::LAST_DELTA_SYNC_AT, &value.to_string())
}

/// Move the checkpoint forward to `candidate`; never backward.
pub fn advance_checkpoint(conn: &Connection, candidate: i64) -> Result<i64> {
    with_transaction(conn, |c| {
        let current = last_delta_sync_at(c)?;
        let next = current.max(candidate);
        if next != current {
            set_last_delta_sync_at(c, next)?;
        }
        Ok(next)
    })
}

// ---------------------------------------------------------------------------
// Savings goals
// ---------------------------------------------------------------------------

/// Every stored goal, tombstones included.
pub fn raw_goals(conn: &Connection) -> Result<Vec<SavingsGoal>> {
    let Some(raw) = get(conn, keys::SAVINGS_GOALS)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&raw) {
        Ok(list) => Ok(list),
        Err(e) => {
            log::warn!("ignoring malformed savings goal list: {e}");
            Ok(Vec::new())
        }
    }
}

/// Replace the whole goal list and its mirror table in one transaction.
pub fn replace_goals(conn: &Connection, list: &[SavingsGoal]) -> Result<()> {
    with_transaction(conn, |c| {
        set(c, keys::SAVINGS_GOALS, &serde_json::to_string(list)?)?;
        c.execute("DELETE FROM savings_goals", [])?;
        let mut stmt = c.prepare(
            "INSERT OR REPLACE INTO savings_goals (id, name, target, deadline_millis, updated_at, deleted, pending_op)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for g in list {
            stmt.execute(params![
                g.id,
                g.name,
                g.target,
                g.deadline_millis,
                g.updated_at,
                g.deleted,
                g.pending_op.map(|op| op.as_str()),
            ])?;
        }
        Ok(())
    })
}

pub fn visible_goals(conn: &Connection) -> Result<Vec<SavingsGoal>> {
    Ok(goals::displayable(raw_goals(conn)?))
}

pub fn pending_goals(conn: &Connection) -> Result<Vec<SavingsGoal>> {
    Ok(raw_goals(conn)?.into_iter().filter(|g| g.is_dirty()).collect())
}

fn goal_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        defaults::GOAL_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn goal_target(target: f64) -> f64 {
    if target.is_finite() {
        target.max(0.0)
    } else {
        0.0
    }
}

pub fn add_goal(conn: &Connection, name: &str, target: f64, deadline_millis: Option<i64>, now: i64) -> Result<SavingsGoal> {
    let goal = SavingsGoal {
        id: new_id(),
        name: goal_name(name),
        target: goal_target(target),
        deadline_millis,
        updated_at: now,
        deleted: false,
        pending_op: Some(PendingOp::Insert),
    };
    with_transaction(conn, |c| {
        let mut list = raw_goals(c)?;
        list.push(goal.clone());
        replace_goals(c, &list)
    })?;
    Ok(goal)
}

/// Edit a goal in place. A goal still waiting for its first push stays an INSERT.
pub fn update_goal(
    conn: &Connection,
    id: &str,
    now: i64,
    edit: impl FnOnce(&mut SavingsGoal),
) -> Result<SavingsGoal> {
    with_transaction(conn, |c| {
        let mut list = raw_goals(c)?;
        let goal = list
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| MoneyboxError::UnknownGoal(id.to_string()))?;
        edit(goal);
        goal.name = goal_name(&goal.name);
        goal.target = goal_target(goal.target);
        goal.deleted = false;
        goal.updated_at = now;
        goal.pending_op = Some(match goal.pending_op {
            Some(PendingOp::Insert) => PendingOp::Insert,
            _ => PendingOp::Update,
        });
        let updated = goal.clone();
        replace_goals(c, &list)?;
        Ok(updated)
    })
}

/// A never-pushed goal disappears; anything else becomes a pending tombstone.
pub fn delete_goal(conn: &Connection, id: &str, now: i64) -> Result<()> {
    with_transaction(conn, |c| {
        let mut list = raw_goals(c)?;
        let pos = list
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| MoneyboxError::UnknownGoal(id.to_string()))?;
        if list[pos].pending_op == Some(PendingOp::Insert) {
            list.remove(pos);
        } else {
            let goal = &mut list[pos];
            goal.deleted = true;
            goal.pending_op = Some(PendingOp::Delete);
            goal.updated_at = now;
        }
        replace_goals(c, &list)
    })
}

pub fn merge_remote_goals(conn: &Connection, remote: &[SavingsGoal]) -> Result<usize> {
    with_transaction(conn, |c| {
        let GoalMerge { goals, applied } = goals::merge_goals(raw_goals(c)?, remote);
        replace_goals(c, &goals)?;
        Ok(applied)
    })
}

pub fn mark_goals_synced(conn: &Connection, acks: &[SavingsGoal]) -> Result<()> {
    with_transaction(conn, |c| {
        let list = goals::apply_acks(raw_goals(c)?, acks);
        replace_goals(c, &list)
    })
}

pub fn flag_goals_for_bootstrap(conn: &Connection, now: i64) -> Result<usize> {
    with_transaction(conn, |c| {
        let list = goals::flag_for_bootstrap(raw_goals(c)?, now);
        replace_goals(c, &list)?;
        Ok(list.len())
    })
}
