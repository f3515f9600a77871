use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use super::{open_store, short_id};
use crate::error::{MoneyboxError, Result};
use crate::fmt::money;
use crate::models::SavingsGoal;
use crate::months::{date_to_millis, local_date, now_millis, parse_date};
use crate::preferences;
use crate::transactions;

/// Find a live goal by id or unique id prefix.
pub(crate) fn resolve_goal(conn: &Connection, id: &str) -> Result<SavingsGoal> {
    let prefix = id.trim();
    let mut matches: Vec<SavingsGoal> = preferences::visible_goals(conn)?
        .into_iter()
        .filter(|g| !prefix.is_empty() && g.id.starts_with(prefix))
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(MoneyboxError::UnknownGoal(id.to_string())),
        _ => Err(MoneyboxError::InvalidInput(format!("goal id prefix '{id}' is ambiguous"))),
    }
}

fn parse_deadline(raw: &str) -> Result<Option<i64>> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Ok(Some(date_to_millis(parse_date(raw)?)))
}

pub fn list() -> Result<()> {
    let (_config, conn) = open_store()?;
    let goals = preferences::visible_goals(&conn)?;
    if goals.is_empty() {
        println!("No savings goals. Add one with `moneybox goals add <name> --target <amount>`.");
        return Ok(());
    }
    let currency = preferences::snapshot(&conn)?.currency;
    let balances = transactions::savings_balances(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Saved", "Target", "Progress", "Deadline", "Sync"]);
    for goal in &goals {
        let saved = balances.get(&goal.id).copied().unwrap_or(0.0);
        let progress = if goal.target > 0.0 {
            let pct = (saved / goal.target * 100.0).clamp(0.0, 999.0);
            let text = format!("{pct:.0}%");
            if pct >= 100.0 { text.green().to_string() } else { text }
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            Cell::new(short_id(&goal.id)),
            Cell::new(&goal.name),
            Cell::new(money(saved, &currency)),
            Cell::new(money(goal.target, &currency)),
            Cell::new(progress),
            Cell::new(goal.deadline_millis.map(|d| local_date(d).to_string()).unwrap_or_default()),
            Cell::new(match goal.pending_op {
                Some(op) => op.as_str().to_lowercase().yellow().to_string(),
                None => "synced".dimmed().to_string(),
            }),
        ]);
    }
    println!("Savings goals\n{table}");
    Ok(())
}

pub fn add(name: &str, target: f64, deadline: Option<String>) -> Result<()> {
    let (_config, conn) = open_store()?;
    let deadline = match deadline {
        Some(d) => parse_deadline(&d)?,
        None => None,
    };
    let goal = preferences::add_goal(&conn, name, target, deadline, now_millis())?;
    println!("Added goal '{}' [{}]", goal.name, short_id(&goal.id));
    Ok(())
}

pub fn update(id: &str, name: Option<String>, target: Option<f64>, deadline: Option<String>) -> Result<()> {
    let (_config, conn) = open_store()?;
    let goal = resolve_goal(&conn, id)?;
    let deadline = match deadline {
        Some(d) => Some(parse_deadline(&d)?),
        None => None,
    };
    let updated = preferences::update_goal(&conn, &goal.id, now_millis(), |g| {
        if let Some(n) = name {
            g.name = n;
        }
        if let Some(t) = target {
            g.target = t;
        }
        if let Some(d) = deadline {
            g.deadline_millis = d;
        }
    })?;
    println!("Updated goal '{}' [{}]", updated.name, short_id(&updated.id));
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let (_config, conn) = open_store()?;
    let goal = resolve_goal(&conn, id)?;
    preferences::delete_goal(&conn, &goal.id, now_millis())?;
    println!("Deleted goal '{}'", goal.name);
    Ok(())
}
