use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{month_or_current, open_store, parse_date_opt, short_id};
use crate::error::{MoneyboxError, Result};
use crate::fmt::money;
use crate::models::{Transaction, TxType};
use crate::months::{date_to_millis, local_date, now_millis, parse_date, parse_month};
use crate::preferences;
use crate::transactions;

fn positive(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(MoneyboxError::InvalidInput(format!("amount must be positive, got {amount}")));
    }
    Ok(amount)
}

fn parse_type(raw: &str) -> Result<TxType> {
    match raw.to_ascii_lowercase().as_str() {
        "expense" => Ok(TxType::Expense),
        "income" => Ok(TxType::Income),
        other => Err(MoneyboxError::InvalidInput(format!("unknown type '{other}', use expense or income"))),
    }
}

pub fn add(
    amount: f64,
    category: Option<String>,
    income: bool,
    date: Option<String>,
    note: Option<String>,
    repeat: u32,
) -> Result<()> {
    let amount = positive(amount)?;
    let (config, conn) = open_store()?;
    let settings = preferences::snapshot(&conn)?;
    let now = now_millis();
    let tx_type = if income { TxType::Income } else { TxType::Expense };
    let category = match category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
        Some(c) => c,
        None => {
            let defaults = match tx_type {
                TxType::Income => &settings.income_categories,
                TxType::Expense => &settings.expense_categories,
            };
            defaults.first().cloned().unwrap_or_else(|| "Other".to_string())
        }
    };
    let date_millis = parse_date_opt(&date)?;

    let mut base = Transaction::new(
        &config.owner_id,
        amount,
        &settings.currency,
        date_millis,
        &category,
        tx_type,
        note.filter(|n| !n.trim().is_empty()),
        now,
    );
    base.planned = date_millis > now;

    let stored = if repeat > 0 {
        transactions::add_series(&conn, &transactions::expand_recurring(&base, repeat), now)?
    } else {
        vec![transactions::add_or_update(&conn, &base, now)?]
    };

    for tx in &stored {
        println!(
            "Added {} {} {} on {} [{}]",
            tx.tx_type.as_str().to_lowercase(),
            money(tx.amount, &tx.currency),
            tx.category,
            local_date(tx.date_millis),
            short_id(&tx.id)
        );
    }
    Ok(())
}

pub fn save(goal: &str, amount: f64, withdraw: bool, date: Option<String>, note: Option<String>) -> Result<()> {
    let amount = positive(amount)?;
    let (config, conn) = open_store()?;
    let goal = super::goals::resolve_goal(&conn, goal)?;
    let settings = preferences::snapshot(&conn)?;
    let now = now_millis();
    let entry = Transaction::savings_entry(
        &config.owner_id,
        &goal,
        amount,
        withdraw,
        &settings.currency,
        parse_date_opt(&date)?,
        note,
        now,
    );
    let stored = transactions::add_or_update(&conn, &entry, now)?;
    let verb = if withdraw { "Withdrew" } else { "Saved" };
    println!(
        "{verb} {} {} '{}' [{}]",
        money(amount, &settings.currency),
        if withdraw { "from" } else { "toward" },
        goal.name,
        short_id(&stored.id)
    );
    Ok(())
}

pub fn edit(
    id: &str,
    amount: Option<f64>,
    category: Option<String>,
    date: Option<String>,
    note: Option<String>,
    tx_type: Option<String>,
) -> Result<()> {
    let (_config, conn) = open_store()?;
    let full_id = transactions::resolve_id(&conn, id)?;
    let mut tx = transactions::get_by_id(&conn, &full_id)?
        .ok_or_else(|| MoneyboxError::UnknownTransaction(id.to_string()))?;

    if let Some(a) = amount {
        tx.amount = positive(a)?;
    }
    if let Some(c) = category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
        tx.category = c;
    }
    if let Some(d) = date {
        tx.date_millis = date_to_millis(parse_date(&d)?);
    }
    if let Some(n) = note {
        tx.note = Some(n).filter(|n| !n.trim().is_empty());
    }
    if let Some(t) = tx_type {
        tx.tx_type = parse_type(&t)?;
    }

    let stored = transactions::add_or_update(&conn, &tx, now_millis())?;
    println!("Updated transaction {}", short_id(&stored.id));
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let (_config, conn) = open_store()?;
    let full_id = transactions::resolve_id(&conn, id)?;
    transactions::delete(&conn, &full_id, now_millis())?;
    println!("Deleted transaction {}", short_id(&full_id));
    Ok(())
}

pub fn list(
    month: Option<String>,
    recent: Option<usize>,
    planned: bool,
    before: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
) -> Result<()> {
    let (_config, conn) = open_store()?;

    let (title, rows) = if let Some(limit) = recent {
        (format!("Recent ({limit})"), transactions::list_recent(&conn, limit)?)
    } else if planned {
        ("Planned".to_string(), transactions::list_future(&conn, now_millis())?)
    } else if let Some(b) = before {
        parse_month(&b)?;
        (format!("Before {b}"), transactions::list_older_than(&conn, &b, 50)?)
    } else if let (Some(from), Some(to)) = (from_date, to_date) {
        let start = date_to_millis(parse_date(&from)?);
        let end = parse_date(&to)?
            .succ_opt()
            .map(date_to_millis)
            .unwrap_or(i64::MAX)
            - 1;
        (format!("{from} to {to}"), transactions::transactions_between(&conn, start, end)?)
    } else {
        let month = month_or_current(&month)?;
        (month.clone(), transactions::list_month(&conn, &month)?)
    };

    if rows.is_empty() {
        println!("No transactions for {title}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Category", "Amount", "Note", "Sync"]);
    for tx in &rows {
        let amount = if tx.savings_goal_id.is_some() {
            format!("{} (goal)", money(tx.savings_impact, &tx.currency)).cyan().to_string()
        } else {
            match tx.tx_type {
                TxType::Income => money(tx.amount, &tx.currency).green().to_string(),
                TxType::Expense => money(-tx.amount, &tx.currency).red().to_string(),
            }
        };
        let mut date = local_date(tx.date_millis).to_string();
        if tx.planned {
            date.push_str(" *");
        }
        let sync = match tx.sync.pending_op {
            Some(op) => op.as_str().to_lowercase().yellow().to_string(),
            None => "synced".dimmed().to_string(),
        };
        table.add_row(vec![
            Cell::new(short_id(&tx.id)),
            Cell::new(date),
            Cell::new(&tx.category),
            Cell::new(amount),
            Cell::new(tx.note.as_deref().unwrap_or("")),
            Cell::new(sync),
        ]);
    }
    println!("Transactions: {title}\n{table}");
    if rows.iter().any(|t| t.planned) {
        println!("{}", "* planned".dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_amounts_only() {
        assert_eq!(positive(3.5).unwrap(), 3.5);
        assert!(positive(0.0).is_err());
        assert!(positive(-1.0).is_err());
        assert!(positive(f64::INFINITY).is_err());
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("Income").unwrap(), TxType::Income);
        assert_eq!(parse_type("expense").unwrap(), TxType::Expense);
        assert!(parse_type("transfer").is_err());
    }
}
