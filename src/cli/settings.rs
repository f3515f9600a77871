use comfy_table::{Cell, Table};

use super::{open_store, parse_date_opt};
use crate::error::{MoneyboxError, Result};
use crate::fmt::money;
use crate::language::{LocaleState, SUPPORTED};
use crate::months::{local_date, now_millis};
use crate::preferences;

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

fn parse_budget(value: &str) -> Result<Option<f64>> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| MoneyboxError::InvalidInput(format!("budget must be a number or `none`, got '{value}'")))
}

pub fn show() -> Result<()> {
    let (_config, conn) = open_store()?;
    let s = preferences::snapshot(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    let rows: Vec<(&str, String)> = vec![
        ("language", s.language.clone()),
        ("currency", s.currency.clone()),
        ("theme", s.theme_mode.clone()),
        ("accent", s.accent_color.clone()),
        (
            "budget",
            s.budget_monthly
                .map(|b| money(b, &s.currency))
                .unwrap_or_else(|| "(none)".to_string()),
        ),
        ("cycle-day", s.budget_cycle_start_day.to_string()),
        ("expense-categories", s.expense_categories.join(", ")),
        ("income-categories", s.income_categories.join(", ")),
        (
            "baseline",
            s.balance_baseline
                .map(|b| format!("{} on {}", money(b.amount, &s.currency), local_date(b.date_millis)))
                .unwrap_or_else(|| "(none)".to_string()),
        ),
    ];
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    println!("Settings\n{table}");
    if s.dirty {
        println!("Local changes not yet synced.");
    }
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let (_config, conn) = open_store()?;
    let now = now_millis();
    let mut locale = LocaleState::new(&preferences::snapshot(&conn)?.language);

    let changed = match key {
        "language" => {
            let changed = preferences::set_language(&conn, value, now)?;
            if locale.apply(value) {
                println!("Language is now {}", locale.current());
            } else if !SUPPORTED.contains(&value.trim().to_lowercase().as_str()) {
                println!("Language '{value}' resolves to {}", locale.current());
            }
            changed
        }
        "currency" => preferences::set_currency(&conn, value, now)?,
        "theme" => preferences::set_theme_mode(&conn, value, now)?,
        "accent" => preferences::set_accent_color(&conn, value, now)?,
        "budget" => preferences::set_budget_monthly(&conn, parse_budget(value)?, now)?,
        "cycle-day" => {
            let day: i64 = value
                .trim()
                .parse()
                .map_err(|_| MoneyboxError::InvalidInput(format!("cycle-day must be 1-31, got '{value}'")))?;
            preferences::set_budget_cycle_start_day(&conn, day, now)?
        }
        "expense-categories" => preferences::set_expense_categories(&conn, &split_list(value), now)?,
        "income-categories" => preferences::set_income_categories(&conn, &split_list(value), now)?,
        other => return Err(MoneyboxError::InvalidInput(format!("unknown setting '{other}'"))),
    };

    if changed {
        println!("Updated {key}");
    } else {
        println!("{key} unchanged");
    }
    Ok(())
}

pub fn baseline(amount: f64, date: Option<String>) -> Result<()> {
    let (_config, conn) = open_store()?;
    let date_millis = parse_date_opt(&date)?;
    preferences::set_balance_baseline(&conn, amount, date_millis, now_millis())?;
    println!("Baseline set for {}", local_date(date_millis));
    Ok(())
}

pub fn clear_baseline() -> Result<()> {
    let (_config, conn) = open_store()?;
    if preferences::clear_balance_baseline(&conn, now_millis())? {
        println!("Baseline cleared");
    } else {
        println!("No baseline set");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("none").unwrap(), None);
        assert_eq!(parse_budget(" 1200.5 ").unwrap(), Some(1200.5));
        assert!(parse_budget("lots").is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("Rent, Food ,"), vec!["Rent", "Food", ""]);
    }
}
