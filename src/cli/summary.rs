use std::collections::BTreeMap;

use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{month_or_current, open_store};
use crate::error::Result;
use crate::fmt::{money, signed_money};
use crate::models::{Transaction, TxType};
use crate::months::{add_months, budget_cycle, local_date, month_sequence, now_millis};
use crate::preferences;
use crate::transactions;

pub fn run(month: Option<String>, months: usize) -> Result<()> {
    let (_config, conn) = open_store()?;
    let settings = preferences::snapshot(&conn)?;
    let currency = settings.currency.as_str();
    let month = month_or_current(&month)?;
    let now = now_millis();

    let income = transactions::sum_month(&conn, &month, Some(TxType::Income))?;
    let expenses = transactions::sum_month(&conn, &month, Some(TxType::Expense))?;
    let net = income - expenses;

    let mut table = Table::new();
    table.set_header(vec![month.as_str(), ""]);
    table.add_row(vec![Cell::new("Income".green().bold()), Cell::new(money(income, currency))]);
    table.add_row(vec![Cell::new("Expenses".red().bold()), Cell::new(money(expenses, currency))]);
    let net_label = if net >= 0.0 { "Net".green().bold() } else { "Net".red().bold() };
    table.add_row(vec![Cell::new(net_label), Cell::new(signed_money(net, currency))]);
    println!("{table}");

    let today = local_date(now);
    let cycle = budget_cycle(today, settings.budget_cycle_start_day);
    let (start, end) = cycle.millis_range();
    let spent = transactions::sum_between(&conn, start, end, TxType::Expense)?;
    let days_left = cycle.days_remaining(today);
    println!(
        "Budget cycle {} to {} ({} of {} days left): spent {}",
        cycle.start,
        cycle.end_inclusive,
        days_left,
        cycle.total_days(),
        money(spent, currency)
    );
    if let Some(budget) = settings.budget_monthly {
        let remaining = budget - spent;
        let line = format!(
            "Budget {}: {} remaining, {} per day",
            money(budget, currency),
            signed_money(remaining, currency),
            money((remaining / days_left.max(1) as f64).max(0.0), currency)
        );
        if remaining < 0.0 {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }

    if let Some(baseline) = settings.balance_baseline {
        let movement: f64 = transactions::transactions_between(&conn, baseline.date_millis, now)?
            .iter()
            .map(Transaction::signed_amount)
            .sum();
        println!(
            "Balance since {}: {}",
            local_date(baseline.date_millis),
            money(baseline.amount + movement, currency)
        );
    }

    let span = months.max(1);
    let first = add_months(&month, 1 - span as i32)?;
    let window = month_sequence(&first, span, 1)?;
    let series = transactions::category_series(&conn, &window, TxType::Expense)?;
    if !series.is_empty() {
        let mut by_category: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
        for row in &series {
            by_category
                .entry(row.category.as_str())
                .or_default()
                .insert(row.month_key.as_str(), row.total);
        }
        let mut header = vec!["Category".to_string()];
        header.extend(window.iter().cloned());
        let mut cats = Table::new();
        cats.set_header(header);
        for (category, per_month) in &by_category {
            let mut cells = vec![Cell::new(category)];
            for m in &window {
                let total = per_month.get(m.as_str()).copied().unwrap_or(0.0);
                cells.push(Cell::new(money(total, currency)));
            }
            cats.add_row(cells);
        }
        println!("Spending by category\n{cats}");
    }
    Ok(())
}
