use comfy_table::{Cell, Table};

use super::{open_store, remote_for, short_id, SyncCommands};
use crate::error::Result;
use crate::fmt::money;
use crate::language::LocaleState;
use crate::months::{local_date, parse_month};
use crate::preferences;
use crate::sync::Synchronizer;

pub fn run(command: Option<SyncCommands>) -> Result<()> {
    let (config, conn) = open_store()?;
    if config.remote.is_none() {
        println!("Running local-only; use `moneybox init --remote <dir>` to enable sync.");
    }
    let remote = remote_for(&config);
    let sync = Synchronizer::new(&conn, remote.as_ref());
    let mut locale = LocaleState::new(&preferences::snapshot(&conn)?.language);

    match command.unwrap_or(SyncCommands::All) {
        SyncCommands::All => {
            let pulled = sync.pull_and_merge()?;
            let pushed = sync.push_dirty_batch(config.push_batch_limit)?;
            println!("Pulled {pulled} changes, pushed {pushed}");
        }
        SyncCommands::Pull => {
            let pulled = sync.pull_and_merge()?;
            println!("Pulled {pulled} changes");
        }
        SyncCommands::Push => {
            let pushed = sync.push_dirty_batch(config.push_batch_limit)?;
            println!("Pushed {pushed}");
        }
        SyncCommands::Goals => {
            let changed = sync.sync_savings_goals()?;
            println!("Synced {changed} savings goal changes");
        }
        SyncCommands::Older { before, limit } => {
            parse_month(&before)?;
            let rows = sync.fetch_older_transactions(&before, limit)?;
            if rows.is_empty() {
                println!("No remote history before {before}.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["ID", "Date", "Type", "Category", "Amount"]);
            for tx in &rows {
                table.add_row(vec![
                    Cell::new(short_id(&tx.id)),
                    Cell::new(local_date(tx.date_millis)),
                    Cell::new(tx.tx_type.as_str()),
                    Cell::new(&tx.category),
                    Cell::new(money(tx.amount, &tx.currency)),
                ]);
            }
            println!("Remote history before {before}\n{table}");
            return Ok(());
        }
    }

    let after = preferences::snapshot(&conn)?;
    if locale.apply(&after.language) {
        println!("Language is now {}", locale.current());
    }
    let pending = crate::transactions::count_dirty(&conn)?;
    if pending > 0 {
        println!("{pending} transactions still waiting to sync");
    }
    Ok(())
}
