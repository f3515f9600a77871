use crate::config::load_config;
use crate::db::get_connection;
use crate::error::Result;
use crate::months::now_millis;
use crate::preferences;
use crate::transactions;

pub fn run() -> Result<()> {
    let config = load_config();
    let db_path = config.db_path();

    println!("Owner:      {}", config.owner_id);
    println!("Data dir:   {}", config.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Remote:     {}", config.remote.as_deref().unwrap_or("(local-only)"));

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        crate::db::init_db(&conn)?;

        let (total, deleted) = transactions::count_all(&conn)?;
        let dirty = transactions::count_dirty(&conn)?;
        let settings = preferences::snapshot(&conn)?;
        let goals = preferences::visible_goals(&conn)?.len();
        let pending_goals = preferences::pending_goals(&conn)?.len();
        let checkpoint = preferences::last_delta_sync_at(&conn)?;

        println!();
        println!("Transactions:   {total} ({deleted} deleted)");
        println!("Unsynced:       {dirty}");
        println!("Settings:       {}", if settings.dirty { "modified" } else { "synced" });
        println!("Goals:          {goals} ({pending_goals} unsynced)");
        println!("Checkpoint:     {checkpoint}");
    } else {
        println!();
        println!("Database not found. Run `moneybox init` to set up.");
    }

    Ok(())
}

pub fn purge(days: Option<i64>) -> Result<()> {
    let (mut config, conn) = super::open_store()?;
    if let Some(d) = days {
        config.tombstone_retention_days = d;
    }
    let cutoff = config.retention_cutoff(now_millis());
    let removed = transactions::purge_deleted(&conn, cutoff)?;
    println!("Purged {removed} synced deletions older than {} days", config.tombstone_retention_days.max(0));
    Ok(())
}
