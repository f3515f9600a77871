use std::path::PathBuf;

use crate::config::{load_config, save_config, shellexpand_path};
use crate::db::{get_connection, init_db};
use crate::error::Result;

pub fn run(data_dir: Option<String>, owner: Option<String>, remote: Option<String>, no_remote: bool) -> Result<()> {
    let mut config = load_config();

    if let Some(dir) = data_dir {
        config.data_dir = shellexpand_path(&dir);
    }
    if let Some(owner) = owner.map(|o| o.trim().to_string()).filter(|o| !o.is_empty()) {
        config.owner_id = owner;
    }
    if let Some(dir) = remote {
        let expanded = shellexpand_path(&dir);
        std::fs::create_dir_all(&expanded)?;
        config.remote = Some(expanded);
    } else if no_remote {
        config.remote = None;
    }

    save_config(&config)?;

    let resolved = PathBuf::from(&config.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&config.db_path())?;
    init_db(&conn)?;

    println!("Initialized moneybox at {}", resolved.display());
    match &config.remote {
        Some(dir) => println!("Syncing as '{}' through {dir}", config.owner_id),
        None => println!("Running local-only (no remote configured)"),
    }
    Ok(())
}
