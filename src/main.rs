mod cli;
mod config;
mod db;
mod error;
mod fmt;
mod language;
mod models;
mod months;
mod preferences;
mod reconcile;
mod remote;
mod sync;
mod transactions;

use clap::Parser;

use cli::{Cli, Commands, GoalsCommands, SettingsCommands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            owner,
            remote,
            no_remote,
        } => cli::init::run(data_dir, owner, remote, no_remote),
        Commands::Add {
            amount,
            category,
            income,
            date,
            note,
            repeat,
        } => cli::entries::add(amount, category, income, date, note, repeat),
        Commands::Save {
            goal,
            amount,
            withdraw,
            date,
            note,
        } => cli::entries::save(&goal, amount, withdraw, date, note),
        Commands::Edit {
            id,
            amount,
            category,
            date,
            note,
            tx_type,
        } => cli::entries::edit(&id, amount, category, date, note, tx_type),
        Commands::Delete { id } => cli::entries::delete(&id),
        Commands::List {
            month,
            recent,
            planned,
            before,
            from_date,
            to_date,
        } => cli::entries::list(month, recent, planned, before, from_date, to_date),
        Commands::Summary { month, months } => cli::summary::run(month, months),
        Commands::Settings { command } => match command {
            SettingsCommands::Show => cli::settings::show(),
            SettingsCommands::Set { key, value } => cli::settings::set(&key, &value),
            SettingsCommands::Baseline { amount, date } => cli::settings::baseline(amount, date),
            SettingsCommands::ClearBaseline => cli::settings::clear_baseline(),
        },
        Commands::Goals { command } => match command {
            GoalsCommands::List => cli::goals::list(),
            GoalsCommands::Add { name, target, deadline } => cli::goals::add(&name, target, deadline),
            GoalsCommands::Update {
                id,
                name,
                target,
                deadline,
            } => cli::goals::update(&id, name, target, deadline),
            GoalsCommands::Delete { id } => cli::goals::delete(&id),
        },
        Commands::Sync { command } => cli::sync::run(command),
        Commands::Status => cli::status::run(),
        Commands::Purge { days } => cli::status::purge(days),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
