//! `moments` command-line collaborator.
//!
//! # Responsibility
//! - Parse arguments, call `moments_core`, format output.
//! - Own process exit codes; core never prints.

use anyhow::{Context, Result};
use clap::Parser;
use moments_core::{default_log_level, init_logging, MomentService, StoreConfig};

mod cli;
mod commands;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();

    let config = cli
        .root
        .map(StoreConfig::new)
        .unwrap_or_else(StoreConfig::from_env);
    let log_dir = cli.log_dir.unwrap_or_else(|| config.log_dir());
    let log_dir = std::path::absolute(&log_dir)
        .with_context(|| format!("cannot resolve log directory `{}`", log_dir.display()))?;
    let level = cli
        .log_level
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, &log_dir)?;

    let store = config
        .open_store()
        .with_context(|| format!("cannot open store at `{}`", config.app_dir.display()))?;
    let service = MomentService::new(store);

    match cli.cmd {
        cli::Cmd::Add {
            photo,
            description,
            lat,
            lon,
            move_source,
        } => commands::add(&service, photo, description, lat.zip(lon), move_source),
        cli::Cmd::List { json } => commands::list(&service, json),
        cli::Cmd::Show { id } => commands::show(&service, &id),
        cli::Cmd::Inspect { id } => commands::inspect(&service, &id),
        cli::Cmd::Delete { id } => commands::delete(&service, &id),
        cli::Cmd::Purge { id } => commands::purge(&service, &id),
        cli::Cmd::Grid { columns } => commands::grid(&service, columns),
        cli::Cmd::Map {
            viewer_lat,
            viewer_lon,
        } => commands::map(&service, viewer_lat.zip(viewer_lon)),
        cli::Cmd::Sweep => commands::sweep(&service),
        cli::Cmd::Ping => commands::ping_core(),
    }
}
