//! Herald - typed in-process event dispatch

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::time::Duration;

use herald_config::{find_all_config_files, load_or_default, HeraldConfig};

mod commands;
mod demo;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.telemetry.level = level.clone();
    }
    if cli.json_logs {
        config.telemetry.json_output = true;
    }
    herald_telemetry::try_init_subscriber(&config.telemetry)?;

    match cli.command {
        Commands::Demo {
            events,
            delay_ms,
            json,
        } => run_demo(&config, events, delay_ms, json).await,
        Commands::Config { paths } => run_config(&config, paths),
    }
}

async fn run_demo(
    config: &HeraldConfig,
    events: usize,
    delay_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let delay = delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.dispatch.default_delay());
    tracing::debug!(events, ?delay, "starting demo");

    let report = demo::run(config, events, delay).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Demo finished".green().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{:<16}{}", "scheduled".cyan(), report.scheduled);
        println!("{:<16}{}", "heartbeat".cyan(), report.heartbeat);
        println!("{:<16}{}", "status_changed".cyan(), report.status_changed);
        println!("{:<16}{}", "alarm".cyan(), report.alarm);
    }
    Ok(())
}

fn run_config(config: &HeraldConfig, paths: bool) -> Result<()> {
    if paths {
        let found = find_all_config_files();
        if found.is_empty() {
            println!("{}", "No configuration files found".dimmed());
        }
        for path in found {
            println!("{}", path.display());
        }
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
