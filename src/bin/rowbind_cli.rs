// ABOUTME: rowbind CLI - runs ad-hoc read and write statements through a session
// ABOUTME: Prints read rows as JSON lines and write results as affected rows plus last insert id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Read rows as JSON, one object per line
//! rowbind-cli query "SELECT id, name FROM users WHERE id > ?" --arg 10
//!
//! # Run a write statement
//! rowbind-cli exec "INSERT INTO users (name) VALUES (?)" --arg alice
//!
//! # Point at a specific database
//! rowbind-cli --database-url sqlite:./data/app.db query "SELECT count(*) AS n FROM users"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rowbind::logging::LoggingConfig;
use rowbind::{DatabaseEngine, DatabaseUrl, Engine, EngineConfig, MapRow, Session, Value};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "rowbind-cli",
    about = "Run SQL statements through a rowbind session",
    long_about = "Runs read statements into key/value rows printed as JSON, and write statements reporting affected rows."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override (defaults to `DATABASE_URL`, then an in-memory database)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a read statement and print each row as JSON
    Query {
        /// Statement text with `?` placeholders
        sql: String,

        /// Positional argument, repeatable; integers, floats and `null` are detected
        #[arg(long = "arg")]
        args: Vec<String>,
    },

    /// Run a write statement and print rows affected and the last insert id
    Exec {
        /// Statement text with `?` placeholders
        sql: String,

        /// Positional argument, repeatable; integers, floats and `null` are detected
        #[arg(long = "arg")]
        args: Vec<String>,
    },
}

/// Interpret a command-line argument as the narrowest matching value
fn parse_arg(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Real(f)
    } else {
        Value::Text(raw.to_owned())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    LoggingConfig::from_env()
        .with_level(log_level)
        .with_stderr()
        .init()?;

    let mut config = EngineConfig::from_env()?;
    if let Some(url) = cli.database_url.as_deref() {
        config = config.with_database_url(DatabaseUrl::parse_url(url)?);
    }

    info!("Connecting to database: {}", config.database_url);
    let engine = DatabaseEngine::connect(&config).await?.into_shared();

    let outcome = run(cli.command, engine.clone()).await;
    engine.close().await;
    outcome
}

async fn run(command: Command, engine: Arc<dyn Engine>) -> Result<()> {
    match command {
        Command::Query { sql, args } => {
            let args: Vec<Value> = args.iter().map(String::as_str).map(parse_arg).collect();
            let mut rows: Vec<MapRow> = Vec::new();

            let mut session = Session::new(engine);
            session.bind(&mut rows)?;
            let read = session.read(&sql, &args).await;
            session.close().await?;
            read.with_context(|| format!("query failed: {sql}"))?;

            let mut stdout = io::stdout().lock();
            for row in &rows {
                writeln!(stdout, "{}", serde_json::to_string(row)?)?;
            }
        }
        Command::Exec { sql, args } => {
            let args: Vec<Value> = args.iter().map(String::as_str).map(parse_arg).collect();

            let mut session = Session::new(engine);
            let written = session.write(&sql, &args).await;
            let last_insert_id = session.last_insert_id();
            session.close().await?;
            let rows_affected = written.with_context(|| format!("exec failed: {sql}"))?;

            println!("rows affected: {rows_affected}");
            println!("last insert id: {last_insert_id}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg_detection() {
        assert_eq!(parse_arg("42"), Value::Integer(42));
        assert_eq!(parse_arg("1.5"), Value::Real(1.5));
        assert_eq!(parse_arg("NULL"), Value::Null);
        assert_eq!(parse_arg("alice"), Value::Text("alice".to_owned()));
    }
}
