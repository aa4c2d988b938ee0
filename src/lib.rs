// ABOUTME: Main library entry point for the rowbind SQL binding engine
// ABOUTME: Binds query results to records, record lists, and key/value rows through sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # rowbind
//!
//! Binds the results of SQL queries to caller-supplied shapes without
//! per-column scan code. A destination is classified once at bind time into a
//! [`BindShape`]; reads then stream rows from the executor into it.
//!
//! ## Shapes
//!
//! - a bare table name (`&str` / `String`)
//! - a single [`Record`] (`&mut R`), read as exactly one row
//! - a record collection (`&mut Vec<R>`)
//! - a single [`MapRow`] (`&mut MapRow`)
//! - a mapping collection (`&mut Vec<MapRow>`)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rowbind::{args, DatabaseEngine, EngineConfig, MapRow, Session};
//!
//! #[tokio::main]
//! async fn main() -> rowbind::BindResult<()> {
//!     let engine = DatabaseEngine::connect(&EngineConfig::from_env()?)
//!         .await?
//!         .into_shared();
//!
//!     let mut rows: Vec<MapRow> = Vec::new();
//!     let mut session = Session::new(engine);
//!     session.bind(&mut rows)?;
//!     session.read("SELECT 1 AS one, ? AS two", &args![2]).await?;
//!     session.close().await?;
//!
//!     println!("{rows:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Binding**: destination classification, field metadata, row materialization
//! - **Session**: read and write paths, transactions, statement diagnostics
//! - **Database plugins**: the executor traits and the SQLite backend
//! - **Config**: environment-driven engine settings

/// Destination classification, record field metadata, and row materialization
pub mod binding;

/// Engine configuration loaded from the environment
pub mod config;

/// Crate-wide constants
pub mod constants;

/// Query executor traits and backends
pub mod database_plugins;

/// Unified error handling
pub mod errors;

/// Logging configuration and statement log records
pub mod logging;

/// Sessions: one logical unit of database work
pub mod session;

/// Dynamic column values and argument conversions
pub mod value;

pub use binding::{
    BindShape, BindingContext, Destination, FieldSpec, IntoDestination, NameProvider, Record,
};
pub use config::{DatabaseUrl, EngineConfig};
pub use database_plugins::factory::DatabaseEngine;
pub use database_plugins::sqlite::SqliteEngine;
pub use database_plugins::{Connection, Engine, ExecOutcome, RowCursor, TransactionHandle};
pub use errors::{BindError, BindResult, ErrorCode};
pub use session::{step, Session, TransactionStep};
pub use value::{FromValue, MapRow, Value};
