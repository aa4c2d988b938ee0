// ABOUTME: Query executor abstraction consumed by sessions: connections, cursors, transactions
// ABOUTME: Plugin architecture with a SQLite backend and an in-memory cursor for canned rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Query Executor
//!
//! A [`Session`](crate::session::Session) never talks to a driver directly.
//! It asks an [`Engine`] for two [`Connection`]s, one for the write path and
//! one for the read path, and drives them through these traits. Dropping a
//! [`RowCursor`] releases its statement, so a cursor scoped to one call is
//! released on every exit path of that call.

use crate::errors::BindResult;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;

pub mod factory;
pub mod memory;
pub mod sqlite;

/// Result of executing a write statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows changed by the statement
    pub rows_affected: u64,
    /// Identifier generated by the statement; `None` when the driver could not report one
    pub last_insert_id: Option<i64>,
}

/// Forward-only cursor over a statement's result rows
#[async_trait]
pub trait RowCursor: Send {
    /// Column names; populated once the first row has been read
    fn columns(&self) -> &[String];

    /// Advance to the next row, `None` once the cursor is exhausted
    ///
    /// # Errors
    ///
    /// Returns an execution error if the statement fails, or a scan error if
    /// a column value cannot be decoded
    async fn next_row(&mut self) -> BindResult<Option<Vec<Value>>>;
}

/// An open transaction on the write path
#[async_trait]
pub trait TransactionHandle: Send {
    /// Execute a write statement inside the transaction
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver rejects the statement
    async fn execute(&mut self, statement: &str, args: &[Value]) -> BindResult<ExecOutcome>;

    /// Commit and consume the transaction
    ///
    /// # Errors
    ///
    /// Returns an execution error if the commit fails
    async fn commit(self: Box<Self>) -> BindResult<()>;

    /// Roll back and consume the transaction
    ///
    /// # Errors
    ///
    /// Returns an execution error if the rollback fails
    async fn rollback(self: Box<Self>) -> BindResult<()>;
}

/// A connection resource able to run statements and start transactions
#[async_trait]
pub trait Connection: Send + Sync {
    /// Driver name, for diagnostics
    fn driver(&self) -> &str;

    /// Prepare and run a read statement
    ///
    /// # Errors
    ///
    /// Returns an execution error if the statement cannot be prepared
    async fn query<'c>(
        &'c self,
        statement: &'c str,
        args: &'c [Value],
    ) -> BindResult<Box<dyn RowCursor + 'c>>;

    /// Prepare and run a write statement
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver rejects the statement
    async fn execute(&self, statement: &str, args: &[Value]) -> BindResult<ExecOutcome>;

    /// Start a transaction on this connection
    ///
    /// # Errors
    ///
    /// Returns an execution error if the driver refuses to begin
    async fn begin(&self) -> BindResult<Box<dyn TransactionHandle>>;

    /// Release the handle; later calls through it fail
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to release the resource
    async fn close(&self) -> BindResult<()>;
}

/// Source of connection handles for sessions
#[async_trait]
pub trait Engine: Send + Sync {
    /// Write-path connection
    fn execute_connection(&self) -> Arc<dyn Connection>;

    /// Read-path connection
    fn query_connection(&self) -> Arc<dyn Connection>;

    /// Whether executed statements are appended to the session log
    fn query_log_enabled(&self) -> bool;

    /// Shut down every connection resource the engine owns
    async fn close(&self);
}
