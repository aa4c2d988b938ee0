// ABOUTME: Session controller: binds destinations, runs reads and writes, manages transactions
// ABOUTME: Tracks generated identifiers, the last statement, and the optional statement log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Sessions
//!
//! A [`Session`] is one logical unit of work against an [`Engine`]. It holds
//! a write-path and a read-path connection, at most one open transaction, and
//! the [`BindingContext`] of the most recent bind.
//!
//! ```rust,ignore
//! let mut users: Vec<User> = Vec::new();
//! let mut session = Session::new(engine.clone());
//! session.bind(&mut users)?;
//! session.read("SELECT id, name FROM users WHERE active = ?", &args![true]).await?;
//! session.close().await?;
//! assert!(!users.is_empty());
//! ```
//!
//! ## Concurrency
//!
//! A session is used from one task at a time. Every state-changing call takes
//! `&mut self` and nothing inside is locked; concurrent work needs one session
//! per task.
//!
//! ## Destination borrows
//!
//! The session borrows the bound destination mutably for `'d`. The populated
//! value becomes readable again once the session is no longer used, or after
//! [`Session::close`].

use crate::binding::{classify, materialize, BindingContext, IntoDestination};
use crate::constants::binding::{INSERT_KEYWORD, READ_KEYWORD};
use crate::database_plugins::{Connection, Engine, TransactionHandle};
use crate::errors::{BindError, BindResult};
use crate::logging::{log_statement, StatementPath};
use crate::value::{interpolate, Value};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// One step of [`Session::run_transaction`]
pub type TransactionStep<'d> = Box<
    dyn for<'s> FnOnce(&'s mut Session<'d>) -> BoxFuture<'s, BindResult<()>> + Send + 'd,
>;

/// Box a closure as a transaction step
///
/// ```rust,ignore
/// session.run_transaction(vec![
///     step(|s| Box::pin(async move {
///         s.write("UPDATE accounts SET balance = balance - ? WHERE id = ?", &args![10, 1]).await?;
///         Ok(())
///     })),
/// ]).await?;
/// ```
pub fn step<'d, F>(f: F) -> TransactionStep<'d>
where
    F: for<'s> FnOnce(&'s mut Session<'d>) -> BoxFuture<'s, BindResult<()>> + Send + 'd,
{
    Box::new(f)
}

/// Leading keyword class of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Starts with `select`
    Select,
    /// Starts with `insert`
    Insert,
    /// Anything else
    Other,
}

impl StatementKind {
    /// Classify by keyword, ignoring case
    ///
    /// Leading whitespace (spaces, tabs, newlines) is trimmed first, so
    /// `"\n  select 1"` is a [`StatementKind::Select`]. The first six
    /// remaining characters are then compared against `select` and `insert`.
    #[must_use]
    pub fn detect(statement: &str) -> Self {
        let keyword = statement.trim_start().get(..READ_KEYWORD.len());
        match keyword {
            Some(k) if k.eq_ignore_ascii_case(READ_KEYWORD) => Self::Select,
            Some(k) if k.eq_ignore_ascii_case(INSERT_KEYWORD) => Self::Insert,
            _ => Self::Other,
        }
    }
}

/// One logical unit of database work
pub struct Session<'d> {
    engine: Arc<dyn Engine>,
    write: Arc<dyn Connection>,
    read: Arc<dyn Connection>,
    tx: Option<Box<dyn TransactionHandle>>,
    binding: Option<BindingContext<'d>>,
    staged_fields: Vec<String>,
    last_insert_id: i64,
    last_statement: String,
    statement_log: Vec<String>,
}

impl<'d> Session<'d> {
    /// Open a session, taking one write-path and one read-path handle from `engine`
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        let write = engine.execute_connection();
        let read = engine.query_connection();
        Self {
            engine,
            write,
            read,
            tx: None,
            binding: None,
            staged_fields: Vec::new(),
            last_insert_id: 0,
            last_statement: String::new(),
            statement_log: Vec::new(),
        }
    }

    /// Stage an explicit field list for the next bind
    ///
    /// The next record bind uses this list instead of deriving one from the
    /// record's declared fields. The list is consumed by that bind.
    pub fn fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.staged_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Bind a destination, replacing any previous binding
    ///
    /// # Errors
    ///
    /// Returns a classification error if no binding shape accepts the
    /// destination; the previous binding is discarded either way
    pub fn bind<D>(&mut self, destination: D) -> BindResult<&mut Self>
    where
        D: IntoDestination<'d>,
    {
        self.binding = None;
        let preset = std::mem::take(&mut self.staged_fields);
        self.binding = Some(classify(destination.into_destination(), preset)?);
        Ok(self)
    }

    /// Alias of [`Session::bind`], reads better with a bare table name
    ///
    /// # Errors
    ///
    /// Returns a classification error if no binding shape accepts the destination
    pub fn table<D>(&mut self, destination: D) -> BindResult<&mut Self>
    where
        D: IntoDestination<'d>,
    {
        self.bind(destination)
    }

    /// Run a read statement on the read path and materialize it into the bound destination
    ///
    /// Always uses the read-path connection, even inside a transaction. The
    /// cursor is released before this returns, whether it succeeds or not.
    ///
    /// Returns the number of rows materialized.
    ///
    /// # Errors
    ///
    /// Returns the executor's error if the statement fails, `NotFound` when a
    /// single record matched nothing, a scan error when a row does not fit,
    /// and a bind value error when nothing readable is bound
    pub async fn read(&mut self, statement: &str, args: &[Value]) -> BindResult<usize> {
        self.record_statement(statement, args);

        let conn = Arc::clone(&self.read);
        log_statement(conn.driver(), StatementPath::Read, &self.last_statement);
        let mut cursor = conn.query(statement, args).await?;

        let Some(binding) = self.binding.as_mut() else {
            return Err(BindError::bind_value());
        };
        materialize(cursor.as_mut(), binding).await
    }

    /// Run a write statement and return the number of affected rows
    ///
    /// Executes through the active transaction when there is one, otherwise
    /// on the write-path connection. A successful insert updates
    /// [`Session::last_insert_id`] when the driver reports an identifier.
    ///
    /// # Errors
    ///
    /// Returns a usage error for statements starting with `select`, and the
    /// executor's error if the statement fails
    pub async fn write(&mut self, statement: &str, args: &[Value]) -> BindResult<u64> {
        self.record_statement(statement, args);

        let kind = StatementKind::detect(statement);
        if kind == StatementKind::Select {
            return Err(BindError::usage(
                "write cannot run a select statement, use read instead",
            ));
        }

        let outcome = if let Some(tx) = self.tx.as_mut() {
            log_statement(
                self.write.driver(),
                StatementPath::Transaction,
                &self.last_statement,
            );
            tx.execute(statement, args).await?
        } else {
            let conn = Arc::clone(&self.write);
            log_statement(conn.driver(), StatementPath::Write, &self.last_statement);
            conn.execute(statement, args).await?
        };

        if kind == StatementKind::Insert {
            match outcome.last_insert_id {
                Some(id) => self.last_insert_id = id,
                None => warn!(
                    statement = %self.last_statement,
                    "Insert succeeded but no generated identifier was reported"
                ),
            }
        }

        Ok(outcome.rows_affected)
    }

    /// Begin a transaction on the write path
    ///
    /// Starting a second transaction while one is active is left to the
    /// executor; the previous handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns the executor's error if it refuses to begin
    pub async fn begin(&mut self) -> BindResult<()> {
        let conn = Arc::clone(&self.write);
        let tx = conn.begin().await?;
        if self.tx.is_some() {
            warn!("Beginning a transaction while another is active");
        }
        self.tx = Some(tx);
        debug!(driver = %conn.driver(), "Transaction started");
        Ok(())
    }

    /// Commit the active transaction
    ///
    /// The session leaves the transaction state even if the commit fails.
    ///
    /// # Errors
    ///
    /// Returns a usage error when no transaction is active, or the executor's
    /// error if the commit fails
    pub async fn commit(&mut self) -> BindResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| BindError::usage("commit called with no active transaction"))?;
        tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Roll back the active transaction
    ///
    /// The session leaves the transaction state even if the rollback fails.
    ///
    /// # Errors
    ///
    /// Returns a usage error when no transaction is active, or the executor's
    /// error if the rollback fails
    pub async fn rollback(&mut self) -> BindResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| BindError::usage("rollback called with no active transaction"))?;
        tx.rollback().await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Run `steps` in order inside one transaction
    ///
    /// Commits when every step succeeds. On the first failing step the
    /// remaining steps are skipped, the transaction is rolled back, and the
    /// step's error is returned. A rollback failure is attached to that error
    /// as detail.
    ///
    /// # Errors
    ///
    /// Returns the begin error, the first step error, or the commit error
    pub async fn run_transaction(&mut self, steps: Vec<TransactionStep<'d>>) -> BindResult<()> {
        self.begin().await?;

        for (index, run_step) in steps.into_iter().enumerate() {
            if let Err(error) = run_step(&mut *self).await {
                debug!(step = index, error = %error, "Transaction step failed");
                return Err(self.abort(error).await);
            }
        }

        self.commit().await
    }

    async fn abort(&mut self, error: BindError) -> BindError {
        match self.rollback().await {
            Ok(()) => error,
            Err(rollback_error) => {
                warn!(
                    error = %error,
                    rollback_error = %rollback_error,
                    "Rollback failed after transaction step error"
                );
                error.with_detail(format!("rollback failed: {rollback_error}"))
            }
        }
    }

    fn record_statement(&mut self, statement: &str, args: &[Value]) {
        self.last_statement = interpolate(statement, args);
        if self.engine.query_log_enabled() {
            self.statement_log.push(self.last_statement.clone());
        }
    }

    /// Identifier generated by the most recent successful insert, 0 before any
    #[must_use]
    pub const fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    /// Most recent statement with its arguments interpolated
    #[must_use]
    pub fn last_statement(&self) -> &str {
        &self.last_statement
    }

    /// Statements recorded while the engine's query log was enabled
    #[must_use]
    pub fn query_log(&self) -> &[String] {
        &self.statement_log
    }

    /// Active binding, if any
    #[must_use]
    pub const fn binding(&self) -> Option<&BindingContext<'d>> {
        self.binding.as_ref()
    }

    /// Driver name of the write path
    #[must_use]
    pub fn driver(&self) -> &str {
        self.write.driver()
    }

    /// Whether a transaction is active
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Release both connection handles
    ///
    /// An active transaction is rolled back first.
    ///
    /// # Errors
    ///
    /// Returns the first error from the rollback or either handle's close;
    /// every step is attempted regardless
    pub async fn close(self) -> BindResult<()> {
        let Self {
            write, read, tx, ..
        } = self;

        let mut first_error = None;
        if let Some(tx) = tx {
            warn!("Closing session with an active transaction, rolling back");
            if let Err(e) = tx.rollback().await {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = write.close().await {
            first_error.get_or_insert(e);
        }
        if let Err(e) = read.close().await {
            first_error.get_or_insert(e);
        }

        debug!("Session closed");
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.write.driver())
            .field("in_transaction", &self.tx.is_some())
            .field("binding", &self.binding)
            .field("last_insert_id", &self.last_insert_id)
            .field("last_statement", &self.last_statement)
            .finish_non_exhaustive()
    }
}
