// ABOUTME: SQLite query executor built on sqlx connection pools
// ABOUTME: Decodes columns by storage class and wraps sqlx transactions for the write path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! SQLite executor
//!
//! The engine owns a write pool and, when a separate read URL is configured,
//! a read pool. Without a read URL a file database shares the write pool on
//! both paths, while an in-memory database gets its own reader pool over the
//! same shared-cache database so reads never queue behind an open
//! transaction on the single writer connection. Every call to [`Engine::execute_connection`] or [`Engine::query_connection`]
//! hands out a fresh handle over the pool, so closing one session's handle
//! never affects another session.

use super::{Connection, Engine, ExecOutcome, RowCursor, TransactionHandle};
use crate::config::{DatabaseUrl, EngineConfig};
use crate::constants::database::{MEMORY_POOL_SIZE, SQLITE_DRIVER};
use crate::errors::{BindError, BindResult};
use crate::value::Value;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions,
    SqliteQueryResult, SqliteRow,
};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// SQLite engine: pools for the write and read paths plus the query-log flag
#[derive(Debug)]
pub struct SqliteEngine {
    write_pool: SqlitePool,
    read_pool: SqlitePool,
    query_log: AtomicBool,
}

impl SqliteEngine {
    /// Open the pools described by `config`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a URL is not a SQLite URL, or an
    /// execution error if a pool cannot be opened
    pub async fn connect(config: &EngineConfig) -> BindResult<Self> {
        let write_options = connect_options(&config.database_url)?;
        let write_pool = open_pool(
            &config.database_url,
            write_options.clone(),
            config.max_connections,
        )
        .await?;
        let read_pool = match &config.read_url {
            Some(url) => open_pool(url, connect_options(url)?, config.max_connections).await?,
            None if config.database_url.is_memory() => {
                open_memory_readers(write_options, config.max_connections).await?
            }
            None => write_pool.clone(),
        };

        info!(
            url = %config.database_url,
            read_url = ?config.read_url,
            query_log = config.enable_query_log,
            "SQLite engine connected"
        );

        Ok(Self {
            write_pool,
            read_pool,
            query_log: AtomicBool::new(config.enable_query_log),
        })
    }

    /// Toggle statement logging for sessions created from this engine
    pub fn set_query_log(&self, enabled: bool) {
        self.query_log.store(enabled, Ordering::Relaxed);
    }

    /// Underlying write pool, for setup work outside a session
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.write_pool
    }
}

#[async_trait]
impl Engine for SqliteEngine {
    fn execute_connection(&self) -> Arc<dyn Connection> {
        Arc::new(SqliteHandle::new(self.write_pool.clone()))
    }

    fn query_connection(&self) -> Arc<dyn Connection> {
        Arc::new(SqliteHandle::new(self.read_pool.clone()))
    }

    fn query_log_enabled(&self) -> bool {
        self.query_log.load(Ordering::Relaxed)
    }

    async fn close(&self) {
        self.write_pool.close().await;
        self.read_pool.close().await;
        info!("SQLite engine closed");
    }
}

fn connect_options(url: &DatabaseUrl) -> BindResult<SqliteConnectOptions> {
    if !url.is_sqlite() {
        return Err(BindError::config(format!(
            "SQLite engine cannot open {url}"
        )));
    }

    let options =
        SqliteConnectOptions::from_str(&url.to_connection_string())?.create_if_missing(true);
    if url.is_memory() {
        Ok(options)
    } else {
        Ok(options.journal_mode(SqliteJournalMode::Wal))
    }
}

async fn open_pool(
    url: &DatabaseUrl,
    options: SqliteConnectOptions,
    max_connections: u32,
) -> BindResult<SqlitePool> {
    // An in-memory database lives only as long as its connection
    let pool = if url.is_memory() {
        SqlitePoolOptions::new()
            .max_connections(MEMORY_POOL_SIZE)
            .min_connections(MEMORY_POOL_SIZE)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?
    };

    debug!(url = %url, "Opened SQLite pool");
    Ok(pool)
}

/// Reader pool over the writer's shared-cache in-memory database
///
/// Readers skip shared-cache table locks, so they see the writer's
/// uncommitted rows instead of blocking on them.
async fn open_memory_readers(
    options: SqliteConnectOptions,
    max_connections: u32,
) -> BindResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options.pragma("read_uncommitted", "true"))
        .await?;

    debug!("Opened SQLite in-memory reader pool");
    Ok(pool)
}

/// One session's view of a pool
pub struct SqliteHandle {
    pool: SqlitePool,
    closed: AtomicBool,
}

impl SqliteHandle {
    fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> BindResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BindError::usage("connection handle is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for SqliteHandle {
    fn driver(&self) -> &str {
        SQLITE_DRIVER
    }

    async fn query<'c>(
        &'c self,
        statement: &'c str,
        args: &'c [Value],
    ) -> BindResult<Box<dyn RowCursor + 'c>> {
        self.ensure_open()?;
        let stream = bind_arguments(statement, args).fetch(&self.pool);
        Ok(Box::new(SqliteCursor {
            stream,
            columns: Vec::new(),
        }))
    }

    async fn execute(&self, statement: &str, args: &[Value]) -> BindResult<ExecOutcome> {
        self.ensure_open()?;
        let result = bind_arguments(statement, args)
            .execute(&self.pool)
            .await?;
        Ok(outcome(&result))
    }

    async fn begin(&self) -> BindResult<Box<dyn TransactionHandle>> {
        self.ensure_open()?;
        let inner = self.pool.begin().await?;
        Ok(Box::new(SqliteTransaction { inner }))
    }

    async fn close(&self) -> BindResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Transaction on the write pool
struct SqliteTransaction {
    inner: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl TransactionHandle for SqliteTransaction {
    async fn execute(&mut self, statement: &str, args: &[Value]) -> BindResult<ExecOutcome> {
        let result = bind_arguments(statement, args)
            .execute(&mut *self.inner)
            .await?;
        Ok(outcome(&result))
    }

    async fn commit(self: Box<Self>) -> BindResult<()> {
        let Self { inner } = *self;
        inner.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> BindResult<()> {
        let Self { inner } = *self;
        inner.rollback().await?;
        Ok(())
    }
}

/// Rows streamed from a pooled connection; dropping it releases the statement
struct SqliteCursor<'c> {
    stream: BoxStream<'c, Result<SqliteRow, sqlx::Error>>,
    columns: Vec<String>,
}

#[async_trait]
impl<'c> RowCursor for SqliteCursor<'c> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> BindResult<Option<Vec<Value>>> {
        let Some(row) = self.stream.try_next().await? else {
            return Ok(None);
        };

        if self.columns.is_empty() {
            self.columns = row
                .columns()
                .iter()
                .map(|column| column.name().to_owned())
                .collect();
        }

        (0..row.len())
            .map(|index| decode_column(&row, index))
            .collect::<BindResult<Vec<_>>>()
            .map(Some)
    }
}

fn bind_arguments<'q>(
    statement: &'q str,
    args: &'q [Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    args.iter()
        .fold(sqlx::query(statement), |query, arg| match arg {
            Value::Null => query.bind(None::<i64>),
            Value::Bool(b) => query.bind(*b),
            Value::Integer(i) => query.bind(*i),
            Value::Real(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
        })
}

fn outcome(result: &SqliteQueryResult) -> ExecOutcome {
    ExecOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id: Some(result.last_insert_rowid()),
    }
}

/// SQLite storage classes a column value can carry
enum StorageClass {
    Null,
    Integer,
    Real,
    Blob,
    Text,
}

fn storage_class(row: &SqliteRow, index: usize) -> BindResult<StorageClass> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(StorageClass::Null);
    }
    Ok(match raw.type_info().name() {
        "INTEGER" => StorageClass::Integer,
        "REAL" => StorageClass::Real,
        "BLOB" => StorageClass::Blob,
        _ => StorageClass::Text,
    })
}

fn decode_column(row: &SqliteRow, index: usize) -> BindResult<Value> {
    let value = match storage_class(row, index)? {
        StorageClass::Null => Value::Null,
        StorageClass::Integer => Value::Integer(row.try_get_unchecked(index)?),
        StorageClass::Real => Value::Real(row.try_get_unchecked(index)?),
        StorageClass::Blob => Value::Bytes(row.try_get_unchecked(index)?),
        StorageClass::Text => Value::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}
