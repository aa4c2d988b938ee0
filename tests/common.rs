// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: Provides a scripted in-memory engine that records calls, plus record fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `rowbind`
//!
//! [`ScriptedEngine`] hands out connections that record every call they
//! receive (`"read:query ..."`, `"write:execute ..."`, `"tx:commit"`, ...)
//! and answer from queues of canned rows and outcomes.

use async_trait::async_trait;
use rowbind::binding::unknown_column;
use rowbind::database_plugins::memory::StaticCursor;
use rowbind::{
    BindError, BindResult, Connection, Engine, ExecOutcome, FieldSpec, FromValue, NameProvider,
    Record, RowCursor, TransactionHandle, Value,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ================================
// Scripted engine
// ================================

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    results: VecDeque<StaticCursor>,
    outcomes: VecDeque<Result<ExecOutcome, String>>,
    next_id: i64,
    query_log: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

impl Script {
    fn next_outcome(&mut self) -> BindResult<ExecOutcome> {
        match self.outcomes.pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(BindError::execution(message)),
            None => {
                self.next_id += 1;
                Ok(ExecOutcome {
                    rows_affected: 1,
                    last_insert_id: Some(self.next_id),
                })
            }
        }
    }
}

/// Engine whose connections record calls and replay canned results
#[derive(Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<Script>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        init_test_logging();
        Arc::new(Self::default())
    }

    /// Queue the rows the next read returns
    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        let columns = columns.iter().map(|c| (*c).to_owned()).collect();
        self.lock().results.push_back(StaticCursor::new(columns, rows));
    }

    /// Queue the outcome of the next write
    pub fn push_outcome(&self, rows_affected: u64, last_insert_id: Option<i64>) {
        self.lock().outcomes.push_back(Ok(ExecOutcome {
            rows_affected,
            last_insert_id,
        }));
    }

    /// Make the next write fail with an execution error
    pub fn push_failure(&self, message: &str) {
        self.lock().outcomes.push_back(Err(message.to_owned()));
    }

    pub fn set_query_log(&self, enabled: bool) {
        self.lock().query_log = enabled;
    }

    pub fn fail_commit(&self) {
        self.lock().fail_commit = true;
    }

    pub fn fail_rollback(&self) {
        self.lock().fail_rollback = true;
    }

    /// Every call observed so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Calls whose text starts with `prefix`
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn execute_connection(&self) -> Arc<dyn Connection> {
        Arc::new(ScriptedConnection {
            path: "write",
            script: Arc::clone(&self.script),
        })
    }

    fn query_connection(&self) -> Arc<dyn Connection> {
        Arc::new(ScriptedConnection {
            path: "read",
            script: Arc::clone(&self.script),
        })
    }

    fn query_log_enabled(&self) -> bool {
        self.lock().query_log
    }

    async fn close(&self) {
        self.lock().calls.push("engine:close".to_owned());
    }
}

struct ScriptedConnection {
    path: &'static str,
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    fn record(&self, call: &str) {
        let path = self.path;
        self.script.lock().unwrap().calls.push(format!("{path}:{call}"));
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn driver(&self) -> &str {
        "scripted"
    }

    async fn query<'c>(
        &'c self,
        statement: &'c str,
        _args: &'c [Value],
    ) -> BindResult<Box<dyn RowCursor + 'c>> {
        self.record(&format!("query {statement}"));
        let cursor = self
            .script
            .lock()
            .unwrap()
            .results
            .pop_front()
            .unwrap_or_default();
        Ok(Box::new(cursor))
    }

    async fn execute(&self, statement: &str, _args: &[Value]) -> BindResult<ExecOutcome> {
        self.record(&format!("execute {statement}"));
        self.script.lock().unwrap().next_outcome()
    }

    async fn begin(&self) -> BindResult<Box<dyn TransactionHandle>> {
        self.record("begin");
        Ok(Box::new(ScriptedTransaction {
            script: Arc::clone(&self.script),
        }))
    }

    async fn close(&self) -> BindResult<()> {
        self.record("close");
        Ok(())
    }
}

struct ScriptedTransaction {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl TransactionHandle for ScriptedTransaction {
    async fn execute(&mut self, statement: &str, _args: &[Value]) -> BindResult<ExecOutcome> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(format!("tx:execute {statement}"));
        script.next_outcome()
    }

    async fn commit(self: Box<Self>) -> BindResult<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push("tx:commit".to_owned());
        if script.fail_commit {
            return Err(BindError::execution("commit refused"));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> BindResult<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push("tx:rollback".to_owned());
        if script.fail_rollback {
            return Err(BindError::execution("connection lost"));
        }
        Ok(())
    }
}

// ================================
// Record fixtures
// ================================

/// Columns of the `User` fixture, in declaration order
pub const USER_COLUMNS: [&str; 3] = ["id", "user_name", "email"];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub cached_rank: u32,
}

impl Record for User {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("id"),
            FieldSpec::tagged("name", "user_name"),
            FieldSpec::new("email"),
            FieldSpec::ignored("cached_rank"),
        ]
    }

    fn set_field(&mut self, column: &str, value: Value) -> BindResult<()> {
        match column {
            "id" => self.id = FromValue::from_value(value)?,
            "user_name" => self.name = FromValue::from_value(value)?,
            "email" => self.email = FromValue::from_value(value)?,
            other => return Err(unknown_column::<Self>(other)),
        }
        Ok(())
    }
}

pub fn user_row(id: i64, name: &str, email: Option<&str>) -> Vec<Value> {
    vec![
        Value::Integer(id),
        Value::Text(name.to_owned()),
        email.map_or(Value::Null, |e| Value::Text(e.to_owned())),
    ]
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Invoice {
    pub number: String,
    pub amount_cents: i64,
}

impl NameProvider for Invoice {
    fn bind_name(&self) -> String {
        "billing_invoices".to_owned()
    }
}

impl Record for Invoice {
    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new("number"), FieldSpec::new("amount_cents")]
    }

    fn set_field(&mut self, column: &str, value: Value) -> BindResult<()> {
        match column {
            "number" => self.number = FromValue::from_value(value)?,
            "amount_cents" => self.amount_cents = FromValue::from_value(value)?,
            other => return Err(unknown_column::<Self>(other)),
        }
        Ok(())
    }

    fn name_provider(&self) -> Option<&dyn NameProvider> {
        Some(self)
    }
}
