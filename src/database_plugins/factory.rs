// ABOUTME: Engine factory that selects a backend from the connection URL
// ABOUTME: Recognizes SQLite URLs and rejects PostgreSQL and unknown schemes with a config error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Engine factory
//!
//! Detects the backend from the connection string and builds the matching
//! engine.

use super::sqlite::SqliteEngine;
use super::{Connection, Engine};
use crate::config::EngineConfig;
use crate::errors::{BindError, BindResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// SQLite file or in-memory database
    SQLite,
}

/// Engine wrapper that delegates to the backend chosen at connect time
#[derive(Debug)]
pub enum DatabaseEngine {
    /// SQLite backend
    SQLite(SqliteEngine),
}

impl DatabaseEngine {
    /// Connect to the backend named by the configured write URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL scheme is unsupported, or the
    /// backend's error if it cannot connect
    pub async fn connect(config: &EngineConfig) -> BindResult<Self> {
        let url = config.database_url.to_connection_string();
        match detect_database_type(&url)? {
            DatabaseType::SQLite => {
                info!("Initializing SQLite engine");
                Ok(Self::SQLite(SqliteEngine::connect(config).await?))
            }
        }
    }

    /// Backend type of this engine
    #[must_use]
    pub const fn database_type(&self) -> DatabaseType {
        match self {
            Self::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Toggle statement logging for sessions created from this engine
    pub fn set_query_log(&self, enabled: bool) {
        match self {
            Self::SQLite(engine) => engine.set_query_log(enabled),
        }
    }

    /// Share this engine with sessions
    #[must_use]
    pub fn into_shared(self) -> Arc<dyn Engine> {
        Arc::new(self)
    }
}

/// Detect the backend from a connection URL
///
/// # Errors
///
/// Returns a configuration error for PostgreSQL URLs, which this crate does not
/// support, and for any scheme it does not recognize
pub fn detect_database_type(database_url: &str) -> BindResult<DatabaseType> {
    if database_url.starts_with("sqlite:") {
        Ok(DatabaseType::SQLite)
    } else if database_url.starts_with("postgresql://") || database_url.starts_with("postgres://")
    {
        Err(BindError::config(
            "PostgreSQL connection string detected, but only SQLite is supported",
        ))
    } else {
        Err(BindError::config(format!(
            "Unsupported database URL format: {database_url}. \
             Supported formats: sqlite:path/to/db.sqlite, sqlite::memory:"
        )))
    }
}

#[async_trait]
impl Engine for DatabaseEngine {
    fn execute_connection(&self) -> Arc<dyn Connection> {
        match self {
            Self::SQLite(engine) => engine.execute_connection(),
        }
    }

    fn query_connection(&self) -> Arc<dyn Connection> {
        match self {
            Self::SQLite(engine) => engine.query_connection(),
        }
    }

    fn query_log_enabled(&self) -> bool {
        match self {
            Self::SQLite(engine) => engine.query_log_enabled(),
        }
    }

    async fn close(&self) {
        match self {
            Self::SQLite(engine) => engine.close().await,
        }
    }
}
