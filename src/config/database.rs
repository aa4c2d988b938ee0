// ABOUTME: Database configuration types for the write and read connection paths
// ABOUTME: Parses connection URLs and loads pool and query-log settings from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::{database, env_config};
use crate::errors::{BindError, BindResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Type-safe database URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// `PostgreSQL` connection; parsed so the factory can reject it by name
    PostgreSQL {
        /// `PostgreSQL` connection string
        connection_string: String,
    },
    /// In-memory `SQLite`
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL scheme is not recognized
    pub fn parse_url(s: &str) -> BindResult<Self> {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else if path_str.is_empty() {
                Err(BindError::config("SQLite URL is missing a database path"))
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str.trim_start_matches("//")),
                })
            }
        } else if s.starts_with("postgresql://") || s.starts_with("postgres://") {
            Ok(Self::PostgreSQL {
                connection_string: s.to_owned(),
            })
        } else {
            Err(BindError::config(format!(
                "Unsupported database URL format: {s}"
            )))
        }
    }

    /// `SQLite` URL for a file path
    #[must_use]
    pub fn sqlite_file(path: impl Into<PathBuf>) -> Self {
        Self::SQLite { path: path.into() }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::PostgreSQL { connection_string } => connection_string.clone(),
            Self::Memory => database::MEMORY_URL.to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Check if this is a `SQLite` database
    #[must_use]
    pub const fn is_sqlite(&self) -> bool {
        matches!(self, Self::SQLite { .. } | Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::Memory
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Connection settings for an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Write-path URL
    pub database_url: DatabaseUrl,
    /// Read-path URL; the write path is shared when unset
    pub read_url: Option<DatabaseUrl>,
    /// Pool size for file databases
    pub max_connections: u32,
    /// Whether sessions append executed statements to their log
    pub enable_query_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DatabaseUrl::Memory,
            read_url: None,
            max_connections: database::DEFAULT_MAX_CONNECTIONS,
            enable_query_log: false,
        }
    }
}

impl EngineConfig {
    /// Load engine configuration from environment
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any variable holds an unparseable value
    pub fn from_env() -> BindResult<Self> {
        let database_url = DatabaseUrl::parse_url(&env_var_or(
            env_config::DATABASE_URL,
            database::MEMORY_URL,
        ))?;

        let read_url = env::var(env_config::DATABASE_READ_URL)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| DatabaseUrl::parse_url(&url))
            .transpose()?;

        let max_connections = match env::var(env_config::DATABASE_MAX_CONNECTIONS) {
            Ok(raw) => raw.trim().parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                BindError::config(format!(
                    "Invalid {} value: {raw}",
                    env_config::DATABASE_MAX_CONNECTIONS
                ))
            })?,
            Err(_) => database::DEFAULT_MAX_CONNECTIONS,
        };

        let enable_query_log = parse_flag(
            env_config::ENABLE_QUERY_LOG,
            &env_var_or(env_config::ENABLE_QUERY_LOG, "false"),
        )?;

        Ok(Self {
            database_url,
            read_url,
            max_connections,
            enable_query_log,
        })
    }

    /// Set the write-path URL
    #[must_use]
    pub fn with_database_url(mut self, url: DatabaseUrl) -> Self {
        self.database_url = url;
        self
    }

    /// Set a separate read-path URL
    #[must_use]
    pub fn with_read_url(mut self, url: DatabaseUrl) -> Self {
        self.read_url = Some(url);
        self
    }

    /// Set the pool size for file databases
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Enable or disable the statement log
    #[must_use]
    pub const fn with_query_log(mut self, enabled: bool) -> Self {
        self.enable_query_log = enabled;
        self
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_flag(key: &str, raw: &str) -> BindResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(BindError::config(format!("Invalid {key} value: {other}"))),
    }
}
