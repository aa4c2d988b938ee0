// ABOUTME: Crate-wide constants: naming-convention markers, driver names, env keys, defaults
// ABOUTME: Collected here so configuration and executors agree on the same values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module

/// Field-naming convention markers
pub mod binding {
    /// Tag value that excludes a record field from binding
    pub const IGNORE_TAG: &str = "-";

    /// Leading keyword rejected by the write path
    pub const READ_KEYWORD: &str = "select";

    /// Leading keyword whose writes report a generated identifier
    pub const INSERT_KEYWORD: &str = "insert";
}

/// Executor constants
pub mod database {
    /// Driver name reported by SQLite handles
    pub const SQLITE_DRIVER: &str = "sqlite";

    /// Connection string for a private in-memory SQLite database
    pub const MEMORY_URL: &str = "sqlite::memory:";

    /// Writer pool size for in-memory databases; the one pinned connection keeps the database alive
    pub const MEMORY_POOL_SIZE: u32 = 1;

    /// Default pool size for file databases
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
}

/// Environment variable names
pub mod env_config {
    /// Write-path connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";

    /// Optional read-path connection URL
    pub const DATABASE_READ_URL: &str = "DATABASE_READ_URL";

    /// Pool size for file databases
    pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";

    /// Enables the per-session statement log
    pub const ENABLE_QUERY_LOG: &str = "ENABLE_QUERY_LOG";

    /// Log output format (`json`, `pretty`, `compact`)
    pub const LOG_FORMAT: &str = "LOG_FORMAT";

    /// Log filter directives
    pub const RUST_LOG: &str = "RUST_LOG";
}
