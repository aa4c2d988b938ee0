// ABOUTME: Configuration module for engine connection settings
// ABOUTME: Loads everything from environment variables; there are no config files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! - **Database**: connection URLs, pool size, and the query-log flag

/// Database URL parsing and engine configuration
pub mod database;

pub use database::{DatabaseUrl, EngineConfig};
