// ABOUTME: Tests for environment-driven engine configuration and backend detection
// ABOUTME: Runs serially because every case mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use rowbind::database_plugins::factory::{detect_database_type, DatabaseType};
use rowbind::{DatabaseEngine, DatabaseUrl, EngineConfig, ErrorCode};
use serial_test::serial;
use std::env;

const VARS: [&str; 4] = [
    "DATABASE_URL",
    "DATABASE_READ_URL",
    "DATABASE_MAX_CONNECTIONS",
    "ENABLE_QUERY_LOG",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    let config = EngineConfig::from_env().unwrap();
    assert_eq!(config, EngineConfig::default());
    assert!(config.database_url.is_memory());
}

#[test]
#[serial]
fn test_from_env_reads_every_variable() {
    clear_env();
    env::set_var("DATABASE_URL", "sqlite:./data/write.db");
    env::set_var("DATABASE_READ_URL", "sqlite:./data/replica.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "12");
    env::set_var("ENABLE_QUERY_LOG", "yes");

    let config = EngineConfig::from_env().unwrap();
    clear_env();

    assert_eq!(
        config.database_url,
        DatabaseUrl::sqlite_file("./data/write.db")
    );
    assert_eq!(
        config.read_url,
        Some(DatabaseUrl::sqlite_file("./data/replica.db"))
    );
    assert_eq!(config.max_connections, 12);
    assert!(config.enable_query_log);
}

#[test]
#[serial]
fn test_from_env_rejects_bad_values() {
    clear_env();
    env::set_var("DATABASE_MAX_CONNECTIONS", "0");
    let err = EngineConfig::from_env().unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigInvalid);
    assert!(err.message.contains("DATABASE_MAX_CONNECTIONS"));

    clear_env();
    env::set_var("ENABLE_QUERY_LOG", "sometimes");
    assert_eq!(
        EngineConfig::from_env().unwrap_err().code,
        ErrorCode::ConfigInvalid
    );

    clear_env();
    env::set_var("DATABASE_URL", "redis://localhost");
    assert_eq!(
        EngineConfig::from_env().unwrap_err().code,
        ErrorCode::ConfigInvalid
    );
    clear_env();
}

#[test]
#[serial]
fn test_blank_read_url_shares_write_path() {
    clear_env();
    env::set_var("DATABASE_READ_URL", "   ");
    let config = EngineConfig::from_env().unwrap();
    clear_env();
    assert!(config.read_url.is_none());
}

#[test]
fn test_detect_database_type() {
    assert_eq!(
        detect_database_type("sqlite::memory:").unwrap(),
        DatabaseType::SQLite
    );
    assert_eq!(
        detect_database_type("postgres://localhost/app")
            .unwrap_err()
            .code,
        ErrorCode::ConfigInvalid
    );
    assert!(detect_database_type("mysql://localhost/app").is_err());
}

#[tokio::test]
async fn test_factory_rejects_postgres_urls() {
    let config = EngineConfig::default().with_database_url(DatabaseUrl::PostgreSQL {
        connection_string: "postgresql://localhost/app".to_owned(),
    });
    let err = DatabaseEngine::connect(&config).await.err().unwrap();
    assert_eq!(err.code, ErrorCode::ConfigInvalid);
}

#[tokio::test]
async fn test_factory_connects_memory_engine() {
    let engine = DatabaseEngine::connect(&EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(engine.database_type(), DatabaseType::SQLite);
}
