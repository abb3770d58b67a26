//! Test utilities for database and application testing.
//!
//! Provides an in-memory SQLite database with migrations applied, plus
//! helpers for building registry instances and a fully wired router.

use std::sync::Arc;

use anyhow::Result;
use repolink::config::AppConfig;
use repolink::crypto::CryptoKey;
use repolink::migration::{Migrator, MigratorTrait};
use repolink::registry::ConnectorRegistry;
use repolink::repositories::UploadedFileRepository;
use repolink::server::AppState;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Operator token accepted by the test application.
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-operator-token";

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is capped at a single connection so every query sees the same
/// in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Fixed 32-byte key for tests.
#[allow(dead_code)]
pub fn test_crypto_key() -> CryptoKey {
    CryptoKey::new(vec![7u8; 32]).expect("valid test key")
}

/// Builds a registry over the given database with the fixed test key.
#[allow(dead_code)]
pub fn test_registry(db: &DatabaseConnection) -> ConnectorRegistry {
    ConnectorRegistry::new(Arc::new(db.clone()), test_crypto_key())
}

/// Builds a blob store repository over the given database.
#[allow(dead_code)]
pub fn test_file_repo(db: &DatabaseConnection) -> UploadedFileRepository {
    UploadedFileRepository::new(Arc::new(db.clone()))
}

/// Builds application state with the fixed test key and operator token.
#[allow(dead_code)]
pub fn test_app_state(db: DatabaseConnection) -> AppState {
    let config = AppConfig {
        operator_tokens: vec![TEST_TOKEN.to_string()],
        crypto_key: Some(vec![7u8; 32]),
        ..AppConfig::default()
    };
    AppState::new(config, db).expect("valid test state")
}
