//! Huddle Database Crate
//!
//! SQLite backed implementations of the room engine's collaborators, plus
//! pool preparation and schema migrations.

use sqlx::SqlitePool;
use tracing::info;

use huddle_config::DatabaseConfig;

pub mod connection;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{
    AuditRepository, DocumentRepository, MembershipRepository, MessageRepository,
    NotificationRepository, UserRepository,
};

pub use types::{DatabaseError, DatabaseResult};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    info!("database initialized");
    Ok(pool)
}
