//! PostgreSQL adapters - Database implementations of the booking ports.
//!
//! - `PostgresBookingStore` - Transactional unit of work with row locks
//! - `PostgresBookingReader` - Lock-free listings and lookups
//! - `PostgresDirectory` - Members, services, trainers, locations

mod booking_reader;
mod booking_store;
mod directory;
mod rows;

pub use booking_reader::PostgresBookingReader;
pub use booking_store::{PostgresBookingStore, PostgresTransaction};
pub use directory::PostgresDirectory;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Open a connection pool sized from configuration.
///
/// Every connection gets the configured `lock_timeout`, so a booking stuck
/// behind a held session row fails instead of waiting indefinitely.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let lock_timeout_ms = config.lock_timeout_ms;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                let statement = format!("SET lock_timeout = {}", lock_timeout_ms);
                sqlx::query(&statement).execute(conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to connect: {}", e)))
}

/// Apply pending schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Migration failed: {}", e)))
}
