mod models;
mod seeders;

pub use models::*;
pub use seeders::seed_defaults;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("hotelier.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    seed_defaults(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql"))
        .await
        .context("Migration 001 failed")?;

    // Migration 002: Promo code redemptions
    let has_redemptions_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='promo_redemptions'",
    )
    .fetch_optional(pool)
    .await?;
    if has_redemptions_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/002_promo_redemptions.sql"))
            .await
            .context("Migration 002 failed")?;
    }

    // Migration 003: Special requests on guest bookings
    let has_special_requests: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM pragma_table_info('bookings') WHERE name = 'special_requests'",
    )
    .fetch_optional(pool)
    .await?;
    if has_special_requests.is_none() {
        execute_sql(pool, include_str!("../../migrations/003_booking_notes.sql"))
            .await
            .context("Migration 003 failed")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init(dir.path()).await.unwrap();
        pool.close().await;

        // Second start must not re-apply additive migrations
        let pool = init(dir.path()).await.unwrap();
        let settings: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM loyalty_settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(settings.0, 1);

        let pages: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM content_pages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(pages.0, ContentPageKind::ALL.len() as i64);
    }
}
