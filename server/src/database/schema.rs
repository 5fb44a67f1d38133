//! Database schema and migrations
//!
//! Migrations are embedded SQL scripts applied in version order. Each runs
//! in its own transaction together with its row in `schema_migrations`, so
//! a failed script leaves neither tables nor a version record behind.

use crate::error::{AppError, Result};
use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;

/// One embedded migration script
#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Known migrations, oldest first
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: include_str!("migrations/001_initial_schema.sql"),
}];

/// Bring the database up to the latest schema version
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    let applied = applied_versions(pool).await?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();

    if pending.is_empty() {
        tracing::debug!("Schema up to date ({} migrations)", applied.len());
        return Ok(());
    }

    for migration in pending {
        run_migration(pool, migration).await?;
    }

    Ok(())
}

async fn applied_versions(pool: &SqlitePool) -> Result<HashSet<i64>> {
    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations")
        .fetch_all(pool)
        .await?;

    Ok(versions.into_iter().collect())
}

async fn run_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {:03} ({})",
        migration.version,
        migration.name
    );

    let mut tx = pool.begin().await?;

    for (index, statement) in statements(migration.sql).enumerate() {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::Generic(format!(
                    "Migration {} statement {} failed: {}",
                    migration.name,
                    index + 1,
                    e
                ))
            })?;
    }

    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Split a script into executable statements, dropping `--` comment lines
fn statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|chunk| {
        chunk
            .lines()
            .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_database_creates_tables() {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in ["drafts", "note_tags", "notes", "sessions", "summaries", "tags", "users"] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();

        let recorded: Vec<(i64, String)> =
            sqlx::query_as("SELECT version, name FROM schema_migrations")
                .fetch_all(&pool)
                .await
                .unwrap();

        assert_eq!(recorded, vec![(1, "initial_schema".to_string())]);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();

        let foreign_keys: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(foreign_keys, 1);
    }

    #[tokio::test]
    async fn test_failed_script_is_not_recorded() {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();

        let broken = Migration {
            version: 99,
            name: "broken",
            sql: "CREATE TABLE half_done (id INTEGER); INSERT INTO no_such_table VALUES (1);",
        };
        let err = run_migration(&pool, &broken).await.unwrap_err();
        assert!(err.to_string().contains("broken statement 2"));

        let versions = applied_versions(&pool).await.unwrap();
        assert!(!versions.contains(&99));

        let leftover: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'half_done'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_statements_skip_blanks_and_comments() {
        let sql = "-- users\nCREATE TABLE a (id INTEGER);\n\n;  \n-- trailing note\n";

        let parsed: Vec<&str> = statements(sql).collect();

        assert_eq!(parsed, vec!["-- users\nCREATE TABLE a (id INTEGER)"]);
    }

    #[test]
    fn test_embedded_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();

        assert_eq!(versions, sorted);
        assert!(MIGRATIONS.iter().all(|m| statements(m.sql).count() > 0));
    }
}
