use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

/// Database connection pool manager
///
/// Manages the `SQLite` connection pool with WAL mode enabled and creates
/// the schema on first connect.
pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Open (and create if missing) the database at `path`.
    ///
    /// # Configuration
    /// - Journal mode: WAL (Write-Ahead Logging)
    /// - Synchronous: NORMAL (good balance of safety and performance)
    /// - Foreign keys: Enabled
    /// - Busy timeout: 5 seconds
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("failed to create connection pool")?;

        let connection = Self { pool };
        connection.create_schema().await?;
        Ok(connection)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS experiences (
                id TEXT PRIMARY KEY,
                incident_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                strategy TEXT NOT NULL,
                metrics_before TEXT NOT NULL,
                metrics_after TEXT NOT NULL,
                actions_executed TEXT NOT NULL,
                actions_skipped TEXT NOT NULL,
                recovery_time_seconds REAL NOT NULL,
                cost REAL NOT NULL,
                numeric_reward REAL NOT NULL,
                judged_adjustment REAL NOT NULL,
                final_reward REAL NOT NULL,
                service_restored INTEGER NOT NULL,
                explored INTEGER NOT NULL,
                cycle_index INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .context("failed to create experiences table")?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_experiences_type_time
            ON experiences(incident_type, recorded_at)
            ",
        )
        .execute(&self.pool)
        .await
        .context("failed to create experiences index")?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS strategy_records (
                incident_type TEXT NOT NULL,
                strategy TEXT NOT NULL,
                total_uses INTEGER NOT NULL,
                successes INTEGER NOT NULL,
                failures INTEGER NOT NULL,
                total_reward REAL NOT NULL,
                average_reward REAL NOT NULL,
                best_reward REAL NOT NULL,
                worst_reward REAL NOT NULL,
                last_used TEXT NOT NULL,
                PRIMARY KEY (incident_type, strategy)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .context("failed to create strategy_records table")?;

        Ok(())
    }

    /// Close all connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
