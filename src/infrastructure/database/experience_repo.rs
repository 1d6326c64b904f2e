use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::models::{
    Experience, IncidentSeverity, IncidentType, StrategyRecord, SystemMetrics,
};
use crate::domain::ports::{ExperienceRepository, StoreSummary};

/// `SQLite` implementation of [`ExperienceRepository`].
///
/// `append` runs in a single transaction: the raw experience insert and
/// the strategy-record upsert commit together or not at all, which is what
/// upholds the `total_uses == successes + failures` invariant across
/// crashes and cancellations.
pub struct ExperienceRepositoryImpl {
    pool: SqlitePool,
}

impl ExperienceRepositoryImpl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp: {raw}"))?
        .with_timezone(&Utc))
}

fn parse_incident_type(raw: &str) -> Result<IncidentType> {
    IncidentType::parse_str(raw).with_context(|| format!("unknown incident type: {raw}"))
}

fn record_from_row(row: &SqliteRow) -> Result<StrategyRecord> {
    let incident_type: String = row.try_get("incident_type")?;
    let last_used: String = row.try_get("last_used")?;
    Ok(StrategyRecord {
        incident_type: parse_incident_type(&incident_type)?,
        strategy: row.try_get("strategy")?,
        total_uses: row.try_get::<i64, _>("total_uses")? as u64,
        successes: row.try_get::<i64, _>("successes")? as u64,
        failures: row.try_get::<i64, _>("failures")? as u64,
        total_reward: row.try_get("total_reward")?,
        average_reward: row.try_get("average_reward")?,
        best_reward: row.try_get("best_reward")?,
        worst_reward: row.try_get("worst_reward")?,
        last_used: parse_timestamp(&last_used)?,
    })
}

fn experience_from_row(row: &SqliteRow) -> Result<Experience> {
    let id: String = row.try_get("id")?;
    let incident_type: String = row.try_get("incident_type")?;
    let severity: String = row.try_get("severity")?;
    let metrics_before: String = row.try_get("metrics_before")?;
    let metrics_after: String = row.try_get("metrics_after")?;
    let actions_executed: String = row.try_get("actions_executed")?;
    let actions_skipped: String = row.try_get("actions_skipped")?;
    let recorded_at: String = row.try_get("recorded_at")?;

    Ok(Experience {
        id: id.parse::<Uuid>().context("invalid experience id")?,
        incident_type: parse_incident_type(&incident_type)?,
        severity: IncidentSeverity::parse_str(&severity)
            .with_context(|| format!("unknown severity: {severity}"))?,
        metrics_before: serde_json::from_str::<SystemMetrics>(&metrics_before)
            .context("failed to deserialize metrics_before")?,
        strategy_used: row.try_get("strategy")?,
        actions_executed: serde_json::from_str(&actions_executed)
            .context("failed to deserialize actions_executed")?,
        actions_skipped: serde_json::from_str(&actions_skipped)
            .context("failed to deserialize actions_skipped")?,
        metrics_after: serde_json::from_str::<SystemMetrics>(&metrics_after)
            .context("failed to deserialize metrics_after")?,
        recovery_time_seconds: row.try_get("recovery_time_seconds")?,
        cost: row.try_get("cost")?,
        numeric_reward: row.try_get("numeric_reward")?,
        judged_adjustment: row.try_get("judged_adjustment")?,
        final_reward: row.try_get("final_reward")?,
        service_restored: row.try_get::<i64, _>("service_restored")? != 0,
        explored: row.try_get::<i64, _>("explored")? != 0,
        cycle_index: row.try_get::<i64, _>("cycle_index")? as u32,
        recorded_at: parse_timestamp(&recorded_at)?,
    })
}

#[async_trait]
impl ExperienceRepository for ExperienceRepositoryImpl {
    async fn append(&self, experience: &Experience) -> Result<()> {
        let metrics_before = serde_json::to_string(&experience.metrics_before)
            .context("failed to serialize metrics_before")?;
        let metrics_after = serde_json::to_string(&experience.metrics_after)
            .context("failed to serialize metrics_after")?;
        let actions_executed = serde_json::to_string(&experience.actions_executed)
            .context("failed to serialize actions_executed")?;
        let actions_skipped = serde_json::to_string(&experience.actions_skipped)
            .context("failed to serialize actions_skipped")?;

        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        sqlx::query(
            r"
            INSERT INTO experiences (
                id, incident_type, severity, strategy,
                metrics_before, metrics_after, actions_executed, actions_skipped,
                recovery_time_seconds, cost, numeric_reward, judged_adjustment,
                final_reward, service_restored, explored, cycle_index, recorded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(experience.id.to_string())
        .bind(experience.incident_type.as_str())
        .bind(experience.severity.as_str())
        .bind(&experience.strategy_used)
        .bind(metrics_before)
        .bind(metrics_after)
        .bind(actions_executed)
        .bind(actions_skipped)
        .bind(experience.recovery_time_seconds)
        .bind(experience.cost)
        .bind(experience.numeric_reward)
        .bind(experience.judged_adjustment)
        .bind(experience.final_reward)
        .bind(i64::from(experience.service_restored))
        .bind(i64::from(experience.explored))
        .bind(i64::from(experience.cycle_index))
        .bind(experience.recorded_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("failed to insert experience")?;

        let existing = sqlx::query(
            r"
            SELECT incident_type, strategy, total_uses, successes, failures,
                   total_reward, average_reward, best_reward, worst_reward, last_used
            FROM strategy_records
            WHERE incident_type = ? AND strategy = ?
            ",
        )
        .bind(experience.incident_type.as_str())
        .bind(&experience.strategy_used)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to query strategy record")?;

        let mut record = match existing {
            Some(row) => record_from_row(&row)?,
            None => StrategyRecord::new(experience.incident_type, &experience.strategy_used),
        };
        record.record_outcome(
            experience.final_reward,
            experience.service_restored,
            experience.recorded_at,
        );

        sqlx::query(
            r"
            INSERT OR REPLACE INTO strategy_records (
                incident_type, strategy, total_uses, successes, failures,
                total_reward, average_reward, best_reward, worst_reward, last_used
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(record.incident_type.as_str())
        .bind(&record.strategy)
        .bind(record.total_uses as i64)
        .bind(record.successes as i64)
        .bind(record.failures as i64)
        .bind(record.total_reward)
        .bind(record.average_reward)
        .bind(record.best_reward)
        .bind(record.worst_reward)
        .bind(record.last_used.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("failed to upsert strategy record")?;

        tx.commit().await.context("failed to commit experience")?;
        Ok(())
    }

    async fn record_for(
        &self,
        incident_type: IncidentType,
        strategy: &str,
    ) -> Result<Option<StrategyRecord>> {
        let row = sqlx::query(
            r"
            SELECT incident_type, strategy, total_uses, successes, failures,
                   total_reward, average_reward, best_reward, worst_reward, last_used
            FROM strategy_records
            WHERE incident_type = ? AND strategy = ?
            ",
        )
        .bind(incident_type.as_str())
        .bind(strategy)
        .fetch_optional(&self.pool)
        .await
        .context("failed to query strategy record")?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn records_for(&self, incident_type: IncidentType) -> Result<Vec<StrategyRecord>> {
        let rows = sqlx::query(
            r"
            SELECT incident_type, strategy, total_uses, successes, failures,
                   total_reward, average_reward, best_reward, worst_reward, last_used
            FROM strategy_records
            WHERE incident_type = ?
            ORDER BY average_reward DESC
            ",
        )
        .bind(incident_type.as_str())
        .fetch_all(&self.pool)
        .await
        .context("failed to query strategy records")?;

        rows.iter().map(record_from_row).collect()
    }

    async fn best_strategy_for(&self, incident_type: IncidentType) -> Result<Option<String>> {
        let row = sqlx::query(
            r"
            SELECT strategy
            FROM strategy_records
            WHERE incident_type = ? AND total_uses > 0
            ORDER BY average_reward DESC, total_uses ASC, strategy ASC
            LIMIT 1
            ",
        )
        .bind(incident_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("failed to query best strategy")?;

        Ok(row.map(|r| r.try_get("strategy")).transpose()?)
    }

    async fn recent(
        &self,
        incident_type: Option<IncidentType>,
        limit: u32,
    ) -> Result<Vec<Experience>> {
        let rows = match incident_type {
            Some(ty) => {
                sqlx::query(
                    r"
                    SELECT * FROM experiences
                    WHERE incident_type = ?
                    ORDER BY rowid DESC
                    LIMIT ?
                    ",
                )
                .bind(ty.as_str())
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r"
                    SELECT * FROM experiences
                    ORDER BY rowid DESC
                    LIMIT ?
                    ",
                )
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("failed to query experiences")?;

        rows.iter().map(experience_from_row).collect()
    }

    async fn rankings(&self) -> Result<Vec<StrategyRecord>> {
        let rows = sqlx::query(
            r"
            SELECT incident_type, strategy, total_uses, successes, failures,
                   total_reward, average_reward, best_reward, worst_reward, last_used
            FROM strategy_records
            ORDER BY average_reward DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to query rankings")?;

        rows.iter().map(record_from_row).collect()
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM experiences")
            .fetch_one(&self.pool)
            .await
            .context("failed to count experiences")?;
        Ok(row.try_get::<i64, _>("n")? as u64)
    }

    async fn summary(&self) -> Result<StoreSummary> {
        let rows = sqlx::query(
            r"
            SELECT final_reward, service_restored, recovery_time_seconds
            FROM experiences
            ORDER BY rowid ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to query experiences for summary")?;

        let mut summary = StoreSummary::default();
        if rows.is_empty() {
            return Ok(summary);
        }

        let mut rewards = Vec::with_capacity(rows.len());
        let mut recovery_total = 0.0;
        for row in &rows {
            let reward: f64 = row.try_get("final_reward")?;
            let restored: i64 = row.try_get("service_restored")?;
            let recovery: f64 = row.try_get("recovery_time_seconds")?;
            if restored != 0 {
                summary.successes += 1;
            } else {
                summary.failures += 1;
            }
            recovery_total += recovery;
            rewards.push(reward);
        }

        let n = rewards.len();
        summary.total_experiences = n as u64;
        summary.success_rate = summary.successes as f64 / n as f64;
        summary.average_reward = rewards.iter().sum::<f64>() / n as f64;
        summary.best_reward = rewards.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        summary.average_recovery_time = recovery_total / n as f64;

        // Improvement trend: second half vs first half of the reward
        // history; zero until there is a split to compare.
        if n >= 2 {
            let half = n / 2;
            let early = rewards[..half].iter().sum::<f64>() / half as f64;
            let late = rewards[half..].iter().sum::<f64>() / (n - half) as f64;
            summary.improvement_trend = late - early;
        }

        Ok(summary)
    }
}
