use anyhow::{Context as _, Result};
use sqlx::SqlitePool;

use crate::{
    core::time::{DateTime, Duration},
    thermostat::domain::Sample,
};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS runtime_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thermostat TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        runtime REAL NOT NULL,
        temp_change REAL NOT NULL,
        current_temp REAL NOT NULL,
        outdoor_temp REAL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS temp_change_rate (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thermostat TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        rate REAL NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_runtime_data_timestamp ON runtime_data(thermostat, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_temp_change_rate_timestamp ON temp_change_rate(thermostat, timestamp)",
];

/// Persisted cooling cycles of one thermostat.
///
/// Timestamps are stored as epoch milliseconds. Several thermostats can share a database, rows are
/// told apart by the thermostat id.
#[derive(Debug, Clone)]
pub struct SampleStore {
    pool: SqlitePool,
    thermostat: String,
}

impl SampleStore {
    pub fn new(pool: SqlitePool, thermostat: impl Into<String>) -> Self {
        Self {
            pool,
            thermostat: thermostat.into(),
        }
    }

    pub async fn create_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Error creating sample store schema")?;
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, fields(thermostat = %self.thermostat))]
    pub async fn append(&self, sample: &Sample) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO runtime_data (thermostat, timestamp, runtime, temp_change, current_temp, outdoor_temp)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&self.thermostat)
        .bind(sample.timestamp.millis())
        .bind(sample.runtime_minutes)
        .bind(sample.temperature_delta)
        .bind(sample.end_temperature)
        .bind(sample.outdoor_temperature)
        .execute(&mut *tx)
        .await
        .context("Error inserting cycle sample")?;

        if let Some(rate) = sample.rate() {
            sqlx::query("INSERT INTO temp_change_rate (thermostat, timestamp, rate) VALUES (?, ?, ?)")
                .bind(&self.thermostat)
                .bind(rate.timestamp.millis())
                .bind(rate.rate_minutes_per_degree)
                .execute(&mut *tx)
                .await
                .context("Error inserting rate sample")?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Stored cycle sample: {:.2} min, delta {:.2}",
            sample.runtime_minutes,
            sample.temperature_delta
        );

        Ok(())
    }

    /// Mean runtime in minutes of the cycles completed within `window`. `None` without samples.
    pub async fn average_runtime(&self, window: Duration) -> Result<Option<f64>> {
        let since = DateTime::now() - window;

        sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(runtime) FROM runtime_data WHERE thermostat = ? AND timestamp > ?",
        )
        .bind(&self.thermostat)
        .bind(since.millis())
        .fetch_one(&self.pool)
        .await
        .context("Error calculating average runtime")
    }

    /// Mean minutes per degree of the cycles completed within `window`. `None` without samples.
    pub async fn average_rate(&self, window: Duration) -> Result<Option<f64>> {
        let since = DateTime::now() - window;

        sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(rate) FROM temp_change_rate WHERE thermostat = ? AND timestamp > ?",
        )
        .bind(&self.thermostat)
        .bind(since.millis())
        .fetch_one(&self.pool)
        .await
        .context("Error calculating average temperature change rate")
    }

    /// Deletes samples older than `retention` and returns the number of removed rows.
    #[tracing::instrument(skip_all, fields(thermostat = %self.thermostat))]
    pub async fn prune(&self, retention: Duration) -> Result<u64> {
        let cutoff = DateTime::now() - retention;
        let mut tx = self.pool.begin().await?;

        let samples = sqlx::query("DELETE FROM runtime_data WHERE thermostat = ? AND timestamp < ?")
            .bind(&self.thermostat)
            .bind(cutoff.millis())
            .execute(&mut *tx)
            .await
            .context("Error pruning cycle samples")?
            .rows_affected();

        let rates = sqlx::query("DELETE FROM temp_change_rate WHERE thermostat = ? AND timestamp < ?")
            .bind(&self.thermostat)
            .bind(cutoff.millis())
            .execute(&mut *tx)
            .await
            .context("Error pruning rate samples")?
            .rows_affected();

        tx.commit().await?;

        if samples + rates > 0 {
            tracing::info!("Pruned {} cycle samples and {} rate samples before {:?}", samples, rates, cutoff);
        }

        Ok(samples + rates)
    }
}

#[cfg(test)]
impl SampleStore {
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
