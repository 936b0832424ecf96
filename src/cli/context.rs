//! Shared wiring for commands that touch the database.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::adapters::sqlite::{
    database_url, initialize_database, verify_connection, PoolConfig, SqliteReportRepository, SqliteVisitRepository,
};
use crate::domain::models::Config;

pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
}

impl AppContext {
    /// Open the configured database, applying pending migrations.
    pub async fn open(config: Config) -> Result<Self> {
        let url = database_url(&config.database.path);
        let pool = initialize_database(&url, Some(PoolConfig::from(&config.database)))
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;
        verify_connection(&pool).await.context("Database is not responding")?;
        Ok(Self { config, pool })
    }

    pub fn visits(&self) -> Arc<SqliteVisitRepository> {
        Arc::new(SqliteVisitRepository::new(self.pool.clone()))
    }

    pub fn reports(&self) -> Arc<SqliteReportRepository> {
        Arc::new(SqliteReportRepository::new(self.pool.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::domain::ports::{ReportStore, VisitStore};

    #[tokio::test]
    async fn test_open_creates_and_migrates_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("data").join("salon.db").to_string_lossy().into_owned();

        let ctx = AppContext::open(config).await.unwrap();
        assert!(dir.path().join("data").join("salon.db").exists());
        assert!(ctx.visits().get_visit(Uuid::new_v4()).await.unwrap().is_none());
        assert!(ctx.reports().find_latest_report(Uuid::new_v4()).await.unwrap().is_none());
    }
}
