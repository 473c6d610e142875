use std::sync::Arc;

use sqlx::SqlitePool;

use crate::admin::AdminGate;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub admin: Arc<AdminGate>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let db = crate::db::connect(&config).await?;
        let admin = Arc::new(AdminGate::new(&config.admin)?);
        Ok(Self {
            db,
            config: Arc::new(config),
            admin,
        })
    }

    /// Fresh in-memory state for tests.
    #[cfg(test)]
    pub async fn fake() -> Self {
        Self::from_config(AppConfig::for_tests())
            .await
            .expect("in-memory state")
    }

    /// State backed by a SQLite file with several pooled connections, for
    /// tests where requests really run side by side. Keep the directory alive
    /// for the duration of the test.
    #[cfg(test)]
    pub async fn fake_on_disk() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = AppConfig {
            database_url: format!("sqlite://{}", dir.path().join("test.db").display()),
            database_max_connections: 4,
            ..AppConfig::for_tests()
        };
        let state = Self::from_config(config).await.expect("on-disk state");
        (state, dir)
    }
}
