use crate::config::AppConfig;
use crate::db;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database).await?;
        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// State backed by a lazily connecting pool, for tests that never reach the database.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{BookingConfig, JwtConfig, ServerConfig};

        let database = crate::config::database_from_parts(
            "localhost",
            "5432",
            "postgres",
            "postgres",
            "posada_test",
        )
        .expect("test options");
        let db = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy_with(database.clone());

        let config = Arc::new(AppConfig {
            database,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            booking: BookingConfig {
                default_nightly_price: 100.0,
            },
        });

        Self::from_parts(db, config)
    }
}
