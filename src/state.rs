use std::sync::Arc;

use learnhub_config::{
    AppConfig, CorsConfig, DatabaseConfig, JwtConfig, RateLimitConfig, UploadConfig,
};
use learnhub_core::{FileStorage, LocalFileStorage};
use learnhub_db::init_db_pool;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::middleware::rate_limit::IpRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub upload_config: UploadConfig,
    pub storage: Arc<dyn FileStorage>,
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &self.jwt_config)
            .field("cors_config", &self.cors_config)
            .field("rate_limit_config", &self.rate_limit_config)
            .field("upload_config", &self.upload_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(db: PgPool, config: &AppConfig) -> Self {
        let storage = LocalFileStorage::with_max_size(
            config.upload.root_dir.clone(),
            config.upload.public_prefix.clone(),
            config.upload.max_file_size,
        );

        Self {
            db,
            jwt_config: config.jwt.clone(),
            cors_config: config.cors.clone(),
            rate_limit_config: config.rate_limit.clone(),
            upload_config: config.upload.clone(),
            storage: Arc::new(storage),
            rate_limiter: Arc::new(IpRateLimiter::new(&config.rate_limit)),
        }
    }
}

pub async fn init_app_state(config: &AppConfig) -> Result<AppState, sqlx::Error> {
    let db = init_db_pool(&config.database).await?;
    Ok(AppState::new(db, config))
}

/// State over a pool that never connects until a query runs. Routes rejected
/// by authentication or validation can be exercised without a database.
pub fn lazy_app_state(config: &AppConfig) -> Result<AppState, sqlx::Error> {
    let db = lazy_pool(&config.database)?;
    Ok(AppState::new(db, config))
}

fn lazy_pool(database: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect_lazy(&database.url)
}
