//! Postgres connection pool.
//!
//! Only used when `DATABASE_URL` is set; otherwise users are kept in memory.

use anyhow::Context as _;
use sales_config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Connects to the configured database and applies pending migrations.
pub async fn init_db_pool(config: &DatabaseConfig) -> anyhow::Result<Option<PgPool>> {
    let Some(url) = config.url.as_deref() else {
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!(max_connections = config.max_connections, "database ready");
    Ok(Some(pool))
}
