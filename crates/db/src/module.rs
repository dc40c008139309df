use async_trait::async_trait;
use sqlx::PgPool;

use bookstore_kernel::{InitCtx, Module};

/// Core module that owns the pool lifecycle: checked on init, closed on stop.
pub struct DatabaseModule {
    pool: PgPool,
}

impl DatabaseModule {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        tracing::info!(
            target: "bookstore-db",
            database = %ctx.settings.database.name,
            connections = self.pool.size(),
            "database reachable"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        tracing::info!(target: "bookstore-db", "database pool closed");
        Ok(())
    }
}
