//! Bookstore application library
//!
//! Project modules served by the bookstore binary, plus the startup sequence
//! shared with the operator CLI.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookstore_db::DatabaseModule;
use bookstore_kernel::{settings::Settings, ModuleRegistry};
use sqlx::PgPool;

/// Registry with the database core module and every project module.
pub fn build_registry(pool: &PgPool, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_core(Arc::new(DatabaseModule::new(pool.clone())));
    modules::register_all(&mut registry, pool, settings);
    registry
}

/// Apply the migrations contributed by every registered module.
pub async fn migrate(registry: &ModuleRegistry, pool: &PgPool) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = bookstore_db::run_migrations(pool, &migrations)
        .await
        .context("failed to apply migrations")?;

    tracing::info!(applied, total = migrations.len(), "migrations up to date");
    Ok(applied)
}
