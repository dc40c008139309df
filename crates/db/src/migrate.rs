//! Applies module-contributed migrations, once each, in collected order.

use anyhow::Context;
use sqlx::PgPool;

use bookstore_kernel::Migration;

const LEDGER_TABLE: &str = "_bookstore_migrations";

const CREATE_LEDGER: &str = r#"
    CREATE TABLE IF NOT EXISTS _bookstore_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (module, id)
    )
"#;

/// Apply every migration not yet recorded in the ledger.
///
/// Each migration runs in its own transaction together with its ledger row,
/// so a failing migration leaves no trace. Returns the number applied.
pub async fn run_migrations(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::raw_sql(CREATE_LEDGER)
        .execute(pool)
        .await
        .with_context(|| format!("failed to create {}", LEDGER_TABLE))?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let already: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM _bookstore_migrations WHERE module = $1 AND id = $2",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to read {}", LEDGER_TABLE))?;

        if already.is_some() {
            tracing::debug!(target: "bookstore-db", module = %module, migration = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;

        sqlx::query("INSERT INTO _bookstore_migrations (module, id) VALUES ($1, $2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record migration {}/{}", module, migration.id))?;

        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration {}/{}", module, migration.id))?;

        tracing::info!(target: "bookstore-db", module = %module, migration = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
