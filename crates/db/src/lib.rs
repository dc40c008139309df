//! Postgres connection pool factory and module migration runner.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use bookstore_kernel::settings::DatabaseSettings;

pub mod migrate;
mod module;

pub use migrate::run_migrations;
pub use module::DatabaseModule;

/// Build connection options from settings without touching the network.
pub fn connect_options(settings: &DatabaseSettings) -> anyhow::Result<PgConnectOptions> {
    let ssl_mode = PgSslMode::from_str(&settings.ssl_mode)
        .with_context(|| format!("invalid database ssl_mode '{}'", settings.ssl_mode))?;

    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .database(&settings.name)
        .ssl_mode(ssl_mode);

    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }

    Ok(options)
}

fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
}

/// Open the process-wide pool and verify the store is reachable.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "bookstore-db",
        host = %settings.host,
        port = settings.port,
        database = %settings.name,
        "connecting to postgres"
    );

    let pool = pool_options(settings)
        .connect_with(connect_options(settings)?)
        .await
        .with_context(|| {
            format!(
                "failed connecting to database at {}:{}",
                settings.host, settings.port
            )
        })?;

    Ok(pool)
}

/// Create the pool without opening a connection; the first query connects.
pub fn connect_lazy(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    Ok(pool_options(settings).connect_lazy_with(connect_options(settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_options_follow_settings() {
        let settings = DatabaseSettings {
            host: "db.internal".to_string(),
            port: 6543,
            name: "library".to_string(),
            user: "reader".to_string(),
            password: "secret".to_string(),
            ssl_mode: "require".to_string(),
            ..DatabaseSettings::default()
        };

        let options = connect_options(&settings).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "reader");
        assert_eq!(options.get_database(), Some("library"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
    }

    #[test]
    fn unknown_ssl_mode_is_rejected() {
        let settings = DatabaseSettings {
            ssl_mode: "sometimes".to_string(),
            ..DatabaseSettings::default()
        };

        let err = connect_options(&settings).unwrap_err();
        assert!(err.to_string().contains("ssl_mode"));
    }
}
