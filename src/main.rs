use anyhow::Context;
use bookstore_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;
    bookstore_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %format!("{}:{}/{}", settings.database.host, settings.database.port, settings.database.name),
        "bookstore starting"
    );

    let pool = bookstore_db::connect(&settings.database).await?;
    let registry = bookstore_app::build_registry(&pool, &settings);
    let ctx = InitCtx::new(&settings);

    registry.init_all(&ctx).await?;
    bookstore_app::migrate(&registry, &pool).await?;
    registry.start_all(&ctx).await?;

    let served =
        bookstore_http::start_server(&registry, &settings, bookstore_http::shutdown_signal()).await;

    // Modules stop (and the pool closes) even when serving failed.
    let stopped = registry.stop_all(&ctx).await;
    served?;
    stopped?;

    tracing::info!("bookstore gracefully stopped");
    Ok(())
}
