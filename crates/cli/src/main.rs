use anyhow::Context;
use bookstore_kernel::{settings::Settings, InitCtx};
use clap::{Parser, Subcommand};

/// Operator tooling for the bookstore service.
#[derive(Debug, Parser)]
#[command(name = "bookstore-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending module migrations and exit.
    Migrate,
    /// Print the resolved settings with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;
    bookstore_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Migrate => migrate(&settings).await,
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings.redacted())
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let pool = bookstore_db::connect(&settings.database).await?;
    let registry = bookstore_app::build_registry(&pool, settings);
    let ctx = InitCtx::new(settings);

    registry.init_all(&ctx).await?;
    let applied = bookstore_app::migrate(&registry, &pool).await;
    registry.stop_all(&ctx).await?;

    tracing::info!(applied = applied?, "migrate finished");
    Ok(())
}
