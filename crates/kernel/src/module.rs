use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Borrowed view of process state handed to modules during startup.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

impl<'a> InitCtx<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

/// A single forward-only schema change owned by a module.
///
/// `id` must sort lexically in application order within its module
/// (`001_create_books`, `002_...`). `up` may hold several statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A unit of the service: owns its routes, schema and lifecycle hooks.
///
/// Hooks run in this order: `init`, migrations, `start`, serving, `stop`.
#[async_trait]
pub trait Module: Sync + Send {
    /// Stable name, used in logs and as the migration namespace.
    fn name(&self) -> &'static str;

    /// Verify dependencies before any migration runs.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes merged into the root router; paths are absolute.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI 3 fragment with `paths` and `components.schemas`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release resources. Called once the HTTP server has drained.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
