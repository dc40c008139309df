use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Core modules are driven in this order; stopping walks it in reverse.
const CORE_MODULE_ORDER: &[&str] = &[
    "db", // Connection pool
];

/// Lifecycle hook run across a set of modules.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Init,
    Start,
    Stop,
}

impl Phase {
    fn verb(self) -> &'static str {
        match self {
            Phase::Init => "initialize",
            Phase::Start => "start",
            Phase::Stop => "stop",
        }
    }

    async fn run(self, module: &dyn Module, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        match self {
            Phase::Init => module.init(ctx).await,
            Phase::Start => module.start(ctx).await,
            Phase::Stop => module.stop().await,
        }
    }
}

/// Holds the service's modules and drives their lifecycle.
///
/// Core modules (infrastructure such as the database) come up before custom
/// modules and go down after them.
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// All registered modules, core first.
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .chain(self.custom_modules.iter())
            .collect()
    }

    /// Core modules in `CORE_MODULE_ORDER`; unlisted core modules are skipped.
    fn ordered_core(&self) -> Vec<&Arc<dyn Module>> {
        CORE_MODULE_ORDER
            .iter()
            .filter_map(|&name| self.core_modules.iter().find(|m| m.name() == name))
            .collect()
    }

    async fn drive(
        modules: Vec<&Arc<dyn Module>>,
        phase: Phase,
        ctx: &InitCtx<'_>,
    ) -> anyhow::Result<()> {
        for module in modules {
            tracing::info!(module = module.name(), "{} module", phase.verb());

            phase
                .run(module.as_ref(), ctx)
                .await
                .with_context(|| format!("failed to {} module '{}'", phase.verb(), module.name()))?;
        }

        Ok(())
    }

    /// Initialize core modules in order, then custom modules.
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Self::drive(self.ordered_core(), Phase::Init, ctx).await?;
        Self::drive(self.custom_modules.iter().collect(), Phase::Init, ctx).await
    }

    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Self::drive(self.ordered_core(), Phase::Start, ctx).await?;
        Self::drive(self.custom_modules.iter().collect(), Phase::Start, ctx).await
    }

    /// Stop custom modules in reverse registration order, then core modules
    /// in reverse `CORE_MODULE_ORDER`. Every module is stopped even if an
    /// earlier one fails; the first error is returned.
    pub async fn stop_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let mut first_error = None;

        let custom = self.custom_modules.iter().rev();
        let core = self.ordered_core().into_iter().rev();
        for module in custom.chain(core) {
            if let Err(err) = Self::drive(vec![module], Phase::Stop, ctx).await {
                tracing::error!(module = module.name(), error = ?err, "module failed to stop");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Migrations from every module, tagged with the owning module name and
    /// sorted by module name then migration id.
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations: Vec<(String, Migration)> = self
            .modules()
            .into_iter()
            .flat_map(|module| {
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (module.name().to_string(), migration))
            })
            .collect();

        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));

        migrations
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
