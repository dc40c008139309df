pub mod books;

use bookstore_kernel::{settings::Settings, ModuleRegistry};
use sqlx::PgPool;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &PgPool, settings: &Settings) {
    registry.register_custom(books::create_module(pool.clone(), &settings.books));
}
