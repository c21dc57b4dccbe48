pub mod books;

use std::sync::Arc;

use shelf_kernel::ModuleRegistry;

use books::store::BookStore;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, books: Arc<dyn BookStore>) -> anyhow::Result<()> {
    registry.register(books::create_module(books))?;
    Ok(())
}
