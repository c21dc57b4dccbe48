pub mod models;
mod openapi;
pub mod routes;
pub mod store;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use shelf_kernel::{InitCtx, Migration, Module};

use store::BookStore;

/// Table, field assertions and isbn index for book records. The assertions
/// mirror the model rules in [`models::NewBook`]; `createdAt` is set once on
/// create and `updatedAt` recomputed on every write.
const INIT_MIGRATION: &str = r#"
    DEFINE TABLE book SCHEMAFULL;
    DEFINE FIELD title       ON book TYPE string VALUE string::trim($value) ASSERT $value != "";
    DEFINE FIELD author      ON book TYPE string VALUE string::trim($value) ASSERT $value != "";
    DEFINE FIELD genre       ON book TYPE string VALUE string::uppercase($value)
        ASSERT $value IN ["FICTION", "NON_FICTION", "SCIENCE", "HISTORY", "BIOGRAPHY", "FANTASY"];
    DEFINE FIELD isbn        ON book TYPE string ASSERT string::len($value) IN [10, 13];
    DEFINE FIELD description ON book TYPE string DEFAULT "" VALUE string::trim($value);
    DEFINE FIELD copies      ON book TYPE int ASSERT $value >= 0;
    DEFINE FIELD available   ON book TYPE bool DEFAULT true;
    DEFINE FIELD createdAt   ON book TYPE datetime DEFAULT time::now() READONLY;
    DEFINE FIELD updatedAt   ON book TYPE datetime VALUE time::now();
    DEFINE INDEX book_isbn_unique ON book FIELDS isbn UNIQUE;
"#;

/// The book catalogue: CRUD routes over a [`BookStore`].
pub struct BooksModule {
    store: Arc<dyn BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = self.store.backend(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.store))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::document())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: INIT_MIGRATION,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
