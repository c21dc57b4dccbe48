use async_trait::async_trait;
use axum::Router;

/// Context handed to modules during `init` and `start`.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// A SurrealQL migration contributed by a module.
///
/// `id` must be unique within its module; ids are applied in lexical order.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Contract every Shelf module implements.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name; also the mount point under `/api/{name}`.
    fn name(&self) -> &'static str;

    /// Called during startup, before migrations run.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes served by this module, mounted under `/api/{name}`.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` and `components.schemas`) merged into the
    /// server document. Paths are relative to the module mount point.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called once migrations have been applied.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during shutdown, after the HTTP server has stopped.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
