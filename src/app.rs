//! Application bootstrap shared by the `shelf-app` and `shelf` binaries.

use std::sync::Arc;

use anyhow::Context;
use shelf_db::Db;
use shelf_kernel::{
    settings::{DatabaseSettings, Settings, StorageBackend},
    InitCtx, ModuleRegistry,
};

use crate::modules::{
    self,
    books::store::{BookStore, MemoryBookStore, SurrealBookStore},
};

/// The book store chosen by configuration, plus the database handle when
/// the store is backed by SurrealDB.
pub struct Storage {
    pub books: Arc<dyn BookStore>,
    pub db: Option<Db>,
}

impl Storage {
    pub async fn open(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        match settings.backend {
            StorageBackend::Surreal => {
                let db = shelf_db::connect(settings).await?;
                Ok(Self {
                    books: Arc::new(SurrealBookStore::new(db.clone())),
                    db: Some(db),
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("using the in-memory book store; records are lost on exit");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            books: Arc::new(MemoryBookStore::new()),
            db: None,
        }
    }
}

pub fn build_registry(storage: &Storage) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Arc::clone(&storage.books))
        .context("failed to register modules")?;
    Ok(registry)
}

async fn apply_migrations(registry: &ModuleRegistry, storage: &Storage) -> anyhow::Result<usize> {
    match &storage.db {
        Some(db) => shelf_db::migrate(db, &registry.collect_migrations())
            .await
            .context("failed to apply migrations"),
        None => {
            tracing::debug!("no database configured; skipping migrations");
            Ok(0)
        }
    }
}

/// Connect, migrate and serve until shutdown, then stop every module.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        db = %settings.database.endpoint,
        "shelf bootstrap starting"
    );

    let storage = Storage::open(&settings.database).await?;
    let registry = build_registry(&storage)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    apply_migrations(&registry, &storage).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("shelf bootstrap complete");

    let served = shelf_http::start_server(&registry, &settings).await;
    let stopped = registry.stop_modules().await;

    served?;
    stopped
}

/// Apply pending migrations and return how many ran.
pub async fn migrate(settings: Settings) -> anyhow::Result<usize> {
    if settings.database.backend == StorageBackend::Memory {
        anyhow::bail!("the memory backend has no schema to migrate");
    }

    let storage = Storage::open(&settings.database).await?;
    let registry = build_registry(&storage)?;
    apply_migrations(&registry, &storage).await
}
