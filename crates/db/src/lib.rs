//! SurrealDB connection factory and migration runner.

use anyhow::Context;
use serde::Deserialize;
use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::Migration;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

/// Shared database handle. Cloning is cheap; clones share one connection.
pub type Db = Surreal<Any>;

/// Table recording which migrations have been applied.
const LEDGER_TABLE: &str = "_migration";

/// Connect to the configured endpoint, sign in when credentials are set and
/// select the namespace and database.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Db> {
    tracing::info!(
        target: "shelf-db",
        endpoint = %settings.endpoint,
        namespace = %settings.namespace,
        database = %settings.database,
        "connecting to SurrealDB"
    );

    let db = any::connect(settings.endpoint.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", settings.endpoint))?;

    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        db.signin(Root {
            username: username.as_str(),
            password: password.as_str(),
        })
        .await
        .context("failed to sign in to SurrealDB")?;
    }

    db.use_ns(settings.namespace.as_str())
        .use_db(settings.database.as_str())
        .await
        .context("failed to select namespace/database")?;

    Ok(db)
}

#[derive(Debug, Deserialize)]
struct LedgerEntry {
    module: String,
}

/// Ledger key for a module migration, e.g. `books__001_init`.
pub fn ledger_key(module: &str, migration: &Migration) -> String {
    format!("{}__{}", module, migration.id)
}

/// Apply every migration not yet recorded in the ledger, in the order given.
///
/// Returns the number of migrations applied by this call.
pub async fn migrate(db: &Db, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    db.query(format!("DEFINE TABLE IF NOT EXISTS {LEDGER_TABLE} SCHEMALESS;"))
        .await
        .and_then(|response| response.check())
        .context("failed to prepare migration ledger")?;

    let mut applied = 0;

    for (module, migration) in migrations {
        let key = ledger_key(module, migration);

        let mut response = db
            .query("SELECT module FROM type::thing($table, $key)")
            .bind(("table", LEDGER_TABLE))
            .bind(("key", key.clone()))
            .await
            .with_context(|| format!("failed to read ledger entry '{key}'"))?;
        let existing: Vec<LedgerEntry> = response
            .take(0)
            .with_context(|| format!("failed to decode ledger entry '{key}'"))?;

        if let Some(entry) = existing.first() {
            tracing::debug!(
                target: "shelf-db",
                module = %entry.module,
                migration = migration.id,
                "migration already applied"
            );
            continue;
        }

        tracing::info!(target: "shelf-db", %module, migration = migration.id, "applying migration");

        db.query(migration.up)
            .await
            .and_then(|response| response.check())
            .with_context(|| format!("migration '{key}' failed"))?;

        db.query("CREATE type::thing($table, $key) SET module = $module, migration = $migration, applied_at = time::now()")
            .bind(("table", LEDGER_TABLE))
            .bind(("key", key.clone()))
            .bind(("module", module.clone()))
            .bind(("migration", migration.id))
            .await
            .and_then(|response| response.check())
            .with_context(|| format!("failed to record migration '{key}'"))?;

        applied += 1;
    }

    tracing::info!(target: "shelf-db", applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}
