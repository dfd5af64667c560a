//! Wiring: store backend, module registry, migrations and the HTTP server.

use anyhow::{bail, Context};
use axum::Router;
use catalog_kernel::{
    settings::{DatabaseSettings, Settings, StoreBackend},
    InitCtx, ModuleRegistry,
};
use sqlx::PgPool;

use crate::{modules, store::RepositoryStore};

/// Open the configured backend. Postgres connections are retried per settings.
pub async fn open_store(settings: &DatabaseSettings) -> anyhow::Result<RepositoryStore> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on shutdown");
            Ok(RepositoryStore::memory())
        }
        StoreBackend::Postgres => {
            let pool = catalog_db::connect(settings).await?;
            Ok(RepositoryStore::postgres(pool))
        }
    }
}

pub fn build_registry(store: &RepositoryStore) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);
    registry
}

/// Full HTTP application over `store`, as served by `run`.
pub fn build_app(store: &RepositoryStore, settings: &Settings) -> anyhow::Result<Router> {
    catalog_http::build_router(&build_registry(store), settings)
}

async fn apply_migrations(pool: &PgPool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations()?;
    let applied = catalog_db::migrate(pool, &migrations)
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Serve until a shutdown signal arrives.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "catalog bootstrap starting"
    );

    let store = open_store(&settings.database).await?;
    let registry = build_registry(&store);

    if let RepositoryStore::Postgres(catalog) = &store {
        if settings.database.run_migrations {
            apply_migrations(catalog.pool(), &registry).await?;
        }
    }

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(
        modules = registry.module_count(),
        store = store.backend_name(),
        "catalog bootstrap complete"
    );

    let served = catalog_http::start_server(&registry, &settings).await;
    registry.stop_modules().await?;
    served
}

/// Apply pending migrations and exit. Returns how many were applied.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    if settings.database.backend != StoreBackend::Postgres {
        bail!("migrations need the postgres backend");
    }

    let pool = catalog_db::connect(&settings.database).await?;
    let store = RepositoryStore::postgres(pool.clone());
    apply_migrations(&pool, &build_registry(&store)).await
}
