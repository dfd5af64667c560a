use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Schema migration contributed by a module.
///
/// `up` may hold several statements; it is applied inside one transaction.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Lifecycle contract implemented by every catalog module
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name; also the URL segment under `/api/v1/`
    fn name(&self) -> &'static str;

    /// Names of modules that must be initialized (and migrated) first
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    /// Called during application startup, after migrations
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes mounted under `/api/v1/{name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` + `components`) merged into the service document
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Migrations in the order they must run
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
