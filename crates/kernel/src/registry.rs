use anyhow::{anyhow, Context};
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Holds the catalog modules and drives their lifecycle in dependency order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module; registration order breaks ties between independent modules
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// All registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Modules sorted so that every module follows the modules it depends on.
    pub fn ordered(&self) -> anyhow::Result<Vec<Arc<dyn Module>>> {
        for module in &self.modules {
            for dependency in module.depends_on() {
                if self.get_module(dependency).is_none() {
                    return Err(anyhow!(
                        "module '{}' depends on unregistered module '{}'",
                        module.name(),
                        dependency
                    ));
                }
            }
        }

        let mut ordered: Vec<Arc<dyn Module>> = Vec::with_capacity(self.modules.len());
        let mut pending: Vec<&Arc<dyn Module>> = self.modules.iter().collect();

        while !pending.is_empty() {
            let ready = pending.iter().position(|module| {
                module
                    .depends_on()
                    .iter()
                    .all(|dep| ordered.iter().any(|done| done.name() == *dep))
            });

            match ready {
                Some(index) => ordered.push(Arc::clone(pending.remove(index))),
                None => {
                    let names: Vec<_> = pending.iter().map(|m| m.name()).collect();
                    return Err(anyhow!("module dependency cycle among {:?}", names));
                }
            }
        }

        Ok(ordered)
    }

    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.ordered()? {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.ordered()? {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse dependency order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        for module in self.ordered()?.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Migrations of all modules, dependencies first, each module's in declared order
    pub fn collect_migrations(&self) -> anyhow::Result<Vec<(String, Migration)>> {
        let mut migrations = Vec::new();

        for module in self.ordered()? {
            for migration in module.migrations() {
                migrations.push((module.name().to_string(), migration));
            }
        }

        Ok(migrations)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
