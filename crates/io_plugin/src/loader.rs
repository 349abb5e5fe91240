use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use thiserror::Error;

use crate::{console::ConsolePlugin, plugin::IoPlugin};

/// Builds a fresh handle each time its path is resolved.
pub type PluginFactory = Arc<dyn Fn() -> Arc<dyn IoPlugin> + Send + Sync>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no input/output plugin registered for `{}`", .0.display())]
    Unresolved(PathBuf),
}

/// Resolves plugin paths to concrete implementations.
///
/// Plugins are keyed by the path's file stem, so `plugins/console.so`,
/// `console.exe` and plain `console` all resolve to the same factory.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: Arc<DashMap<String, PluginFactory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in plugins pre-registered.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("console", || Arc::new(ConsolePlugin::new()));
        registry
    }

    pub fn register<P, F>(&self, name: &str, factory: F)
    where
        P: IoPlugin + 'static,
        F: Fn() -> Arc<P> + Send + Sync + 'static,
    {
        let factory: PluginFactory = Arc::new(move || {
            let plugin: Arc<dyn IoPlugin> = factory();
            plugin
        });
        self.factories.insert(name.to_string(), factory);
    }

    /// Resolve `path` to a plugin instance.
    pub fn load(&self, path: &Path) -> Result<Arc<dyn IoPlugin>, LoadError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LoadError::Unresolved(path.to_path_buf()))?;
        let factory = self
            .factories
            .get(stem)
            .ok_or_else(|| LoadError::Unresolved(path.to_path_buf()))?;
        Ok((factory.value())())
    }

    /// Names of every registered plugin.
    pub fn names(&self) -> Vec<String> {
        self.factories.iter().map(|kv| kv.key().clone()).collect()
    }
}
