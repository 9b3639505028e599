//! Keyed `View` instances.
//!
//! Applications that host several independent mediator graphs (one per
//! window or module, say) keep one `View` per key. `Views::global()` provides
//! a process-wide map for applications that do not want to thread one around.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use switchboard_types::ViewConfig;
use tracing::debug;

use super::View;

static GLOBAL: OnceLock<Views> = OnceLock::new();

/// A map from key to independent `View`.
pub struct Views {
    config: ViewConfig,
    instances: DashMap<String, Arc<View>>,
}

impl Views {
    /// Create an empty map whose views use the default configuration.
    pub fn new() -> Self {
        Self::with_config(ViewConfig::default())
    }

    /// Create an empty map whose views are created with `config`.
    pub fn with_config(config: ViewConfig) -> Self {
        Self {
            config,
            instances: DashMap::new(),
        }
    }

    /// The process-wide map, created empty on first use.
    pub fn global() -> &'static Views {
        GLOBAL.get_or_init(Views::new)
    }

    /// Get the view for `key`, creating it on first use.
    pub fn instance(&self, key: &str) -> Arc<View> {
        if let Some(view) = self.instances.get(key) {
            return Arc::clone(view.value());
        }
        let view = self.instances.entry(key.to_string()).or_insert_with(|| {
            debug!(key, "created view instance");
            Arc::new(View::with_config(self.config.clone()))
        });
        Arc::clone(view.value())
    }

    /// Get the view for `key` without creating it.
    pub fn get(&self, key: &str) -> Option<Arc<View>> {
        self.instances.get(key).map(|view| Arc::clone(view.value()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.instances.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.instances.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drop the view for `key`, removing all of its mediators first.
    pub fn remove(&self, key: &str) -> Option<Arc<View>> {
        let (_, view) = self.instances.remove(key)?;
        let removed = view.remove_all();
        debug!(key, mediators = removed.len(), "removed view instance");
        Some(view)
    }
}

impl Default for Views {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Views {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Views")
            .field("instances", &self.instances.len())
            .field("config", &self.config)
            .finish()
    }
}
