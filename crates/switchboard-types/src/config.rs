//! Configuration for a `View`.
//!
//! `ViewConfig` is usually embedded in an application's own `config.toml`, or
//! loaded directly with [`ViewConfig::load`]. All fields have defaults, so an
//! empty document is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Runtime knobs for mediator registration and notification delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Maximum nesting of re-entrant broadcasts (a handler notifying, whose
    /// handlers notify, ...). Broadcasts beyond this depth are refused.
    #[serde(default = "default_max_notify_depth")]
    pub max_notify_depth: usize,

    /// Keep panics raised by mediator callbacks as recorded faults. When
    /// false, every mediator still receives the notification, then the first
    /// panic payload is re-raised once the broadcast has completed.
    #[serde(default = "default_catch_panics")]
    pub catch_panics: bool,

    /// Lifecycle-hook faults retained for `View::take_faults`; older ones
    /// are dropped once this many are waiting.
    #[serde(default = "default_max_recorded_faults")]
    pub max_recorded_faults: usize,

    /// Emit a `trace!` event for every individual delivery.
    #[serde(default)]
    pub trace_deliveries: bool,
}

fn default_max_notify_depth() -> usize {
    32
}

fn default_catch_panics() -> bool {
    true
}

fn default_max_recorded_faults() -> usize {
    256
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_notify_depth: default_max_notify_depth(),
            catch_panics: default_catch_panics(),
            max_recorded_faults: default_max_recorded_faults(),
            trace_deliveries: false,
        }
    }
}

impl ViewConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}
