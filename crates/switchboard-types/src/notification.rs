//! The `Notification` value broadcast between mediators.
//!
//! A notification is identified for dispatch purposes by its name alone. The
//! optional body and type tag travel with it untouched; the framework never
//! inspects them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable named event.
///
/// Construct with [`Notification::new`] and attach an optional body or type
/// tag with the `with_*` builders. Once built, fields are only readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<serde_json::Value>,
    /// Secondary tag available to handlers for disambiguation.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

impl Notification {
    /// Create a notification with the given name and no body or type tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: None,
            kind: None,
        }
    }

    /// Attach an opaque payload.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a secondary type tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// The dispatch key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{} ({kind})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
