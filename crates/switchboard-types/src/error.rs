use std::fmt;

use thiserror::Error;

/// Errors raised while loading a `ViewConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {message}")]
    Io { path: String, message: String },

    #[error("invalid config: {0}")]
    Parse(String),
}

/// Errors from a broadcast that was refused as a whole.
///
/// Faults inside individual mediator callbacks are not errors at this level;
/// they are recorded as [`HandlerFault`]s and delivery continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("notification '{notification}' refused at nesting depth {depth} (max {max})")]
    DepthExceeded {
        notification: String,
        depth: usize,
        max: usize,
    },
}

/// Which mediator callback a fault was raised from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultStage {
    Register,
    Remove,
    /// `handle_notification` for the named notification.
    Notification(String),
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultStage::Register => f.write_str("on_register"),
            FaultStage::Remove => f.write_str("on_remove"),
            FaultStage::Notification(name) => write!(f, "handle_notification({name})"),
        }
    }
}

/// How a mediator callback failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultCause {
    #[error("returned error: {0}")]
    Error(String),

    #[error("panicked: {0}")]
    Panic(String),
}

/// A failure local to one mediator callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mediator '{mediator}' faulted in {stage}: {cause}")]
pub struct HandlerFault {
    pub mediator: String,
    pub stage: FaultStage,
    #[source]
    pub cause: FaultCause,
}
