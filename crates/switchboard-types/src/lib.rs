//! Shared types for Switchboard.
//!
//! This crate contains the value types passed across the mediator framework:
//! the `Notification` being broadcast, the `ViewConfig` controlling delivery,
//! and the error and fault types surfaced to applications.
//!
//! Zero framework dependencies -- only serde, serde_json, toml, thiserror.

pub mod config;
pub mod error;
pub mod notification;

pub use config::ViewConfig;
pub use error::{ConfigError, DispatchError, FaultCause, FaultStage, HandlerFault};
pub use notification::Notification;
