//! Observability setup for applications built on Switchboard.
//!
//! Switchboard's crates only emit `tracing` events; this crate installs the
//! subscriber that renders them.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing, LogFormat};
