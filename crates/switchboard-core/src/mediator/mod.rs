//! The mediator capability and helpers for building mediators.
//!
//! - `Mediator` -- the trait the `View` registers, indexes, and notifies
//! - `base` -- `MediatorCore`, a name plus an exclusively-owned view handle
//! - `dispatch` -- `DispatchMediator`, a mediator driven by a name-to-handler table

pub mod base;
pub mod dispatch;

pub use base::MediatorCore;
pub use dispatch::{DispatchMediator, DispatchMediatorBuilder};

use switchboard_types::Notification;

use crate::view::View;

/// Well-known name for a mediator that does not need a dynamic identity.
///
/// Only one mediator registered under this name can live in a `View` at a
/// time; registering another replaces it.
pub const DEFAULT_MEDIATOR_NAME: &str = "Mediator";

/// A named unit that coordinates one view component with the rest of the
/// application through notifications.
///
/// The `View` depends only on this trait. Every callback receives the `View`
/// that invoked it so implementations can register, remove, or notify
/// re-entrantly. Callbacks take `&self`; mediators keep mutable state behind
/// their own synchronization (see [`MediatorCore`]).
///
/// Errors returned from callbacks are faults local to this mediator: they are
/// logged and reported, and never stop delivery to other mediators.
pub trait Mediator: Send + Sync {
    /// Identity of this mediator, unique within one `View`.
    fn name(&self) -> &str;

    /// Notification names this mediator wants delivered to it.
    ///
    /// Queried once at registration; the result is fixed until removal.
    fn notification_interests(&self) -> Vec<String> {
        Vec::new()
    }

    /// Called once per delivered notification whose name is in the interest
    /// list.
    fn handle_notification(&self, _notification: &Notification, _view: &View) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once after the mediator has been indexed.
    fn on_register(&self, _view: &View) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once after the mediator has been erased from the index.
    fn on_remove(&self, _view: &View) -> anyhow::Result<()> {
        Ok(())
    }
}
