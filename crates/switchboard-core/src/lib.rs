//! Mediator registry and notification dispatch for Switchboard.
//!
//! A `View` stores mediators by name, indexes them by the notification names
//! they declare interest in, and delivers each broadcast notification to every
//! interested mediator. Mediators implement the `Mediator` trait directly or
//! are assembled from a handler table with `DispatchMediator`.
//!
//! This crate depends only on `switchboard-types` plus logging and error
//! crates -- the view components mediators coordinate are generic handles.

pub mod mediator;
pub mod view;

pub use mediator::{DispatchMediator, DispatchMediatorBuilder, Mediator, MediatorCore, DEFAULT_MEDIATOR_NAME};
pub use view::{DeliveryReport, View, Views};
