//! The View: mediator registry and notification broadcaster.
//!
//! - `registry` -- registering, retrieving, and removing mediators by name
//! - `broadcast` -- delivering notifications to interested mediators
//! - `fault` -- isolating mediator callbacks from one another
//! - `instances` -- `Views`, a keyed set of independent `View`s
//!
//! All registry state lives behind one mutex that is never held while a
//! mediator callback runs, so callbacks may re-enter the `View` freely.

pub mod broadcast;
mod fault;
pub mod instances;
pub mod registry;

pub use broadcast::DeliveryReport;
pub use instances::Views;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use switchboard_types::{HandlerFault, ViewConfig};

use crate::mediator::Mediator;

/// Registry of mediators indexed by the notifications they are interested in.
///
/// Mediators are stored as `Arc<dyn Mediator>`; the `View` hands each
/// callback a reference to itself so handlers can register, remove, and
/// notify from inside a broadcast.
pub struct View {
    config: ViewConfig,
    state: Mutex<RegistryState>,
    /// Faults raised by `on_register` / `on_remove`, drained by `take_faults`.
    /// Holds at most `ViewConfig::max_recorded_faults`, oldest dropped first.
    faults: Mutex<Vec<HandlerFault>>,
}

/// A registered mediator with the interests it declared at registration.
struct Entry {
    mediator: Arc<dyn Mediator>,
    interests: Vec<String>,
    /// Distinguishes successive registrations under the same name.
    registration: u64,
}

#[derive(Default)]
struct RegistryState {
    mediators: HashMap<String, Entry>,
    /// Mediator names in registration order.
    order: Vec<String>,
    /// Notification name -> interested mediator names, in registration order.
    interests: HashMap<String, Vec<String>>,
    next_registration: u64,
}

impl RegistryState {
    /// Erase a mediator from the map, the order list, and every interest list.
    fn detach(&mut self, name: &str) -> Option<Entry> {
        let entry = self.mediators.remove(name)?;
        self.order.retain(|n| n != name);
        for interest in &entry.interests {
            if let Some(names) = self.interests.get_mut(interest) {
                names.retain(|n| n != name);
                if names.is_empty() {
                    self.interests.remove(interest);
                }
            }
        }
        Some(entry)
    }

    fn attach(&mut self, mediator: Arc<dyn Mediator>, interests: Vec<String>) -> u64 {
        let name = mediator.name().to_string();
        let registration = self.next_registration;
        self.next_registration += 1;

        for interest in &interests {
            self.interests
                .entry(interest.clone())
                .or_default()
                .push(name.clone());
        }
        self.order.push(name.clone());
        self.mediators.insert(
            name,
            Entry {
                mediator,
                interests,
                registration,
            },
        );
        registration
    }
}

impl View {
    /// Create an empty view with default configuration.
    pub fn new() -> Self {
        Self::with_config(ViewConfig::default())
    }

    pub fn with_config(config: ViewConfig) -> Self {
        Self {
            config,
            state: Mutex::new(RegistryState::default()),
            faults: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Drain faults raised by lifecycle hooks since the last call.
    ///
    /// Only the most recent `ViewConfig::max_recorded_faults` are kept, so a
    /// long-lived view that is never drained does not grow without bound.
    pub fn take_faults(&self) -> Vec<HandlerFault> {
        std::mem::take(&mut *self.faults.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_fault(&self, fault: HandlerFault) {
        let max = self.config.max_recorded_faults;
        if max == 0 {
            return;
        }
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        if faults.len() >= max {
            let excess = faults.len() + 1 - max;
            faults.drain(..excess);
        }
        faults.push(fault);
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("View")
            .field("mediators", &state.order)
            .field("notifications", &state.interests.len())
            .field("config", &self.config)
            .finish()
    }
}
