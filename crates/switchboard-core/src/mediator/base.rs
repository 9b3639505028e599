//! Name and view-handle storage shared by concrete mediators.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::DEFAULT_MEDIATOR_NAME;

/// A mediator's identity plus the view component it exclusively owns.
///
/// The handle sits behind a mutex so mediator callbacks, which take `&self`,
/// can still mutate it. A core without a view is valid.
pub struct MediatorCore<V> {
    name: String,
    view: Mutex<Option<V>>,
}

impl<V> MediatorCore<V> {
    /// Create a core owning `view`.
    pub fn new(name: impl Into<String>, view: V) -> Self {
        Self {
            name: name.into(),
            view: Mutex::new(Some(view)),
        }
    }

    /// Create a core with nothing to coordinate yet.
    pub fn without_view(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            view: Mutex::new(None),
        }
    }

    /// Create a core named [`DEFAULT_MEDIATOR_NAME`].
    pub fn with_default_name(view: V) -> Self {
        Self::new(DEFAULT_MEDIATOR_NAME, view)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_view(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `f` against the view handle, if one is held.
    ///
    /// The handle stays locked while `f` runs. `f` must not call back into
    /// this core's accessors, and must not call into the `View`
    /// (`notify_observers`, `send_notification`, `register_mediator`,
    /// `remove_mediator`): those can re-enter this mediator and deadlock on
    /// the handle. Copy what is needed out of `f` and call the `View` after
    /// it returns.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.lock().as_mut().map(f)
    }

    /// Install a view handle, returning the previous one.
    pub fn set_view(&self, view: V) -> Option<V> {
        self.lock().replace(view)
    }

    /// Release the view handle.
    pub fn take_view(&self) -> Option<V> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<V>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> std::fmt::Debug for MediatorCore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediatorCore")
            .field("name", &self.name)
            .field("has_view", &self.has_view())
            .finish()
    }
}
