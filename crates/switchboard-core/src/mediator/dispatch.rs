//! A mediator assembled from a table of per-notification handlers.
//!
//! Instead of one `handle_notification` that branches on the notification
//! name, `DispatchMediator` keeps a map from name to handler closure. Its
//! interest list is the table's keys, in the order they were added.

use std::collections::HashMap;

use switchboard_types::Notification;
use tracing::trace;

use super::{Mediator, MediatorCore};
use crate::view::View;

type NotificationHandler<V> =
    Box<dyn Fn(&MediatorCore<V>, &Notification, &View) -> anyhow::Result<()> + Send + Sync>;

type LifecycleHook<V> = Box<dyn Fn(&MediatorCore<V>, &View) -> anyhow::Result<()> + Send + Sync>;

/// Mediator whose behavior is a name-keyed handler table.
///
/// Build one with [`DispatchMediator::builder`]:
///
/// ```
/// use std::sync::Arc;
/// use switchboard_core::{DispatchMediator, MediatorCore, View};
/// use switchboard_types::Notification;
///
/// let mediator = DispatchMediator::builder(MediatorCore::new("status", String::new()))
///     .on("user.login", |core, note, _view| {
///         core.with_view(|label| *label = format!("hello from {}", note.name()));
///         Ok(())
///     })
///     .build();
///
/// let view = View::new();
/// view.register_mediator(Arc::new(mediator));
/// view.notify_observers(&Notification::new("user.login")).unwrap();
/// ```
pub struct DispatchMediator<V> {
    core: MediatorCore<V>,
    interests: Vec<String>,
    handlers: HashMap<String, NotificationHandler<V>>,
    on_register: Option<LifecycleHook<V>>,
    on_remove: Option<LifecycleHook<V>>,
}

impl<V> DispatchMediator<V> {
    pub fn builder(core: MediatorCore<V>) -> DispatchMediatorBuilder<V> {
        DispatchMediatorBuilder {
            mediator: DispatchMediator {
                core,
                interests: Vec::new(),
                handlers: HashMap::new(),
                on_register: None,
                on_remove: None,
            },
        }
    }

    /// The name and view handle this mediator coordinates.
    pub fn core(&self) -> &MediatorCore<V> {
        &self.core
    }
}

impl<V: Send + 'static> Mediator for DispatchMediator<V> {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn notification_interests(&self) -> Vec<String> {
        self.interests.clone()
    }

    fn handle_notification(&self, notification: &Notification, view: &View) -> anyhow::Result<()> {
        match self.handlers.get(notification.name()) {
            Some(handler) => handler(&self.core, notification, view),
            None => {
                trace!(
                    mediator = %self.core.name(),
                    notification = %notification.name(),
                    "no handler for notification"
                );
                Ok(())
            }
        }
    }

    fn on_register(&self, view: &View) -> anyhow::Result<()> {
        match &self.on_register {
            Some(hook) => hook(&self.core, view),
            None => Ok(()),
        }
    }

    fn on_remove(&self, view: &View) -> anyhow::Result<()> {
        match &self.on_remove {
            Some(hook) => hook(&self.core, view),
            None => Ok(()),
        }
    }
}

impl<V> std::fmt::Debug for DispatchMediator<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMediator")
            .field("name", &self.core.name())
            .field("interests", &self.interests)
            .finish()
    }
}

/// Builder for [`DispatchMediator`].
pub struct DispatchMediatorBuilder<V> {
    mediator: DispatchMediator<V>,
}

impl<V> DispatchMediatorBuilder<V> {
    /// Handle notifications named `name` with `handler`.
    ///
    /// Adding a second handler for the same name replaces the first.
    pub fn on<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&MediatorCore<V>, &Notification, &View) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        if !self.mediator.handlers.contains_key(&name) {
            self.mediator.interests.push(name.clone());
        }
        self.mediator.handlers.insert(name, Box::new(handler));
        self
    }

    pub fn on_register<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MediatorCore<V>, &View) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.mediator.on_register = Some(Box::new(hook));
        self
    }

    pub fn on_remove<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MediatorCore<V>, &View) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.mediator.on_remove = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> DispatchMediator<V> {
        self.mediator
    }
}
