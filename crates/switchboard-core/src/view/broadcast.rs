//! Delivering notifications to interested mediators.
//!
//! A broadcast takes a snapshot of the mediators indexed under the
//! notification's name, then looks each one up again right before delivery.
//! Mediators registered mid-broadcast are not in the snapshot; mediators
//! removed (or replaced) mid-broadcast fail the live lookup and are skipped.
//!
//! Nesting depth is counted per thread, so broadcasts running on other threads
//! against a shared `View` never count toward each other's limit.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic;
use std::sync::Arc;

use switchboard_types::{DispatchError, FaultStage, HandlerFault, Notification};
use tracing::{trace, warn};

use super::fault::isolate;
use super::View;

/// Outcome of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    notification: String,
    delivered: Vec<String>,
    skipped: Vec<String>,
    faults: Vec<HandlerFault>,
}

impl DeliveryReport {
    fn new(notification: &str) -> Self {
        Self {
            notification: notification.to_string(),
            delivered: Vec::new(),
            skipped: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn notification(&self) -> &str {
        &self.notification
    }

    /// Mediators whose handler was invoked, in delivery order. Includes
    /// handlers that faulted.
    pub fn delivered(&self) -> &[String] {
        &self.delivered
    }

    /// Mediators in the snapshot that were removed before their turn.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn faults(&self) -> &[HandlerFault] {
        &self.faults
    }

    /// True when no handler faulted.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Surface the first fault, if any, as an error after the broadcast has
    /// completed.
    pub fn into_result(self) -> Result<Vec<String>, HandlerFault> {
        match self.faults.into_iter().next() {
            Some(fault) => Err(fault),
            None => Ok(self.delivered),
        }
    }
}

thread_local! {
    /// View address -> nesting level of in-flight broadcasts on this thread.
    static NOTIFY_DEPTH: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());
}

/// Decrements this thread's nesting counter for a view when a broadcast ends.
struct DepthGuard {
    view: usize,
}

impl DepthGuard {
    fn enter(view: &View) -> (Self, usize) {
        let key = view as *const View as usize;
        let depth = NOTIFY_DEPTH.with(|depths| {
            let mut depths = depths.borrow_mut();
            let depth = depths.entry(key).or_insert(0);
            *depth += 1;
            *depth
        });
        (Self { view: key }, depth)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        NOTIFY_DEPTH.with(|depths| {
            let mut depths = depths.borrow_mut();
            if let Some(depth) = depths.get_mut(&self.view) {
                *depth -= 1;
                if *depth == 0 {
                    depths.remove(&self.view);
                }
            }
        });
    }
}

impl View {
    /// Deliver `notification` to every registered mediator interested in its
    /// name, in registration order.
    ///
    /// A fault in one mediator's handler never stops delivery to the rest;
    /// faults are logged and collected in the returned report. With
    /// `ViewConfig::catch_panics` off, the first handler panic is re-raised
    /// after every mediator has been reached. The broadcast is refused
    /// outright if it would nest deeper than `ViewConfig::max_notify_depth`
    /// on the calling thread.
    pub fn notify_observers(&self, notification: &Notification) -> Result<DeliveryReport, DispatchError> {
        let _depth = self.enter_broadcast(notification)?;
        let name = notification.name();

        let targets: Vec<(String, u64)> = {
            let state = self.lock_state();
            state
                .interests
                .get(name)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(|n| state.mediators.get(n).map(|e| (n.clone(), e.registration)))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut report = DeliveryReport::new(name);
        let mut first_panic: Option<Box<dyn Any + Send>> = None;
        for (mediator_name, registration) in targets {
            let live = self
                .lock_state()
                .mediators
                .get(&mediator_name)
                .filter(|entry| entry.registration == registration)
                .map(|entry| Arc::clone(&entry.mediator));

            let Some(mediator) = live else {
                trace!(mediator = %mediator_name, notification = %name, "skipping removed mediator");
                report.skipped.push(mediator_name);
                continue;
            };

            if self.config.trace_deliveries {
                trace!(mediator = %mediator_name, notification = %name, "delivering notification");
            }

            let result = isolate(|| mediator.handle_notification(notification, self));
            if let Err(isolated) = result {
                let fault = HandlerFault {
                    mediator: mediator_name.clone(),
                    stage: FaultStage::Notification(name.to_string()),
                    cause: isolated.cause,
                };
                warn!(mediator = %mediator_name, notification = %name, error = %fault, "notification handler faulted");
                report.faults.push(fault);
                if first_panic.is_none() {
                    first_panic = isolated.payload;
                }
            }
            report.delivered.push(mediator_name);
        }

        if let Some(payload) = first_panic.filter(|_| !self.config.catch_panics) {
            panic::resume_unwind(payload);
        }

        Ok(report)
    }

    /// Build a notification and broadcast it.
    pub fn send_notification(
        &self,
        name: impl Into<String>,
        body: Option<serde_json::Value>,
        kind: Option<&str>,
    ) -> Result<DeliveryReport, DispatchError> {
        let mut notification = Notification::new(name);
        if let Some(body) = body {
            notification = notification.with_body(body);
        }
        if let Some(kind) = kind {
            notification = notification.with_kind(kind);
        }
        self.notify_observers(&notification)
    }

    fn enter_broadcast(&self, notification: &Notification) -> Result<DepthGuard, DispatchError> {
        let (guard, depth) = DepthGuard::enter(self);
        let max = self.config.max_notify_depth;
        if depth > max {
            warn!(notification = %notification.name(), depth, max, "notification nesting limit reached");
            return Err(DispatchError::DepthExceeded {
                notification: notification.name().to_string(),
                depth,
                max,
            });
        }
        Ok(guard)
    }
}
