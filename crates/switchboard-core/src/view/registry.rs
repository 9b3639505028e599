//! Registering, retrieving, and removing mediators.

use std::panic;
use std::sync::Arc;

use switchboard_types::{FaultStage, HandlerFault};
use tracing::{debug, warn};

use super::fault::isolate;
use super::View;
use crate::mediator::Mediator;

impl View {
    /// Register a mediator and index its notification interests.
    ///
    /// A mediator already registered under the same name is removed first
    /// (its `on_remove` fires) and returned. The new mediator's interests are
    /// queried once and indexed before its `on_register` fires, so a
    /// notification sent from `on_register` can reach the mediator itself.
    pub fn register_mediator(&self, mediator: Arc<dyn Mediator>) -> Option<Arc<dyn Mediator>> {
        let name = mediator.name().to_string();

        let replaced = self.remove_mediator(&name);
        if replaced.is_some() {
            debug!(mediator = %name, "replacing mediator registered under the same name");
        }

        let interests = dedup(mediator.notification_interests());

        // The old mediator's on_remove may itself have registered this name.
        let displaced = {
            let mut state = self.lock_state();
            let displaced = state.detach(&name);
            state.attach(Arc::clone(&mediator), interests.clone());
            displaced
        };
        if let Some(entry) = displaced {
            debug!(mediator = %name, "displacing mediator registered during replacement");
            self.run_lifecycle(&name, FaultStage::Remove, || entry.mediator.on_remove(self));
        }

        debug!(mediator = %name, interests = ?interests, "registered mediator");
        self.run_lifecycle(&name, FaultStage::Register, || mediator.on_register(self));

        replaced
    }

    /// Look up a registered mediator by name.
    pub fn retrieve_mediator(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        self.lock_state()
            .mediators
            .get(name)
            .map(|entry| Arc::clone(&entry.mediator))
    }

    /// Remove a mediator by name.
    ///
    /// Its interest index entries are erased before `on_remove` fires, so no
    /// notification reaches it once removal has begun. Returns `None` without
    /// side effects if the name is not registered.
    pub fn remove_mediator(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        let entry = self.lock_state().detach(name)?;
        debug!(mediator = %name, "removed mediator");
        self.run_lifecycle(name, FaultStage::Remove, || entry.mediator.on_remove(self));
        Some(entry.mediator)
    }

    pub fn has_mediator(&self, name: &str) -> bool {
        self.lock_state().mediators.contains_key(name)
    }

    /// Names of all registered mediators, in registration order.
    pub fn mediator_names(&self) -> Vec<String> {
        self.lock_state().order.clone()
    }

    /// Names of the mediators currently indexed under a notification name.
    pub fn interested_in(&self, notification: &str) -> Vec<String> {
        self.lock_state()
            .interests
            .get(notification)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock_state().mediators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every registered mediator, most recently registered first.
    ///
    /// Mediators registered by an `on_remove` hook during teardown are left
    /// in place.
    pub fn remove_all(&self) -> Vec<Arc<dyn Mediator>> {
        let names = self.mediator_names();
        names
            .iter()
            .rev()
            .filter_map(|name| self.remove_mediator(name))
            .collect()
    }

    fn run_lifecycle<F>(&self, name: &str, stage: FaultStage, callback: F)
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        if let Err(isolated) = isolate(callback) {
            let fault = HandlerFault {
                mediator: name.to_string(),
                stage,
                cause: isolated.cause,
            };
            warn!(mediator = %name, error = %fault, "mediator lifecycle hook faulted");
            self.record_fault(fault);

            // Registry state is already consistent; re-raise only now.
            if let Some(payload) = isolated.payload.filter(|_| !self.config.catch_panics) {
                panic::resume_unwind(payload);
            }
        }
    }
}

/// Drop repeated names, keeping first occurrences in order.
fn dedup(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use switchboard_types::{FaultCause, Notification, ViewConfig};

    use crate::mediator::{DispatchMediator, MediatorCore, DEFAULT_MEDIATOR_NAME};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Mediator that records every callback into a shared log.
    struct Recorder {
        name: String,
        interests: Vec<String>,
        log: Log,
    }

    impl Recorder {
        fn new(name: &str, interests: &[&str], log: &Log) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                interests: interests.iter().map(|s| s.to_string()).collect(),
                log: Arc::clone(log),
            })
        }

        fn push(&self, event: String) {
            self.log.lock().unwrap().push(event);
        }
    }

    impl Mediator for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn notification_interests(&self) -> Vec<String> {
            self.interests.clone()
        }

        fn handle_notification(&self, notification: &Notification, _view: &View) -> anyhow::Result<()> {
            self.push(format!("{}:{}", self.name, notification.name()));
            Ok(())
        }

        fn on_register(&self, _view: &View) -> anyhow::Result<()> {
            self.push(format!("{}:register", self.name));
            Ok(())
        }

        fn on_remove(&self, _view: &View) -> anyhow::Result<()> {
            self.push(format!("{}:remove", self.name));
            Ok(())
        }
    }

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn register_indexes_interests_and_fires_on_register() {
        let view = View::new();
        let log = new_log();

        let replaced = view.register_mediator(Recorder::new("m", &["a", "b"], &log));

        assert!(replaced.is_none());
        assert!(view.has_mediator("m"));
        assert_eq!(view.interested_in("a"), vec!["m"]);
        assert_eq!(view.interested_in("b"), vec!["m"]);
        assert!(view.interested_in("c").is_empty());
        assert_eq!(entries(&log), vec!["m:register"]);
    }

    #[test]
    fn duplicate_interests_are_indexed_once() {
        let view = View::new();
        let log = new_log();
        view.register_mediator(Recorder::new("m", &["a", "a", "b", "a"], &log));
        assert_eq!(view.interested_in("a"), vec!["m"]);
    }

    #[test]
    fn retrieve_returns_registered_mediator() {
        let view = View::new();
        let log = new_log();
        view.register_mediator(Recorder::new("m", &[], &log));

        let found = view.retrieve_mediator("m").unwrap();
        assert_eq!(found.name(), "m");
        assert!(view.retrieve_mediator("other").is_none());
        // Lookups have no side effects.
        assert_eq!(entries(&log), vec!["m:register"]);
    }

    #[test]
    fn same_name_replaces_and_removes_first() {
        let view = View::new();
        let log = new_log();
        view.register_mediator(Recorder::new("m", &["a"], &log));

        let replaced = view.register_mediator(Recorder::new("m", &["b"], &log));

        assert_eq!(replaced.unwrap().name(), "m");
        assert_eq!(entries(&log), vec!["m:register", "m:remove", "m:register"]);
        assert_eq!(view.len(), 1);
        assert!(view.interested_in("a").is_empty());
        assert_eq!(view.interested_in("b"), vec!["m"]);
    }

    #[test]
    fn remove_erases_index_and_fires_on_remove_once() {
        let view = View::new();
        let log = new_log();
        view.register_mediator(Recorder::new("m", &["a"], &log));

        let removed = view.remove_mediator("m");

        assert_eq!(removed.unwrap().name(), "m");
        assert!(!view.has_mediator("m"));
        assert!(view.interested_in("a").is_empty());
        assert_eq!(entries(&log), vec!["m:register", "m:remove"]);
    }

    #[test]
    fn removing_absent_name_is_a_no_op() {
        let view = View::new();
        let log = new_log();
        view.register_mediator(Recorder::new("m", &["a"], &log));

        assert!(view.remove_mediator("never").is_none());
        assert!(view.remove_mediator("m").is_some());
        assert!(view.remove_mediator("m").is_none());

        assert_eq!(entries(&log), vec!["m:register", "m:remove"]);
    }

    #[test]
    fn index_keeps_registration_order_across_removal() {
        let view = View::new();
        let log = new_log();
        for name in ["m1", "m2", "m3"] {
            view.register_mediator(Recorder::new(name, &["x"], &log));
        }
        view.remove_mediator("m2");
        view.register_mediator(Recorder::new("m2", &["x"], &log));

        assert_eq!(view.interested_in("x"), vec!["m1", "m3", "m2"]);
        assert_eq!(view.mediator_names(), vec!["m1", "m3", "m2"]);
    }

    #[test]
    fn remove_all_tears_down_in_reverse_order() {
        let view = View::new();
        let log = new_log();
        view.register_mediator(Recorder::new("m1", &["x"], &log));
        view.register_mediator(Recorder::new("m2", &["y"], &log));

        let removed = view.remove_all();

        assert_eq!(removed.len(), 2);
        assert!(view.is_empty());
        assert!(view.interested_in("x").is_empty());
        assert_eq!(
            entries(&log),
            vec!["m1:register", "m2:register", "m2:remove", "m1:remove"]
        );
    }

    #[test]
    fn default_name_mediators_collide() {
        let view = View::new();
        let first = DispatchMediator::builder(MediatorCore::with_default_name(1u8)).build();
        let second = DispatchMediator::builder(MediatorCore::with_default_name(2u8)).build();

        view.register_mediator(Arc::new(first));
        view.register_mediator(Arc::new(second));

        assert_eq!(view.mediator_names(), vec![DEFAULT_MEDIATOR_NAME]);
    }

    #[test]
    fn faulting_lifecycle_hooks_are_recorded() {
        let view = View::new();
        let mediator = DispatchMediator::builder(MediatorCore::<()>::without_view("flaky"))
            .on_register(|_, _| anyhow::bail!("listener attach failed"))
            .on_remove(|_, _| panic!("listener detach panicked"))
            .build();

        view.register_mediator(Arc::new(mediator));
        assert!(view.has_mediator("flaky"));
        assert!(view.remove_mediator("flaky").is_some());

        let faults = view.take_faults();
        assert_eq!(faults.len(), 2);
        assert_eq!(faults[0].mediator, "flaky");
        assert_eq!(faults[0].stage, FaultStage::Register);
        assert_eq!(
            faults[0].cause,
            FaultCause::Error("listener attach failed".to_string())
        );
        assert_eq!(faults[1].stage, FaultStage::Remove);
        assert!(matches!(faults[1].cause, FaultCause::Panic(_)));
        assert!(view.take_faults().is_empty());
    }

    #[test]
    fn notification_from_on_remove_does_not_reach_self() {
        let view = View::new();
        let log = new_log();
        let seen = Arc::clone(&log);
        let mediator = DispatchMediator::builder(MediatorCore::<()>::without_view("leaving"))
            .on("bye", move |_, _, _| {
                seen.lock().unwrap().push("bye".to_string());
                Ok(())
            })
            .on_remove(|_, view| {
                let report = view.send_notification("bye", None, None)?;
                anyhow::ensure!(report.delivered().is_empty(), "bye was delivered");
                Ok(())
            })
            .build();
        view.register_mediator(Arc::new(mediator));

        assert!(view.remove_mediator("leaving").is_some());

        assert!(entries(&log).is_empty());
        assert!(view.take_faults().is_empty());
    }

    #[test]
    fn recorded_faults_keep_only_the_most_recent() {
        let config = ViewConfig {
            max_recorded_faults: 2,
            ..ViewConfig::default()
        };
        let view = View::with_config(config);
        for name in ["f1", "f2", "f3"] {
            let mediator = DispatchMediator::builder(MediatorCore::<()>::without_view(name))
                .on_register(|core, _| anyhow::bail!("{} failed", core.name()))
                .build();
            view.register_mediator(Arc::new(mediator));
        }

        let faults = view.take_faults();
        let names: Vec<&str> = faults.iter().map(|f| f.mediator.as_str()).collect();
        assert_eq!(names, vec!["f2", "f3"]);
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn zero_fault_capacity_records_nothing() {
        let config = ViewConfig {
            max_recorded_faults: 0,
            ..ViewConfig::default()
        };
        let view = View::with_config(config);
        let mediator = DispatchMediator::builder(MediatorCore::<()>::without_view("f"))
            .on_register(|_, _| anyhow::bail!("nope"))
            .build();
        view.register_mediator(Arc::new(mediator));
        assert!(view.take_faults().is_empty());
    }

    #[test]
    fn uncaught_lifecycle_panic_leaves_registry_consistent() {
        let config = ViewConfig {
            catch_panics: false,
            ..ViewConfig::default()
        };
        let view = View::with_config(config);
        let mediator = DispatchMediator::builder(MediatorCore::<()>::without_view("fragile"))
            .on("a", |_, _, _| Ok(()))
            .on_register(|_, _| panic!("attach panicked"))
            .build();

        let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            view.register_mediator(Arc::new(mediator));
        }));

        assert!(outcome.is_err());
        assert!(view.has_mediator("fragile"));
        assert_eq!(view.interested_in("a"), vec!["fragile"]);
        let faults = view.take_faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].cause, FaultCause::Panic("attach panicked".to_string()));
    }

    #[test]
    fn mediator_registered_from_on_remove_during_replacement_is_displaced() {
        let view = View::new();
        let log = new_log();
        let inner_log = Arc::clone(&log);
        let first = DispatchMediator::builder(MediatorCore::<()>::without_view("m"))
            .on_remove(move |_, view| {
                view.register_mediator(Recorder::new("m", &["sneaky"], &inner_log));
                Ok(())
            })
            .build();
        view.register_mediator(Arc::new(first));

        view.register_mediator(Recorder::new("m", &["a"], &log));

        assert_eq!(view.len(), 1);
        assert!(view.interested_in("sneaky").is_empty());
        assert_eq!(view.interested_in("a"), vec!["m"]);
        assert_eq!(entries(&log), vec!["m:register", "m:remove", "m:register"]);
    }
}
