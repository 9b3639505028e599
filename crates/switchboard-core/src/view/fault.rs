//! Running mediator callbacks so one failure cannot affect the next.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use switchboard_types::FaultCause;

/// A failed mediator callback.
pub(crate) struct Isolated {
    pub(crate) cause: FaultCause,
    /// The original panic payload, kept so it can be re-raised later.
    pub(crate) payload: Option<Box<dyn Any + Send>>,
}

/// Run a mediator callback, turning a returned error or a panic into an
/// [`Isolated`] fault. Panics never unwind out of this function.
pub(crate) fn isolate<F>(callback: F) -> Result<(), Isolated>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Isolated {
            cause: FaultCause::Error(format!("{e:#}")),
            payload: None,
        }),
        Err(payload) => Err(Isolated {
            cause: FaultCause::Panic(panic_message(payload.as_ref())),
            payload: Some(payload),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
