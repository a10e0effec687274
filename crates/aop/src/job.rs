//! Type-erased unit of work.
//!
//! A job pairs a user closure with the future that receives its outcome,
//! then erases both behind a boxed thunk so workers can queue heterogeneous
//! work.

use std::panic::{self, AssertUnwindSafe};

use crate::future::Future;

pub(crate) struct Job {
    thunk: Box<dyn FnOnce() + Send + 'static>,
}

impl Job {
    /// Pairs a value-producing computation with the future that receives its
    /// result. A side-effecting action is the `R = ()` case.
    pub(crate) fn computation<R, F>(work: F, future: Future<R>) -> Self
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        Self {
            thunk: Box::new(move || {
                let value = work();
                if let Err(violation) = future.complete(value) {
                    // The future was created for this job alone; a second
                    // completion cannot happen unless the runtime itself is
                    // broken.
                    panic!("job future completed twice: {violation}");
                }
            }),
        }
    }

    /// Wraps a continuation thunk already bound to its parent and child
    /// futures.
    pub(crate) fn continuation<F>(thunk: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            thunk: Box::new(thunk),
        }
    }

    /// Runs the job body, containing panics so a failing job cannot take its
    /// worker down. The panicking job's future is left incomplete, which is
    /// the same observable outcome as a job abandoned by termination.
    pub(crate) fn run(self) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(self.thunk)) {
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("non-string panic payload");
            log::error!("job panicked: {message}; its future will never complete");
        }
    }
}
