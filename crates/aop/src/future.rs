//! Single-assignment future with chained continuations.
//!
//! Two independent three-state machines guard the future, each advanced only
//! by compare-and-swap: one for the result value, one for the continuation
//! registration. Both move `Pending -> Completing -> Completed` and never
//! transition any other way, so the hot path needs no lock. The only locking
//! is the condition variable external waiters park on.
//!
//! `complete` and `then` may race freely. Each side submits the continuation
//! job only after observing the *other* machine in `Completed`, and the two
//! sides arbitrate through a one-shot claim so the continuation is submitted
//! exactly once regardless of interleaving.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::{Condvar, Mutex};

use crate::error::ProtocolViolation;
use crate::job::Job;
use crate::scheduler::Scheduler;

const PENDING: u8 = 0;
const COMPLETING: u8 = 1;
const COMPLETED: u8 = 2;

type Continuation<R> = Box<dyn FnOnce(&R) + Send + 'static>;

/// Handle to an asynchronously produced value.
///
/// Futures are created by the pool when a job is submitted, or by [`then`]
/// for the downstream value of a continuation. Cloning is cheap and all
/// clones observe the same cell.
///
/// [`then`]: Future::then
pub struct Future<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for Future<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<R> {
    value_state: AtomicU8,
    cont_state: AtomicU8,
    value: UnsafeCell<Option<R>>,
    continuation: UnsafeCell<Option<Continuation<R>>>,
    /// One-shot arbiter between the `complete` and `then` submission paths.
    cont_claim: AtomicBool,
    /// The owning scheduler; needed to recognize worker threads in `wait`
    /// and to re-submit continuations. Weak so a future outliving its pool
    /// does not keep the workers alive.
    scheduler: Weak<Scheduler>,
    waiter_lock: Mutex<()>,
    waiter_cv: Condvar,
}

// Safety: the value cell has a single writer, gated by the
// Pending -> Completing CAS; it is read only after `value_state` is observed
// `Completed` (or, for the continuation job, after the store that precedes
// its submission). The continuation cell likewise: one writer gated by the
// continuation CAS, one taker gated by the claim flag.
unsafe impl<R: Send> Send for Shared<R> {}
unsafe impl<R: Send> Sync for Shared<R> {}

impl<R: Send + 'static> Future<R> {
    pub(crate) fn new(scheduler: Weak<Scheduler>) -> Self {
        Self {
            shared: Arc::new(Shared {
                value_state: AtomicU8::new(PENDING),
                cont_state: AtomicU8::new(PENDING),
                value: UnsafeCell::new(None),
                continuation: UnsafeCell::new(None),
                cont_claim: AtomicBool::new(false),
                scheduler,
                waiter_lock: Mutex::new(()),
                waiter_cv: Condvar::new(),
            }),
        }
    }

    /// Whether the result has been produced.
    pub fn is_complete(&self) -> bool {
        self.shared.value_state.load(Ordering::Acquire) == COMPLETED
    }

    /// Stores the result and wakes waiters. Called exactly once by the job
    /// that owns this future.
    pub(crate) fn complete(&self, value: R) -> Result<(), ProtocolViolation> {
        let shared = &self.shared;
        if shared
            .value_state
            .compare_exchange(PENDING, COMPLETING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProtocolViolation::FutureCompleted);
        }
        // Sole writer from here: the transition above is won at most once.
        unsafe {
            *shared.value.get() = Some(value);
        }
        log::trace!("future completing");
        Shared::submit_continuation_if_ready(shared);
        if shared
            .value_state
            .compare_exchange(COMPLETING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            panic!("future state corrupted: Completing -> Completed transition lost");
        }
        // The store-then-notify must not interleave with a waiter's
        // check-then-sleep, hence the lock.
        let _guard = shared.waiter_lock.lock();
        shared.waiter_cv.notify_all();
        Ok(())
    }

    /// Registers a continuation to run with the result once it exists, and
    /// returns the future of the continuation's own output.
    ///
    /// Non-blocking: the child future completes later, when the scheduled
    /// continuation job runs. The continuation is dispatched through the
    /// pool's round robin and may land on any worker. At most one
    /// continuation per future; a second registration is refused and the
    /// first is unaffected.
    pub fn then<R2, F>(&self, f: F) -> Result<Future<R2>, ProtocolViolation>
    where
        R2: Send + 'static,
        F: FnOnce(&R) -> R2 + Send + 'static,
    {
        let shared = &self.shared;
        if shared
            .cont_state
            .compare_exchange(PENDING, COMPLETING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProtocolViolation::ContinuationRegistered);
        }
        let child = Future::<R2>::new(shared.scheduler.clone());
        let downstream = child.clone();
        let continuation: Continuation<R> = Box::new(move |value| {
            let out = f(value);
            if let Err(violation) = downstream.complete(out) {
                panic!("continuation future completed twice: {violation}");
            }
        });
        unsafe {
            *shared.continuation.get() = Some(continuation);
        }
        if shared
            .cont_state
            .compare_exchange(COMPLETING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            panic!("continuation state corrupted: Completing -> Completed transition lost");
        }
        // The value may have completed while we were registering.
        if shared.value_state.load(Ordering::Acquire) == COMPLETED {
            Shared::submit_continuation_if_ready(shared);
        }
        Ok(child)
    }

    /// Blocks until the result exists and returns a clone of it.
    ///
    /// A worker thread of the owning pool never suspends here: it drains its
    /// own queue until the future completes, so waiting on a job queued
    /// behind the current one cannot deadlock. External threads park on the
    /// future's condition variable; wakeups with the result still missing
    /// are treated as spurious and the thread goes back to sleep.
    ///
    /// # Panics
    ///
    /// Panics when called from a worker thread and the pool terminates
    /// before the future completes; the value can no longer be produced. An
    /// external thread waiting on a future abandoned by [`shutdown`] blocks
    /// indefinitely instead.
    ///
    /// [`shutdown`]: crate::pool::Pool::shutdown
    pub fn wait(&self) -> R
    where
        R: Clone,
    {
        let shared = &self.shared;
        if shared.value_state.load(Ordering::Acquire) != COMPLETED {
            match shared.scheduler.upgrade() {
                Some(scheduler) if scheduler.is_worker_thread(thread::current().id()) => {
                    log::trace!("worker thread waiting; draining own queue");
                    scheduler.work_until_completed(thread::current().id(), &|| {
                        shared.value_state.load(Ordering::Acquire) == COMPLETED
                    });
                    if shared.value_state.load(Ordering::Acquire) != COMPLETED {
                        panic!("pool terminated while a worker waited on an incomplete future");
                    }
                }
                _ => {
                    log::trace!("external thread parking on future");
                    let mut guard = shared.waiter_lock.lock();
                    while shared.value_state.load(Ordering::Acquire) != COMPLETED {
                        shared.waiter_cv.wait(&mut guard);
                    }
                }
            }
        }
        // Completed: the slot is immutable from here on.
        unsafe { (*shared.value.get()).as_ref() }
            .expect("completed future missing its value")
            .clone()
    }
}

impl<R: Send + 'static> Shared<R> {
    /// Submits the continuation job if both machines have finished.
    ///
    /// Called from `complete` after the value store and from `then` after
    /// observing the value `Completed`. Both sides can get here in the same
    /// race, so the claim flag decides which one hands the job to the
    /// scheduler; the loser returns without touching the slot.
    fn submit_continuation_if_ready(this: &Arc<Self>) {
        if this.cont_state.load(Ordering::Acquire) != COMPLETED {
            return;
        }
        if this.cont_claim.swap(true, Ordering::AcqRel) {
            return;
        }
        let continuation = unsafe { (*this.continuation.get()).take() }
            .expect("claimed continuation missing from its slot");
        let scheduler = match this.scheduler.upgrade() {
            Some(scheduler) => scheduler,
            None => {
                log::warn!("scheduler dropped before continuation could run");
                return;
            }
        };
        let parent = Arc::clone(this);
        log::trace!("continuation submitted");
        scheduler.dispatch(Job::continuation(move || {
            // The value store precedes every submission path.
            let value = unsafe { (*parent.value.get()).as_ref() }
                .expect("scheduled continuation without a value");
            continuation(value);
        }));
    }
}
