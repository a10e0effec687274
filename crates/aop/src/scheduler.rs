//! Round-robin dispatch across the worker pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::ThreadId;

use crate::job::Job;
use crate::worker::Worker;

/// Fixed set of workers plus the rotation cursor. No load sensing, no
/// stealing: round robin is the sole balancing policy.
pub(crate) struct Scheduler {
    workers: Vec<Worker>,
    cursor: AtomicUsize,
}

impl Scheduler {
    pub(crate) fn new(workers: Vec<Worker>) -> Self {
        Self {
            workers,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Hands the job to the next worker in rotation.
    ///
    /// The cursor advances by exactly one per submission regardless of queue
    /// depth. It is atomic because continuations are dispatched from worker
    /// threads concurrently with external submitters.
    pub(crate) fn dispatch(&self, job: Job) {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        self.workers[slot].enqueue(job);
    }

    pub(crate) fn is_worker_thread(&self, id: ThreadId) -> bool {
        self.workers.iter().any(|worker| worker.thread_id() == id)
    }

    /// Delegates to the drain loop of the worker running on `id`. A no-op
    /// for threads that are not ours; `Future::wait` checks first.
    pub(crate) fn work_until_completed(&self, id: ThreadId, done: &dyn Fn() -> bool) {
        if let Some(worker) = self.workers.iter().find(|worker| worker.thread_id() == id) {
            worker.run_until_completed(done);
        }
    }

    /// Broadcasts termination to every worker.
    pub(crate) fn terminate(&self) {
        for worker in &self.workers {
            worker.terminate();
        }
    }

    /// Joins every worker thread except `current`, so a worker submitting
    /// the shutdown cannot wait on itself.
    pub(crate) fn join_excluding(&self, current: ThreadId) {
        for worker in &self.workers {
            if worker.thread_id() != current {
                worker.join();
            }
        }
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }
}
