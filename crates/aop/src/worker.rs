//! Single-threaded active-object worker.
//!
//! Each worker owns an unbounded FIFO queue and one dedicated thread that
//! serially pops and runs jobs. Any number of threads may enqueue; only the
//! worker's own thread dequeues.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::job::Job;

/// Sleep period of an empty-queue drain pass. The target future may complete
/// on another worker, which cannot notify this queue's condvar, so the drain
/// re-checks its predicate on a short period.
const DRAIN_RECHECK: Duration = Duration::from_millis(2);

pub(crate) struct Worker {
    shared: Arc<Inner>,
    thread_id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    label: String,
    queue: Mutex<VecDeque<Job>>,
    available: Condvar,
    terminate: AtomicBool,
}

impl Worker {
    pub(crate) fn spawn(pool_name: &str, index: usize) -> io::Result<Self> {
        let shared = Arc::new(Inner {
            label: format!("{pool_name}-worker-{index}"),
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            terminate: AtomicBool::new(false),
        });
        let for_thread = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(shared.label.clone())
            .spawn(move || for_thread.run())?;
        let thread_id = handle.thread().id();
        Ok(Self {
            shared,
            thread_id,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub(crate) fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Appends a job at the tail and wakes the thread if it is idle.
    ///
    /// The queue is unbounded, so enqueue always succeeds. It also succeeds
    /// after termination was requested; such a job is simply never started.
    pub(crate) fn enqueue(&self, job: Job) {
        let mut queue = self.shared.queue.lock();
        queue.push_back(job);
        log::trace!("{}: job enqueued, depth {}", self.shared.label, queue.len());
        drop(queue);
        self.shared.available.notify_one();
    }

    /// Requests termination. The loop exits after the job currently in
    /// flight; anything still queued is abandoned and its future never
    /// completes.
    pub(crate) fn terminate(&self) {
        self.shared.terminate.store(true, Ordering::Release);
        let _queue = self.shared.queue.lock();
        self.shared.available.notify_one();
    }

    /// Re-entrant drain entered from `Future::wait` on this worker's own
    /// thread.
    pub(crate) fn run_until_completed(&self, done: &dyn Fn() -> bool) {
        self.shared.drain(done);
    }

    /// Waits for the worker thread to exit. The caller must not be the
    /// worker's own thread.
    pub(crate) fn join(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("{}: worker thread panicked", self.shared.label);
            }
        }
    }
}

impl Inner {
    /// Thread body: pop and run jobs until told to terminate. The
    /// termination check comes before the pop, so queued jobs are abandoned
    /// once the flag is up.
    fn run(&self) {
        log::debug!("{}: started", self.label);
        loop {
            let job = {
                let mut queue = self.queue.lock();
                loop {
                    if self.terminate.load(Ordering::Acquire) {
                        log::debug!(
                            "{}: terminating, {} queued jobs abandoned",
                            self.label,
                            queue.len()
                        );
                        return;
                    }
                    match queue.pop_front() {
                        Some(job) => break job,
                        None => self.available.wait(&mut queue),
                    }
                }
            };
            job.run();
        }
    }

    /// Runs jobs from this queue until the predicate holds or termination is
    /// requested. The predicate may be satisfied by a job run here, by
    /// another worker entirely, or by an external completer; returning does
    /// not imply this worker produced the value.
    fn drain(&self, done: &dyn Fn() -> bool) {
        log::trace!("{}: draining", self.label);
        while !done() {
            let job = {
                let mut queue = self.queue.lock();
                loop {
                    if self.terminate.load(Ordering::Acquire) || done() {
                        return;
                    }
                    match queue.pop_front() {
                        Some(job) => break job,
                        None => {
                            let _ = self.available.wait_for(&mut queue, DRAIN_RECHECK);
                        }
                    }
                }
            };
            job.run();
        }
    }
}
