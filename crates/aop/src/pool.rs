//! Public pool handle and configuration.

use std::sync::Arc;
use std::thread;

use crate::error::PoolError;
use crate::future::Future;
use crate::job::Job;
use crate::scheduler::Scheduler;
use crate::worker::Worker;

/// Configuration for a worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Name used in worker thread names and log messages.
    pub name: &'static str,
    /// Number of workers, fixed for the life of the pool. Must be at least
    /// one.
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "aop",
            workers: 4,
        }
    }
}

impl PoolConfig {
    /// Creates a new pool configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// Builder for ergonomic pool configuration construction.
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Sets the pool name.
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets the worker count.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Builds the pool configuration.
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

/// Handle to a fixed pool of single-threaded active-object workers.
///
/// Cloning is cheap; all clones drive the same pool. Dropping the last
/// handle does not terminate the workers; call [`Pool::shutdown`] for that.
/// Continuations not yet dispatched when the pool is gone are dropped with
/// a warning.
#[derive(Clone)]
pub struct Pool {
    scheduler: Arc<Scheduler>,
}

impl Pool {
    /// Pool with `workers` workers and default naming.
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::builder().workers(workers).build())
    }

    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        if config.workers == 0 {
            return Err(PoolError::NoWorkers);
        }
        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            workers.push(Worker::spawn(config.name, index)?);
        }
        log::debug!("{}: pool started with {} workers", config.name, config.workers);
        Ok(Self {
            scheduler: Arc::new(Scheduler::new(workers)),
        })
    }

    /// Submits a side-effecting action. The returned future completes with
    /// `()` once the action has run.
    pub fn submit_action<F>(&self, work: F) -> Future<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let future = Future::new(Arc::downgrade(&self.scheduler));
        self.scheduler.dispatch(Job::computation(work, future.clone()));
        future
    }

    /// Submits a value-producing computation.
    pub fn submit_computation<R, F>(&self, work: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let future = Future::new(Arc::downgrade(&self.scheduler));
        self.scheduler.dispatch(Job::computation(work, future.clone()));
        future
    }

    /// Broadcasts termination to every worker and returns immediately.
    ///
    /// A job in flight finishes and completes its future normally. Jobs
    /// still queued are abandoned: their futures never complete, and an
    /// external thread already blocked in [`Future::wait`] on one of them
    /// will block indefinitely. Use [`Pool::join`] to wait for the workers
    /// to exit.
    pub fn shutdown(&self) {
        log::debug!("pool shutdown requested");
        self.scheduler.terminate();
    }

    /// Waits for the worker threads to exit after [`Pool::shutdown`].
    ///
    /// Safe to call from inside a job: the calling worker is skipped, so
    /// the pool cannot deadlock joining itself.
    pub fn join(&self) {
        self.scheduler.join_excluding(thread::current().id());
    }

    pub fn worker_count(&self) -> usize {
        self.scheduler.worker_count()
    }

    /// Future bound to this pool but not paired with any queued job; lets
    /// the state-machine tests drive `complete` by hand.
    #[cfg(test)]
    pub(crate) fn unbound_future<R: Send + 'static>(&self) -> Future<R> {
        Future::new(Arc::downgrade(&self.scheduler))
    }
}
