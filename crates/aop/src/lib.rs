//! # aop
//!
//! A fixed pool of single-threaded active-object workers, a round-robin
//! scheduler distributing jobs across them, and a lock-free future primitive
//! supporting blocking retrieval and chained continuations.
//!
//! ## Module Overview
//! - [`future`] – Single-assignment result cell advanced by CAS, with
//!   at-most-one chained continuation.
//! - [`pool`]   – Pool configuration, job submission and shutdown.
//! - [`error`]  – Protocol violations and pool construction errors.
//!
//! Workers and the round-robin scheduler are internal: jobs enter through
//! [`pool::Pool`] and results come back through [`future::Future`].
//!
//! ## Deadlock avoidance
//!
//! A worker thread that calls [`future::Future::wait`] on an incomplete
//! future never suspends. It re-enters its own queue and keeps running jobs
//! until the future completes, so a job may block on a result that sits
//! behind it in the very same queue. External threads park on a condition
//! variable instead.

pub mod error;
pub mod future;
pub mod pool;

mod job;
mod scheduler;
mod worker;

pub use error::{PoolError, ProtocolViolation};
pub use future::Future;
pub use pool::{Pool, PoolConfig, PoolConfigBuilder};

#[cfg(test)]
mod tests;
