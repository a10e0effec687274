//! Error taxonomy.

use std::io;

use thiserror::Error;

/// Misuse of the future protocol.
///
/// Reported once and never retried: both variants indicate a bug in the code
/// driving the future, not a condition the runtime recovers from.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A second completion was attempted on a future that already left the
    /// pending state.
    #[error("future already completed")]
    FutureCompleted,
    /// A second continuation was registered on the same future.
    #[error("continuation already registered")]
    ContinuationRegistered,
}

/// Pool construction failures.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The configured worker count was zero.
    #[error("worker pool requires at least one worker")]
    NoWorkers,
    /// The operating system refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}
