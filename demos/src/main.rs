//! Word-count demo.
//!
//! Submits computations and actions, chains continuations, and nests a
//! blocking wait inside a continuation, the case where a worker must drain
//! its own queue instead of suspending.

use std::thread;
use std::time::Duration;

use aop::{Pool, PoolConfig};

fn count_words(text: &'static str) -> usize {
    log::info!("counting: {text:?}");
    // Pretend this is expensive.
    thread::sleep(Duration::from_millis(150));
    text.split_whitespace().count()
}

fn main() {
    env_logger::init();

    let config = PoolConfig::builder().name("demo").workers(2).build();
    let pool = Pool::with_config(config).expect("pool construction");

    let first = pool.submit_computation(|| count_words("the quick brown fox"));
    let second = pool.submit_computation(|| count_words("jumps over the lazy dog"));

    // The continuation blocks on a sibling future. It may land on the worker
    // that owns `second`; the drain loop keeps that from deadlocking.
    let total = first
        .then(move |&n| n + second.wait())
        .expect("first continuation");
    let report = total
        .then(|&n| format!("{n} words counted"))
        .expect("second continuation");

    let housekeeping = pool.submit_action(|| log::info!("housekeeping pass"));

    println!("{}", report.wait());
    housekeeping.wait();

    pool.shutdown();
    pool.join();
}
