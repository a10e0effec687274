use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, Weak};
use std::thread;

use crate::error::ProtocolViolation;
use crate::future::Future;
use crate::pool::Pool;

use super::init_logging;

#[test]
fn wait_returns_the_completed_value() {
    init_logging();
    let future: Future<u32> = Future::new(Weak::new());
    assert!(!future.is_complete());

    future.complete(7).expect("first completion");
    assert!(future.is_complete());
    assert_eq!(future.wait(), 7);
}

#[test]
fn double_complete_is_refused_and_value_unaffected() {
    let future: Future<u32> = Future::new(Weak::new());
    future.complete(1).expect("first completion");

    assert_eq!(future.complete(2), Err(ProtocolViolation::FutureCompleted));
    assert_eq!(future.wait(), 1);
}

#[test]
fn concurrent_waiters_all_observe_the_value() {
    init_logging();
    let future: Future<u64> = Future::new(Weak::new());
    let gate = Arc::new(Barrier::new(5));

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let future = future.clone();
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.wait();
                future.wait()
            })
        })
        .collect();

    let completer = {
        let future = future.clone();
        let gate = Arc::clone(&gate);
        thread::spawn(move || {
            gate.wait();
            future.complete(99).expect("single completion");
        })
    };

    for waiter in waiters {
        assert_eq!(waiter.join().expect("waiter thread"), 99);
    }
    completer.join().expect("completer thread");
}

#[test]
fn double_then_is_refused_and_first_continuation_runs_once() {
    init_logging();
    let pool = Pool::new(2).expect("pool");
    let runs = Arc::new(AtomicUsize::new(0));

    let source = pool.submit_computation(|| 21);
    let probe = Arc::clone(&runs);
    let doubled = source
        .then(move |&v| {
            probe.fetch_add(1, Ordering::SeqCst);
            v * 2
        })
        .expect("first registration");

    assert!(matches!(
        source.then(|v: &i32| *v),
        Err(ProtocolViolation::ContinuationRegistered)
    ));

    assert_eq!(doubled.wait(), 42);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    pool.shutdown();
}

#[test]
fn continuation_runs_when_registered_after_completion() {
    init_logging();
    let pool = Pool::new(1).expect("pool");

    let future: Future<u32> = pool.unbound_future();
    future.complete(3).expect("completion");
    let child = future.then(|&v| v * 3).expect("registration");

    assert_eq!(child.wait(), 9);
    pool.shutdown();
}

#[test]
fn continuation_runs_when_registered_before_completion() {
    init_logging();
    let pool = Pool::new(1).expect("pool");

    let future: Future<u32> = pool.unbound_future();
    let child = future.then(|&v| v * 3).expect("registration");
    future.complete(3).expect("completion");

    assert_eq!(child.wait(), 9);
    pool.shutdown();
}

#[test]
fn continuation_runs_exactly_once_under_racing_complete_and_then() {
    init_logging();
    let pool = Pool::new(2).expect("pool");

    for round in 0..200u32 {
        let future: Future<u32> = pool.unbound_future();
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Barrier::new(2));

        let completer = {
            let future = future.clone();
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.wait();
                future.complete(round).expect("single completion");
            })
        };

        let probe = Arc::clone(&runs);
        gate.wait();
        let child = future
            .then(move |&v| {
                probe.fetch_add(1, Ordering::SeqCst);
                v
            })
            .expect("single registration");

        assert_eq!(child.wait(), round);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        completer.join().expect("completer thread");
    }
    pool.shutdown();
}

#[test]
fn chained_continuations_run_in_registration_order() {
    init_logging();
    let pool = Pool::new(3).expect("pool");
    let order = Arc::new(Mutex::new(Vec::new()));

    let first_probe = Arc::clone(&order);
    let first = pool.submit_computation(move || {
        first_probe.lock().unwrap().push("first");
        1
    });

    let second_probe = Arc::clone(&order);
    let third_probe = Arc::clone(&order);
    let last = first
        .then(move |&v| {
            second_probe.lock().unwrap().push("second");
            v + 1
        })
        .expect("second hop")
        .then(move |&v| {
            third_probe.lock().unwrap().push("third");
            v + 1
        })
        .expect("third hop");

    assert_eq!(last.wait(), 3);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    pool.shutdown();
}
