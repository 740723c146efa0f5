//tests/queue.rs
use marking::manager::queue::WorkQueue;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, timeout};
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_unit_is_taken_by_exactly_one_worker() {
    let queue = Arc::new(WorkQueue::new(64));
    let cancel = CancellationToken::new();
    let total_units = 64;

    let taken = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            let taken = Arc::clone(&taken);
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                while let Some(id) = queue.pop(&cancel).await {
                    seen.lock().unwrap().push(id);
                    if taken.fetch_add(1, Ordering::SeqCst) + 1 == total_units {
                        cancel.cancel();
                    }
                }
            })
        })
        .collect();

    for id in 0..total_units as i64 {
        assert!(queue.push_unique(id));
        if id % 8 == 0 {
            tokio::task::yield_now().await;
        }
    }

    let results = timeout(Duration::from_secs(5), futures::future::join_all(handles))
        .await
        .expect("workers should finish once every unit is taken");
    for result in results {
        result.expect("Task should not panic");
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), total_units, "every unit popped once");
    let distinct: HashSet<i64> = seen.iter().copied().collect();
    assert_eq!(distinct.len(), total_units, "no unit popped twice");
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_queue_rejects_duplicates_and_overflow() {
    let queue = WorkQueue::new(2);

    assert!(queue.push_unique(10));
    assert!(!queue.push_unique(10), "duplicate id must be rejected");
    assert!(queue.push_unique(11));
    assert!(!queue.push_unique(12), "full queue must reject");
    assert_eq!(queue.free_slots(), 0);

    assert_eq!(queue.try_pop(), Some(10));
    assert!(queue.push_unique(10), "id may be queued again once taken");
    assert_eq!(queue.drain(), vec![11, 10]);
    assert_eq!(queue.free_slots(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pop_waits_for_push() {
    let queue = Arc::new(WorkQueue::new(4));
    let cancel = CancellationToken::new();

    let waiter = {
        let queue = Arc::clone(&queue);
        let cancel = cancel.clone();
        tokio::spawn(async move { queue.pop(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished(), "pop must block on an empty queue");

    queue.push_unique(7);
    let popped = timeout(Duration::from_secs(2), waiter)
        .await
        .expect("pop should wake on push")
        .expect("Task should not panic");
    assert_eq!(popped, Some(7));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_releases_waiting_workers() {
    let queue = Arc::new(WorkQueue::new(4));
    let cancel = CancellationToken::new();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.pop(&cancel).await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let results = timeout(Duration::from_secs(2), futures::future::join_all(handles))
        .await
        .expect("cancelled workers should return");
    for result in results {
        assert_eq!(result.expect("Task should not panic"), None);
    }

    queue.push_unique(1);
    assert_eq!(queue.pop(&cancel).await, None, "cancelled pop leaves items queued");
    assert_eq!(queue.len(), 1);
}
