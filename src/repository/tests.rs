//! Tests for the repository module.

use super::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn repositories() -> Vec<(&'static str, Arc<dyn Repository>)> {
    let locked: Arc<dyn Repository> = Arc::new(LockedRepository::new());
    let concurrent: Arc<dyn Repository> = Arc::new(ConcurrentRepository::new());
    vec![("locked", locked), ("concurrent", concurrent)]
}

#[test]
fn test_ids_start_at_one_and_increase() {
    for (name, repo) in repositories() {
        assert_eq!(repo.record_request(), 1, "{name}");
        assert_eq!(repo.record_request(), 2, "{name}");
        assert_eq!(repo.record_request(), 3, "{name}");
        assert_eq!(repo.stats().total_requests, 3, "{name}");
    }
}

#[test]
fn test_concurrent_ids_are_distinct_and_contiguous() {
    const THREADS: u64 = 16;
    const PER_THREAD: u64 = 500;

    for (name, repo) in repositories() {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    let mut ids = Vec::with_capacity(PER_THREAD as usize);
                    for _ in 0..PER_THREAD {
                        ids.push(repo.record_request());
                    }
                    ids
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            // Each thread observes its own ids in increasing order.
            assert!(ids.windows(2).all(|w| w[0] < w[1]), "{name}");
            for id in ids {
                assert!(seen.insert(id), "{name}: duplicate id {id}");
            }
        }

        let expected: HashSet<u64> = (1..=THREADS * PER_THREAD).collect();
        assert_eq!(seen, expected, "{name}");
        assert_eq!(repo.stats().total_requests, THREADS * PER_THREAD, "{name}");
    }
}

#[test]
fn test_snapshot_is_isolated_from_later_writes() {
    for (name, repo) in repositories() {
        repo.store("request_1", SharedRecord::for_request(1, 10));
        let snapshot = repo.snapshot();

        repo.store("request_1", SharedRecord::for_request(1, 99));
        repo.store("request_2", SharedRecord::for_request(2, 20));

        assert_eq!(snapshot.len(), 1, "{name}");
        assert_eq!(snapshot["request_1"].counter, 10, "{name}");
        assert_eq!(repo.get("request_1").unwrap().counter, 99, "{name}");
        assert_eq!(repo.stats().data_size, 2, "{name}");
    }
}

#[test]
fn test_mutating_snapshot_does_not_touch_repository() {
    for (name, repo) in repositories() {
        repo.store("request_1", SharedRecord::for_request(1, 10));

        let mut snapshot = repo.snapshot();
        snapshot.get_mut("request_1").unwrap().counter = 0;
        snapshot.clear();

        assert_eq!(repo.get("request_1").unwrap().counter, 10, "{name}");
        assert_eq!(repo.stats().data_size, 1, "{name}");
    }
}

#[test]
fn test_store_overwrites_existing_key() {
    for (name, repo) in repositories() {
        repo.store("k", SharedRecord::for_request(1, 1));
        repo.store("k", SharedRecord::for_request(2, 2));

        let record = repo.get("k").unwrap();
        assert_eq!(record.counter, 2, "{name}");
        assert_eq!(record.identifier, "request_2", "{name}");
        assert_eq!(repo.stats().data_size, 1, "{name}");
    }
}

#[test]
fn test_get_missing_key() {
    for (name, repo) in repositories() {
        assert!(repo.get("nope").is_none(), "{name}");
    }
}

#[test]
fn test_stats_count_matches_distinct_writes_at_any_concurrency() {
    const WRITES: u64 = 400;

    for threads in [1_u64, 4, 16] {
        for (name, repo) in repositories() {
            let per_thread = WRITES / threads;
            let handles: Vec<_> = (0..threads)
                .map(|t| {
                    let repo = Arc::clone(&repo);
                    thread::spawn(move || {
                        for i in 0..per_thread {
                            let id = t * per_thread + i;
                            repo.store(&record_key(id), SharedRecord::for_request(id, id));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(
                repo.stats().data_size as u64,
                WRITES,
                "{name} with {threads} threads"
            );
        }
    }
}

#[test]
fn test_same_key_last_write_wins() {
    for (name, repo) in repositories() {
        let first = Arc::clone(&repo);
        thread::spawn(move || first.store("shared", SharedRecord::for_request(1, 100)))
            .join()
            .unwrap();

        let second = Arc::clone(&repo);
        thread::spawn(move || second.store("shared", SharedRecord::for_request(2, 200)))
            .join()
            .unwrap();

        let record = repo.get("shared").unwrap();
        assert_eq!(record.identifier, "request_2", "{name}");
        assert_eq!(record.counter, 200, "{name}");
    }
}

#[test]
fn test_concurrent_reader_never_sees_torn_record() {
    let repo = Arc::new(ConcurrentRepository::new());
    repo.store("shared", SharedRecord::for_request(0, 0));

    let writers: Vec<_> = (0..4_u64)
        .map(|w| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for i in 0..2_000 {
                    let id = w * 10_000 + i;
                    // Counter mirrors the id so a mix of two writes is detectable.
                    repo.store("shared", SharedRecord::for_request(id, id));
                }
            })
        })
        .collect();

    let reader = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let record = repo.get("shared").unwrap();
                assert_eq!(record.identifier, record_key(record.counter));
                assert_eq!(record.name, format!("Request {}", record.counter));

                let snapshot = repo.snapshot();
                let record = &snapshot["shared"];
                assert_eq!(record.identifier, record_key(record.counter));
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();
}

#[test]
fn test_disjoint_writers_proceed_during_snapshot() {
    let repo = Arc::new(ConcurrentRepository::new());
    for id in 0..1_000 {
        repo.store(&record_key(id), SharedRecord::for_request(id, id));
    }

    let writer = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for id in 1_000..2_000 {
                repo.store(&record_key(id), SharedRecord::for_request(id, id));
            }
        })
    };

    let mut sizes = Vec::new();
    for _ in 0..20 {
        sizes.push(repo.snapshot().len());
    }
    writer.join().unwrap();

    // Every snapshot contains at least the pre-populated records and never
    // more than everything eventually written.
    assert!(sizes.iter().all(|&n| (1_000..=2_000).contains(&n)));
    assert_eq!(repo.len(), 2_000);
}

#[test]
fn test_lock_guard_records_hold_duration() {
    let repo = LockedRepository::new();
    {
        let mut state = repo.lock();
        state.next_id();
        thread::sleep(Duration::from_millis(20));
    }
    {
        let _state = repo.lock();
    }

    let metrics = repo.lock_metrics();
    assert_eq!(metrics.acquisitions, 2);
    assert!(metrics.max_hold >= Duration::from_millis(20));
    assert!(metrics.total_hold >= metrics.max_hold);
    assert!(metrics.mean_hold() <= metrics.max_hold);

    repo.reset_lock_metrics();
    let metrics = repo.lock_metrics();
    assert_eq!(metrics.acquisitions, 0);
    assert_eq!(metrics.mean_hold(), Duration::ZERO);
}

#[test]
fn test_lock_guard_blocks_other_callers() {
    let repo = Arc::new(LockedRepository::new());
    let state = repo.lock();

    let contender = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || repo.record_request())
    };

    thread::sleep(Duration::from_millis(20));
    assert!(!contender.is_finished());
    drop(state);

    assert_eq!(contender.join().unwrap(), 1);
}
