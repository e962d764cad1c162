//! Stress tests for chronicle-storage
//!
//! These tests hammer a single shared backend from many threads and check
//! that every append lands as one whole, uncorrupted record.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use chronicle_core::{Level, LogEntry};
use chronicle_storage::{Backend, CsvBackend, JsonBackend, MemoryBackend, PlainTextBackend, SqliteBackend};
use tempfile::TempDir;

const NUM_THREADS: usize = 8;

fn hammer(backend: Arc<dyn Backend>, per_thread: usize) {
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let start = Instant::now();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|thread_id| {
            let backend = Arc::clone(&backend);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    // Delimiters and line breaks make torn writes visible
                    let message = format!("thread {thread_id}, entry {i}\n\"quoted\", \\ done");
                    backend.append(&LogEntry::new(Level::Info, message)).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let entries = backend.read_all().unwrap();
    println!(
        "{}: {} concurrent appends in {:?}",
        backend.describe(),
        entries.len(),
        start.elapsed()
    );

    assert_eq!(entries.len(), NUM_THREADS * per_thread);

    let distinct: HashSet<&str> = entries.iter().map(|e| e.message()).collect();
    assert_eq!(distinct.len(), entries.len(), "duplicated or torn records");

    // Each thread's own entries keep their relative order
    for thread_id in 0..NUM_THREADS {
        let prefix = format!("thread {thread_id}, entry ");
        let sequence: Vec<usize> = entries
            .iter()
            .filter_map(|e| e.message().strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.split('\n').next())
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(sequence, (0..per_thread).collect::<Vec<_>>());
    }
}

#[test]
fn test_concurrent_csv_appends() {
    let temp_dir = TempDir::new().unwrap();
    hammer(Arc::new(CsvBackend::open(temp_dir.path().join("stress.csv")).unwrap()), 250);
}

#[test]
fn test_concurrent_plain_appends() {
    let temp_dir = TempDir::new().unwrap();
    hammer(Arc::new(PlainTextBackend::open(temp_dir.path().join("stress.txt")).unwrap()), 250);
}

#[test]
fn test_concurrent_sqlite_appends() {
    let temp_dir = TempDir::new().unwrap();
    hammer(Arc::new(SqliteBackend::open(temp_dir.path().join("stress.db")).unwrap()), 100);
}

/// The JSON document is rewritten on every append, so keep the count modest
#[test]
fn test_concurrent_json_appends() {
    let temp_dir = TempDir::new().unwrap();
    hammer(Arc::new(JsonBackend::open(temp_dir.path().join("stress.json")).unwrap()), 40);
}

#[test]
fn test_concurrent_memory_appends() {
    hammer(Arc::new(MemoryBackend::new()), 2_000);
}

/// Test a large sequential load against a file backend
#[test]
fn test_csv_throughput() {
    let temp_dir = TempDir::new().unwrap();
    let backend = CsvBackend::open(temp_dir.path().join("bulk.csv")).unwrap();
    let count = 5_000;

    let start = Instant::now();
    for i in 0..count {
        let level = Level::ALL[i % Level::ALL.len()];
        backend.append(&LogEntry::new(level, format!("bulk entry {i}"))).unwrap();
    }
    let duration = start.elapsed();
    println!(
        "Appended {} entries in {:?} ({:.2} entries/sec)",
        count,
        duration,
        count as f64 / duration.as_secs_f64()
    );

    let entries = backend.read_all().unwrap();
    assert_eq!(entries.len(), count);
    assert_eq!(entries[count - 1].message(), format!("bulk entry {}", count - 1));
}
