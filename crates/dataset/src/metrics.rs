//! Per-sink delivery counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters of a single sink worker
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Batches waiting in the queue
    queue_len: AtomicUsize,
    /// Batches written successfully
    write_count: AtomicU64,
    /// Snippets contained in successful writes
    snippet_count: AtomicU64,
    /// Failed writes
    failure_count: AtomicU64,
    /// Batches dropped because the queue was full
    dropped_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Account a successful write of `snippets` snippets
    pub fn record_write(&self, snippets: usize) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.snippet_count
            .fetch_add(snippets as u64, Ordering::Relaxed);
    }

    pub fn snippet_count(&self) -> u64 {
        self.snippet_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            snippet_count: self.snippet_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub snippet_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}

impl MetricsSnapshot {
    /// Every dispatched batch was written
    pub fn is_complete(&self) -> bool {
        self.failure_count == 0 && self.dropped_count == 0
    }
}
