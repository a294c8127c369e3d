//! Message channels between search workers, the coordinator and observers.

use crate::search::result::ResultMap;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Message sent from workers to the coordinator.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Worker has hashed its whole range.
    Finished {
        worker_id: usize,
        candidates_hashed: u64,
        found: ResultMap,
    },
}

/// Event published by the coordinator for whatever display layer listens.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Work has been dispatched.
    Started {
        max_id: u64,
        workers: usize,
        targets: usize,
    },
    /// Candidates hashed so far across all workers.
    Progress { hashed: u64, total: u64 },
    /// One worker merged its local hits.
    WorkerFinished {
        worker_id: usize,
        candidates_hashed: u64,
        matches: usize,
    },
    /// All workers joined and results merged.
    Completed { matched: usize, elapsed: Duration },
}

/// Shared progress counter, read by the coordinator without channel traffic.
#[derive(Debug, Default)]
pub struct SharedProgress {
    hashed: AtomicU64,
}

impl SharedProgress {
    pub fn add(&self, count: u64) {
        self.hashed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn hashed(&self) -> u64 {
        self.hashed.load(Ordering::Relaxed)
    }
}

/// Channel endpoints for a worker.
pub struct WorkerChannels {
    /// Send messages to coordinator.
    pub to_coordinator: Sender<WorkerMessage>,
    pub progress: Arc<SharedProgress>,
}

/// Channel endpoints for the coordinator.
pub struct CoordinatorChannels {
    /// Receive messages from workers.
    pub from_workers: Receiver<WorkerMessage>,
    pub progress: Arc<SharedProgress>,
}

/// Create channels for parallel search with the given number of workers.
pub fn create_channels(num_workers: usize) -> (CoordinatorChannels, Vec<WorkerChannels>) {
    let progress = Arc::new(SharedProgress::default());

    // Unbounded: workers send exactly one message and must never block on it
    let (worker_tx, coordinator_rx) = unbounded();

    let worker_channels = (0..num_workers)
        .map(|_| WorkerChannels {
            to_coordinator: worker_tx.clone(),
            progress: Arc::clone(&progress),
        })
        .collect();

    let coordinator = CoordinatorChannels {
        from_workers: coordinator_rx,
        progress,
    };

    (coordinator, worker_channels)
}
