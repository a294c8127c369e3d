//! Configuration for parallel search execution.

use crate::search::parallel::channel::SearchEvent;
use crossbeam_channel::Sender;
use std::time::Duration;

/// Candidates a worker hashes between two progress counter updates.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Configuration for parallel search execution.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of worker threads to spawn.
    pub num_workers: usize,
    /// Candidates hashed between progress counter updates.
    pub progress_interval: u64,
    /// How often the coordinator publishes a progress event.
    pub progress_tick: Duration,
    /// Where progress and lifecycle events are sent, if anywhere.
    pub events: Option<Sender<SearchEvent>>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            progress_tick: Duration::from_millis(100),
            events: None,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel config with the specified number of workers.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    /// Set the worker count from an Option (`None` keeps the CPU count).
    pub fn with_workers_option(self, num_workers: Option<usize>) -> Self {
        match num_workers {
            Some(n) => self.with_workers(n),
            None => self,
        }
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn with_progress_tick(mut self, tick: Duration) -> Self {
        self.progress_tick = tick;
        self
    }

    /// Publish search events on `sender`.
    pub fn with_events(mut self, sender: Sender<SearchEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Send an event if a listener is attached. A dropped listener is ignored.
    pub(crate) fn emit(&self, event: SearchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
