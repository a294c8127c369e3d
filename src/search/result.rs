//! Search result types and statistics

use crate::digest::normalize_hex;
use std::collections::HashMap;
use std::time::Duration;

/// Lowercase hex digest -> identifier whose SHA-256 equals it.
pub type ResultMap = HashMap<String, u64>;

/// Result of a search operation
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Every target digest that was reversed
    pub found: ResultMap,
    /// Statistics from the search
    pub statistics: SearchStatistics,
}

impl SearchResult {
    /// Result of a search that dispatched no work.
    pub fn empty(statistics: SearchStatistics) -> Self {
        Self {
            found: ResultMap::new(),
            statistics,
        }
    }

    /// Identifier for `hash`, normalising case and surrounding whitespace.
    pub fn lookup(&self, hash: &str) -> Option<u64> {
        self.found.get(&normalize_hex(hash)).copied()
    }

    /// One entry per input hash, in input order. Unmatched hashes are `None`.
    pub fn align<S: AsRef<str>>(&self, hashes: &[S]) -> Vec<Option<u64>> {
        hashes.iter().map(|h| self.lookup(h.as_ref())).collect()
    }

    pub fn matched(&self) -> usize {
        self.found.len()
    }
}

/// Per-worker statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStatistics {
    pub worker_id: usize,
    pub candidates_hashed: u64,
    pub matches: usize,
}

/// Statistics from a search operation
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Upper bound of the identifier space
    pub max_id: u64,
    /// Number of workers the range was split across
    pub workers: usize,
    /// Number of distinct well-formed target digests
    pub targets: usize,
    /// Total identifiers hashed
    pub candidates_hashed: u64,
    /// Wall-clock time from dispatch to merge
    pub elapsed_time: Duration,
    pub worker_statistics: Vec<WorkerStatistics>,
}

impl SearchStatistics {
    /// Get candidates hashed per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.candidates_hashed as f64 / secs
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Max id: {}\n", self.max_id));
        s.push_str(&format!("Workers: {}\n", self.workers));
        s.push_str(&format!("Targets: {}\n", self.targets));
        s.push_str(&format!("Time: {:.2?}\n", self.elapsed_time));
        s.push_str(&format!("Candidates hashed: {}\n", self.candidates_hashed));
        s.push_str(&format!("Throughput: {:.0} hashes/s\n", self.throughput()));
        s
    }
}
