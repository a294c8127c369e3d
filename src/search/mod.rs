//! Brute-force preimage search over integer identifiers
//!
//! The identifier space `[1, max_id]` is partitioned into contiguous ranges,
//! each range is hashed by its own worker thread, and the per-worker hit maps
//! are merged into a single digest -> identifier map.
//!
//! Distinct identifiers are assumed never to share a SHA-256 digest; no
//! collision handling is attempted.

pub mod parallel;
pub mod range;
pub mod result;

pub use parallel::{ParallelConfig, SearchEvent, run_parallel_search, run_search};
pub use range::{SearchRange, partition, search_range};
pub use result::{ResultMap, SearchResult, SearchStatistics, WorkerStatistics};
