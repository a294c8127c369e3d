//! Parallel search execution across worker threads.
//!
//! # Architecture
//!
//! The parallel search system consists of:
//! - A **coordinator** that partitions the id space, spawns one worker thread
//!   per range and merges their results after a join barrier
//! - Multiple **workers** that hash their range against a shared, read-only
//!   target set
//! - A **channel system** carrying finished maps from workers to the
//!   coordinator, and lifecycle/progress events from the coordinator to any
//!   listener
//! - A **shared progress counter** so progress can be reported without
//!   channel traffic from the hot loop
//!
//! # Example
//!
//! ```ignore
//! use idfind::search::parallel::{ParallelConfig, run_parallel_search};
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let config = ParallelConfig::default()
//!     .with_workers(4)
//!     .with_events(tx);
//!
//! let result = run_parallel_search(&hashes, 5_000_000, &config)?;
//! ```

pub mod channel;
pub mod config;
pub mod coordinator;

pub use channel::SearchEvent;
pub use config::ParallelConfig;
pub use coordinator::{run_parallel_search, run_search};
