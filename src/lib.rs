//! Recover small integer identifiers from their SHA-256 digests.
//!
//! The core is [`search::run_search`]: every identifier in `[1, max_id]` is
//! hashed as its decimal string across a pool of worker threads, and each
//! target digest that matches is mapped back to its identifier.

pub mod config;
pub mod digest;
pub mod error;
pub mod search;
pub mod table;

pub use config::Config;
pub use digest::{TargetSet, id_hash_hex};
pub use error::{FinderError, Result};
pub use search::{ParallelConfig, ResultMap, SearchEvent, SearchResult, run_search};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
