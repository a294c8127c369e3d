//! Error types shared by the search core and the tabular I/O layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    /// A worker thread terminated abnormally. The whole search is abandoned.
    #[error("Worker {worker_id} failed: {message}")]
    WorkerFailure { worker_id: usize, message: String },

    #[error("Failed to spawn worker {worker_id}: {source}")]
    WorkerSpawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Column '{0}' not found in the input header")]
    ColumnNotFound(String),

    #[error("Input file contains no hashes: {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FinderError>;
