//! Storage Layer
//!
//! Cross-process handoff files: the append-only reading history (JSONL) and
//! the status snapshot (JSON) that external consumers poll.

pub mod history;
pub mod status;

use std::path::PathBuf;

use thiserror::Error;

pub use history::HistoryLog;
pub use status::{write_status, StatusSnapshot};

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not determine data directory")]
    NoDataDir,
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    let proj_dirs = directories::ProjectDirs::from("com", "cashea", "boardwatch")
        .ok_or(StorageError::NoDataDir)?;

    let data_dir = proj_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Milliseconds since the Unix epoch
pub fn now_epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
