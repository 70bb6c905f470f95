//! Status snapshot file for cross-process integration
//!
//! External consumers (the chat bots) poll this JSON file instead of talking
//! to the monitor process directly. Overwritten in place on every update.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::StorageError;

/// Current monitor state as seen by external consumers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    /// Whether confirmed text is currently on the board
    pub text_detected: bool,
    /// The confirmed text lines
    pub text_content: Vec<String>,
    /// Number of text regions in the latest reading
    pub num_text_regions: usize,
    /// Snapshot time, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// Whether the monitor process is running
    pub running: bool,
    /// User running the monitor, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Host the monitor runs on, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl StatusSnapshot {
    /// A stopped-monitor snapshot, written on shutdown
    pub fn stopped(timestamp_ms: u64) -> Self {
        Self {
            text_detected: false,
            text_content: vec![],
            num_text_regions: 0,
            timestamp_ms,
            running: false,
            username: None,
            hostname: None,
        }
    }
}

/// Write the snapshot as pretty-printed JSON
pub fn write_status(path: &Path, snapshot: &StatusSnapshot) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, content)?;
    Ok(())
}
