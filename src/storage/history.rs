//! Append-only reading history in JSON Lines format
//!
//! One complete JSON object per line, one line per detection event. The
//! format allows time-based analysis and consensus queries over recent
//! readings without holding anything in memory between processes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::warn;

use super::StorageError;
use crate::consensus::HistoryRecord;

/// Append-only JSONL log of whiteboard readings
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Create a log handle for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record as a single JSON line
    pub fn append(&self, record: &HistoryRecord) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read the most recent `n` records, oldest first.
    ///
    /// Lines that fail to parse are skipped with a warning; a partially
    /// corrupted log still yields every intact record. A missing file reads
    /// as an empty history.
    pub fn read_recent(&self, n: usize) -> Result<Vec<HistoryRecord>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<HistoryRecord> = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping malformed history line: {e}"),
            }
        }

        if records.len() > n {
            records.drain(..records.len() - n);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(ts: u64, text: &str) -> HistoryRecord {
        HistoryRecord {
            timestamp_ms: ts,
            text_lines: vec![text.to_string()],
            num_regions: 1,
            avg_confidence: 0.8,
        }
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let log = HistoryLog::new(dir.path().join("history.jsonl"));
        assert!(log.read_recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let log = HistoryLog::new(dir.path().join("history.jsonl"));

        log.append(&record(1, "exam friday")).unwrap();
        log.append(&record(2, "room 204")).unwrap();

        let records = log.read_recent(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp_ms, 1);
        assert_eq!(records[1].text_lines, vec!["room 204".to_string()]);
    }

    #[test]
    fn test_read_recent_keeps_newest_oldest_first() {
        let dir = TempDir::new().unwrap();
        let log = HistoryLog::new(dir.path().join("history.jsonl"));

        for i in 0..15 {
            log.append(&record(i, &format!("line {i}"))).unwrap();
        }

        let records = log.read_recent(10).unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(records.first().unwrap().timestamp_ms, 5);
        assert_eq!(records.last().unwrap().timestamp_ms, 14);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");
        let log = HistoryLog::new(&path);

        log.append(&record(1, "good")).unwrap();
        std::fs::write(
            &path,
            format!(
                "{}\nnot json at all\n{}\n",
                serde_json::to_string(&record(1, "good")).unwrap(),
                serde_json::to_string(&record(2, "also good")).unwrap()
            ),
        )
        .unwrap();

        let records = log.read_recent(10).unwrap();
        assert_eq!(records.len(), 2);
    }
}
