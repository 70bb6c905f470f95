//! Frequency consensus over the durable reading history
//!
//! A simpler, auditable secondary view: unlike the live aggregator this
//! groups by exact case-folded text (no fuzzy matching) and operates over
//! persisted records rather than the in-memory rolling buffer. Used for
//! on-demand queries against the history log.

use serde::{Deserialize, Serialize};

/// One durable log entry: a single detection event.
///
/// Append-only; never mutated after being written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    /// Capture time, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// Recognized text lines
    pub text_lines: Vec<String>,
    /// Number of text regions detected in the frame
    pub num_regions: usize,
    /// Average confidence across recognitions in this reading
    pub avg_confidence: f64,
}

/// Frequency summary for one distinct (case-folded) text
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    /// The case-folded text
    pub text: String,
    /// Number of records the text appeared in
    pub times_seen: usize,
    /// Lowest average confidence among those records
    pub min_confidence: f64,
    /// Highest average confidence among those records
    pub max_confidence: f64,
}

/// Rank the most frequent texts across the given records.
///
/// Records are expected in oldest-first order and are already limited to the
/// query window by the caller. Lines are grouped by exact case-folded text;
/// each distinct text tracks the range of per-record average confidences it
/// was seen with. Ranking is occurrence count descending; ties keep
/// first-seen order (stable sort), so the result is deterministic.
pub fn summarize_history(records: &[HistoryRecord], top_k: usize) -> Vec<HistorySummary> {
    let mut summaries: Vec<HistorySummary> = Vec::new();

    for record in records {
        for line in &record.text_lines {
            let folded = line.to_lowercase();
            match summaries.iter_mut().find(|s| s.text == folded) {
                Some(entry) => {
                    entry.times_seen += 1;
                    entry.min_confidence = entry.min_confidence.min(record.avg_confidence);
                    entry.max_confidence = entry.max_confidence.max(record.avg_confidence);
                }
                None => summaries.push(HistorySummary {
                    text: folded,
                    times_seen: 1,
                    min_confidence: record.avg_confidence,
                    max_confidence: record.avg_confidence,
                }),
            }
        }
    }

    summaries.sort_by(|a, b| b.times_seen.cmp(&a.times_seen));
    summaries.truncate(top_k);
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(texts: &[&str], conf: f64) -> HistoryRecord {
        HistoryRecord {
            timestamp_ms: 0,
            text_lines: texts.iter().map(|t| t.to_string()).collect(),
            num_regions: texts.len(),
            avg_confidence: conf,
        }
    }

    #[test]
    fn test_empty_history() {
        assert!(summarize_history(&[], 5).is_empty());
    }

    #[test]
    fn test_repeated_text_counts_and_confidence_range() {
        let records = vec![
            record(&["exam friday"], 0.72),
            record(&["exam friday"], 0.88),
            record(&["exam friday"], 0.80),
        ];

        let summary = summarize_history(&records, 5);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].text, "exam friday");
        assert_eq!(summary[0].times_seen, 3);
        assert!((summary[0].min_confidence - 0.72).abs() < 1e-9);
        assert!((summary[0].max_confidence - 0.88).abs() < 1e-9);
    }

    #[test]
    fn test_grouping_is_case_folded() {
        let records = vec![
            record(&["Exam Friday"], 0.8),
            record(&["EXAM FRIDAY"], 0.9),
        ];

        let summary = summarize_history(&records, 5);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].text, "exam friday");
        assert_eq!(summary[0].times_seen, 2);
    }

    #[test]
    fn test_grouping_is_exact_not_fuzzy() {
        // One misread character: a different group here, unlike the live
        // aggregator's fuzzy clustering
        let records = vec![
            record(&["exam friday"], 0.8),
            record(&["exan friday"], 0.8),
        ];

        let summary = summarize_history(&records, 5);
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_ranked_by_frequency_with_first_seen_tiebreak() {
        let records = vec![
            record(&["room 204", "exam friday"], 0.8),
            record(&["exam friday"], 0.8),
            record(&["bring notes"], 0.8),
        ];

        let summary = summarize_history(&records, 5);
        assert_eq!(summary[0].text, "exam friday");
        // "room 204" and "bring notes" tie at 1; first seen wins
        assert_eq!(summary[1].text, "room 204");
        assert_eq!(summary[2].text, "bring notes");
    }

    #[test]
    fn test_top_k_truncation() {
        let records = vec![record(&["a", "b", "c", "d", "e", "f", "g"], 0.8)];
        let summary = summarize_history(&records, 5);
        assert_eq!(summary.len(), 5);
    }

    #[test]
    fn test_single_record_collapses_range() {
        let records = vec![record(&["exam friday"], 0.85)];
        let summary = summarize_history(&records, 5);
        assert!((summary[0].min_confidence - summary[0].max_confidence).abs() < 1e-9);
    }
}
