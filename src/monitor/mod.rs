//! Whiteboard Monitor
//!
//! Owns the per-stream mutable state: the confidence aggregator, the
//! debounced detection tracker, and the last confirmed text. One monitor per
//! whiteboard stream; readings are processed inline on a single owner with
//! time injected by the caller, so there is no internal locking and no
//! ambient global state.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::AppConfig;
use crate::consensus::{
    AggregatorConfig, ChangeClassification, ChangeClassifier, ClassifierConfig, ClusterSummary,
    ConfidenceAggregator, DebounceTracker,
};

/// One decoded OCR pass, as delivered by the upstream pipeline
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RawReading {
    /// Recognized text lines
    #[serde(default)]
    pub text_lines: Vec<String>,
    /// Per-line recognition confidence
    #[serde(default)]
    pub confidences: Vec<f64>,
    /// Number of text regions detected in the frame
    #[serde(default)]
    pub num_regions: usize,
}

/// Outcome of ingesting one reading
#[derive(Debug)]
pub struct Ingest {
    /// Lines that survived the confidence and length filters
    pub kept_lines: Vec<String>,
    /// Confidences for the kept lines
    pub kept_confidences: Vec<f64>,
    /// Mean confidence of the kept lines (0.0 if none)
    pub avg_confidence: f64,
    /// Confirmed transition, if this reading completed one
    pub event: Option<MonitorEvent>,
}

/// A confirmed whiteboard state transition
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Text is present and stably different from the last confirmed text
    Changed {
        classification: ChangeClassification,
        /// The text that is now confirmed (consensus when available)
        text: Vec<String>,
        /// Ranked cluster details backing the consensus
        details: Vec<ClusterSummary>,
    },
    /// The board went stably blank
    Cleared {
        /// The text that was confirmed before the board was cleared
        previous: Vec<String>,
    },
}

/// Drives consensus, smoothing, debouncing and change classification for one
/// whiteboard stream.
pub struct WhiteboardMonitor {
    aggregator: ConfidenceAggregator,
    classifier: ChangeClassifier,
    detector: DebounceTracker<bool>,
    detection_window: VecDeque<bool>,
    smoothing_window: usize,
    min_confidence: f64,
    min_line_length: usize,
    last_confirmed: Vec<String>,
}

impl WhiteboardMonitor {
    /// Create a monitor from application settings
    pub fn new(config: &AppConfig) -> Self {
        Self {
            aggregator: ConfidenceAggregator::with_config(AggregatorConfig {
                buffer_size: config.consensus.buffer_size,
                similarity_threshold: config.consensus.similarity_threshold,
            }),
            classifier: ChangeClassifier::with_config(ClassifierConfig {
                edit_threshold: config.consensus.edit_threshold,
                camera_moved_threshold: config.consensus.camera_moved_threshold,
            }),
            detector: DebounceTracker::new(
                false,
                Duration::from_secs_f64(config.consensus.debounce_seconds),
            ),
            detection_window: VecDeque::new(),
            smoothing_window: config.consensus.smoothing_window.max(1),
            min_confidence: config.reader.min_confidence,
            min_line_length: config.reader.min_line_length,
            last_confirmed: Vec::new(),
        }
    }

    /// Apply runtime-mutable reader settings without restarting
    pub fn set_min_confidence(&mut self, min_confidence: f64) {
        self.min_confidence = min_confidence;
    }

    /// Ingest one reading at time `now`.
    ///
    /// Filters lines, feeds the aggregator, advances the smoothed detection
    /// signal through the debounce tracker, and classifies the change when a
    /// transition is confirmed.
    pub fn process_reading(&mut self, reading: &RawReading, now: Instant) -> Ingest {
        let (kept_lines, kept_confidences) = self.filter_lines(reading);

        let avg_confidence = if kept_confidences.is_empty() {
            0.0
        } else {
            kept_confidences.iter().sum::<f64>() / kept_confidences.len() as f64
        };

        let text_detected = !kept_lines.is_empty();
        if self.detection_window.len() >= self.smoothing_window {
            self.detection_window.pop_front();
        }
        self.detection_window.push_back(text_detected);

        if text_detected {
            self.aggregator.add_reading(&kept_lines, &kept_confidences);
        }

        // Majority vote over the recent frames, ties counting as detected
        let votes = self.detection_window.iter().filter(|v| **v).count();
        let smoothed = votes * 2 >= self.detection_window.len();

        let event = match self.detector.observe(smoothed, now) {
            Some(true) => {
                // Prefer the aggregated consensus over the raw frame
                let consensus = self.aggregator.consensus_text();
                let effective = if consensus.is_empty() {
                    kept_lines.clone()
                } else {
                    consensus
                };

                let classification = self.classifier.classify(&effective, &self.last_confirmed);
                debug!(kind = ?classification.kind, lines = effective.len(), "confirmed change");

                self.last_confirmed = effective.clone();
                Some(MonitorEvent::Changed {
                    classification,
                    text: effective,
                    details: self.aggregator.details().to_vec(),
                })
            }
            Some(false) => {
                let previous = std::mem::take(&mut self.last_confirmed);
                // A new writing session must not inherit stale consensus
                self.aggregator.clear();
                debug!("confirmed blank board");
                Some(MonitorEvent::Cleared { previous })
            }
            None => None,
        };

        Ingest {
            kept_lines,
            kept_confidences,
            avg_confidence,
            event,
        }
    }

    fn filter_lines(&self, reading: &RawReading) -> (Vec<String>, Vec<f64>) {
        let mut lines = Vec::new();
        let mut confidences = Vec::new();

        for (i, raw) in reading.text_lines.iter().enumerate() {
            let trimmed = raw.trim();
            if trimmed.chars().count() < self.min_line_length {
                continue;
            }
            let conf = reading.confidences.get(i).copied().unwrap_or(0.5);
            if conf < self.min_confidence {
                continue;
            }
            lines.push(trimmed.to_string());
            confidences.push(conf);
        }

        (lines, confidences)
    }

    /// The last confirmed text lines
    pub fn last_confirmed(&self) -> &[String] {
        &self.last_confirmed
    }

    /// Whether text presence is currently confirmed
    pub fn text_detected(&self) -> bool {
        *self.detector.confirmed()
    }

    /// Current best-guess transcription from the aggregator
    pub fn consensus_text(&self) -> Vec<String> {
        self.aggregator.consensus_text()
    }

    /// Overall aggregated confidence
    pub fn consensus_confidence(&self) -> f64 {
        self.aggregator.consensus_confidence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::ChangeKind;

    fn reading(texts: &[&str], conf: f64) -> RawReading {
        RawReading {
            text_lines: texts.iter().map(|t| t.to_string()).collect(),
            confidences: vec![conf; texts.len()],
            num_regions: texts.len(),
        }
    }

    fn monitor() -> WhiteboardMonitor {
        WhiteboardMonitor::new(&AppConfig::default())
    }

    #[test]
    fn test_text_appearance_confirms_after_debounce() {
        let mut m = monitor();
        let t0 = Instant::now();

        let r = reading(&["exam friday"], 0.9);
        assert!(m.process_reading(&r, t0).event.is_none());
        assert!(m
            .process_reading(&r, t0 + Duration::from_secs(1))
            .event
            .is_none());

        let ingest = m.process_reading(&r, t0 + Duration::from_secs(2));
        match ingest.event {
            Some(MonitorEvent::Changed {
                classification,
                text,
                ..
            }) => {
                assert_eq!(classification.kind, ChangeKind::New);
                assert_eq!(text, vec!["exam friday".to_string()]);
            }
            other => panic!("expected Changed event, got {other:?}"),
        }
        assert!(m.text_detected());
        assert_eq!(m.last_confirmed(), &["exam friday".to_string()]);
    }

    #[test]
    fn test_blank_board_confirms_cleared_and_resets_consensus() {
        let mut m = monitor();
        let t0 = Instant::now();
        let r = reading(&["exam friday"], 0.9);

        for i in 0..3 {
            m.process_reading(&r, t0 + Duration::from_secs(i));
        }
        assert!(m.text_detected());

        // The smoothing window needs a few blank frames before the majority
        // flips, then the debounce hold starts
        let blank = RawReading::default();
        let mut cleared = None;
        for i in 3..10 {
            let ingest = m.process_reading(&blank, t0 + Duration::from_secs(i));
            if ingest.event.is_some() {
                cleared = ingest.event;
                break;
            }
        }

        match cleared {
            Some(MonitorEvent::Cleared { previous }) => {
                assert_eq!(previous, vec!["exam friday".to_string()]);
            }
            other => panic!("expected Cleared event, got {other:?}"),
        }
        assert!(!m.text_detected());
        assert!(m.last_confirmed().is_empty());
        assert!(m.consensus_text().is_empty());
    }

    #[test]
    fn test_single_frame_flicker_is_suppressed() {
        let mut m = monitor();
        let t0 = Instant::now();
        let r = reading(&["exam friday"], 0.9);

        for i in 0..5 {
            m.process_reading(&r, t0 + Duration::from_secs(i));
        }
        assert!(m.text_detected());

        // One dropped frame: majority vote still says detected, no event
        let ingest = m.process_reading(&RawReading::default(), t0 + Duration::from_secs(5));
        assert!(ingest.event.is_none());

        let ingest = m.process_reading(&r, t0 + Duration::from_secs(6));
        assert!(ingest.event.is_none());
        assert!(m.text_detected());
    }

    #[test]
    fn test_low_confidence_lines_are_filtered() {
        let mut m = monitor();
        let r = RawReading {
            text_lines: vec!["solid line".to_string(), "ghost".to_string()],
            confidences: vec![0.9, 0.1],
            num_regions: 2,
        };

        let ingest = m.process_reading(&r, Instant::now());
        assert_eq!(ingest.kept_lines, vec!["solid line".to_string()]);
        assert_eq!(ingest.kept_confidences, vec![0.9]);
        assert!((ingest.avg_confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_short_fragments_are_filtered() {
        let mut m = monitor();
        let r = RawReading {
            text_lines: vec!["ab".to_string(), "  x ".to_string(), "abc".to_string()],
            confidences: vec![0.9, 0.9, 0.9],
            num_regions: 3,
        };

        let ingest = m.process_reading(&r, Instant::now());
        assert_eq!(ingest.kept_lines, vec!["abc".to_string()]);
    }

    #[test]
    fn test_runtime_confidence_update_applies() {
        let mut m = monitor();
        m.set_min_confidence(0.95);

        let ingest = m.process_reading(&reading(&["exam friday"], 0.9), Instant::now());
        assert!(ingest.kept_lines.is_empty());
    }

    #[test]
    fn test_consensus_smooths_noisy_reads_into_change_event() {
        let mut m = monitor();
        let t0 = Instant::now();

        m.process_reading(&reading(&["LSREATEMACIK"], 0.85), t0);
        m.process_reading(
            &reading(&["LCREATE MACIK"], 0.87),
            t0 + Duration::from_secs(1),
        );
        let ingest = m.process_reading(
            &reading(&["CREATE MAGIK"], 0.92),
            t0 + Duration::from_secs(2),
        );

        match ingest.event {
            Some(MonitorEvent::Changed { text, details, .. }) => {
                assert_eq!(text, vec!["CREATE MAGIK".to_string()]);
                assert_eq!(details[0].times_seen, 3);
            }
            other => panic!("expected Changed event, got {other:?}"),
        }
    }

    #[test]
    fn test_rewritten_text_after_clearing_announces_as_new() {
        let mut m = monitor();
        let t0 = Instant::now();

        // Confirm the initial text
        let original = reading(&["CREATE MAGIK"], 0.9);
        for i in 0..3 {
            m.process_reading(&original, t0 + Duration::from_secs(i));
        }
        assert_eq!(m.last_confirmed(), &["CREATE MAGIK".to_string()]);

        // Clear the board long enough to confirm, wiping the aggregator
        let blank = RawReading::default();
        for i in 3..10 {
            m.process_reading(&blank, t0 + Duration::from_secs(i));
        }
        assert!(!m.text_detected());

        // The corrected text appears; the confirmed text was reset on
        // clearing, so this classifies as new rather than an edit
        let edited = reading(&["CREATE MAGIC"], 0.9);
        let mut change = None;
        for i in 10..20 {
            let ingest = m.process_reading(&edited, t0 + Duration::from_secs(i));
            if let Some(event) = ingest.event {
                change = Some(event);
                break;
            }
        }

        match change {
            Some(MonitorEvent::Changed { classification, .. }) => {
                assert_eq!(classification.kind, ChangeKind::New);
            }
            other => panic!("expected Changed event, got {other:?}"),
        }
    }
}
