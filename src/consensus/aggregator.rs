//! Confidence aggregation across repeated OCR readings
//!
//! The same physical writing gets reread dozens of times with character-level
//! misreads ("LSREATEMACIK", "LCREATE MACIK", "CREATE MAGIK"). The aggregator
//! keeps a rolling buffer of recent readings, clusters lines across them by
//! fuzzy similarity, and exposes a ranked best-guess transcription with
//! per-line occurrence counts and confidence.

use std::collections::VecDeque;

use tracing::debug;

use super::similarity::similarity;

/// Configuration for the confidence aggregator
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Maximum number of readings kept in the rolling buffer
    pub buffer_size: usize,
    /// Minimum similarity for a line to join an existing cluster
    pub similarity_threshold: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            buffer_size: 10,
            similarity_threshold: 0.6,
        }
    }
}

/// One buffered OCR reading: lines paired with their confidences
#[derive(Debug, Clone)]
struct Reading {
    lines: Vec<(String, f64)>,
}

/// Ranked summary of one cluster of similar lines
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Representative text (the highest-confidence observation)
    pub text: String,
    /// Confidence of the representative observation
    pub confidence: f64,
    /// Number of observations in the cluster
    pub times_seen: usize,
    /// Arithmetic mean of member confidences
    pub avg_confidence: f64,
}

/// Maintains a rolling buffer of recent OCR readings and finds consensus text.
///
/// Consensus is rebuilt from scratch over the whole buffer on every ingest.
/// There is no persistent cluster identity across rebuilds; this is an
/// intentional simplicity choice so the consensus always reflects exactly the
/// current buffer contents. An incremental variant tracking cluster centroids
/// would introduce order-dependent drift and must not replace this silently.
pub struct ConfidenceAggregator {
    config: AggregatorConfig,
    buffer: VecDeque<Reading>,
    consensus: Vec<ClusterSummary>,
}

impl ConfidenceAggregator {
    /// Create an aggregator with default settings
    pub fn new() -> Self {
        Self::with_config(AggregatorConfig::default())
    }

    /// Create an aggregator with custom settings
    pub fn with_config(config: AggregatorConfig) -> Self {
        Self {
            config,
            buffer: VecDeque::new(),
            consensus: Vec::new(),
        }
    }

    /// Add a new OCR reading to the buffer and recompute consensus.
    ///
    /// Lines are trimmed and empty lines dropped; a reading with nothing left
    /// is ignored. A line with no corresponding confidence is assigned 0.5,
    /// extra confidences are ignored.
    pub fn add_reading(&mut self, lines: &[String], confidences: &[f64]) {
        let lines: Vec<(String, f64)> = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let conf = confidences.get(i).copied().unwrap_or(0.5);
                Some((trimmed.to_string(), conf))
            })
            .collect();

        if lines.is_empty() {
            return;
        }

        if self.buffer.len() >= self.config.buffer_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(Reading { lines });

        self.rebuild_consensus();
    }

    /// Rebuild clusters from the entire buffer.
    ///
    /// Greedy single pass in temporal order: oldest reading first, lines in
    /// their original order. Each line joins the first cluster whose current
    /// highest-confidence member is similar enough, otherwise starts a new
    /// cluster. Deterministic for a fixed buffer.
    fn rebuild_consensus(&mut self) {
        let mut clusters: Vec<Vec<(&str, f64)>> = Vec::new();

        for reading in &self.buffer {
            for (line, conf) in &reading.lines {
                let mut placed = false;

                for cluster in &mut clusters {
                    debug_assert!(!cluster.is_empty(), "cluster lost all members");
                    let best = cluster
                        .iter()
                        .max_by(|a, b| a.1.total_cmp(&b.1))
                        .map(|(text, _)| *text)
                        .unwrap_or_default();

                    if similarity(line, best) >= self.config.similarity_threshold {
                        cluster.push((line.as_str(), *conf));
                        placed = true;
                        break;
                    }
                }

                if !placed {
                    clusters.push(vec![(line.as_str(), *conf)]);
                }
            }
        }

        let mut consensus: Vec<ClusterSummary> = clusters
            .into_iter()
            .map(|cluster| {
                let (best_text, best_conf) = cluster
                    .iter()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .copied()
                    .expect("cluster has at least one member");
                let avg =
                    cluster.iter().map(|(_, c)| c).sum::<f64>() / cluster.len() as f64;
                ClusterSummary {
                    text: best_text.to_string(),
                    confidence: best_conf,
                    times_seen: cluster.len(),
                    avg_confidence: avg,
                }
            })
            .collect();

        // Most frequent first, confidence as tiebreak; the sort is stable so
        // full ties keep first-created cluster order.
        consensus.sort_by(|a, b| {
            b.times_seen
                .cmp(&a.times_seen)
                .then(b.confidence.total_cmp(&a.confidence))
        });

        debug!(
            readings = self.buffer.len(),
            clusters = consensus.len(),
            "rebuilt consensus"
        );

        self.consensus = consensus;
    }

    /// Best-guess text lines, most frequently seen first
    pub fn consensus_text(&self) -> Vec<String> {
        self.consensus.iter().map(|c| c.text.clone()).collect()
    }

    /// Overall aggregated confidence: mean of per-cluster average confidences
    pub fn consensus_confidence(&self) -> f64 {
        if self.consensus.is_empty() {
            return 0.0;
        }
        self.consensus.iter().map(|c| c.avg_confidence).sum::<f64>()
            / self.consensus.len() as f64
    }

    /// Full ranked cluster summaries
    pub fn details(&self) -> &[ClusterSummary] {
        &self.consensus
    }

    /// Number of readings currently buffered
    pub fn reading_count(&self) -> usize {
        self.buffer.len()
    }

    /// Reset the aggregator.
    ///
    /// Used when the whiteboard goes blank so a new writing session does not
    /// inherit stale consensus.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.consensus.clear();
    }
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self::new()
    }
}
