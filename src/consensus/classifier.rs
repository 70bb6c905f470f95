//! Change classification between two whiteboard text states
//!
//! Compares the current effective text against the last confirmed text and
//! classifies the delta: text appeared, was edited, was erased, the camera
//! moved to a different board, or nothing of note happened.

use std::collections::HashSet;

use super::similarity::similarity;

/// What kind of change happened on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Both states empty
    None,
    /// Text appeared where there was none, or only new lines were added
    New,
    /// Only edits of existing lines
    Edited,
    /// Text disappeared, or only lines were removed
    Removed,
    /// Same text as before
    Stable,
    /// Content changed so much that treating it as an edit is inappropriate
    CameraMoved,
    /// Several kinds of change at once
    Mixed,
}

/// Verdict comparing the previous confirmed text against the current text
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeClassification {
    /// The kind of change
    pub kind: ChangeKind,
    /// Lines that appeared
    pub new_lines: Vec<String>,
    /// Lines that disappeared
    pub removed_lines: Vec<String>,
    /// (old, new) pairs of similar lines
    pub edited_pairs: Vec<(String, String)>,
    /// Jaccard similarity over the exact-match line sets (0.0-1.0)
    pub similarity: f64,
}

/// Thresholds for change classification
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Minimum similarity for an old/new line pair to count as an edit
    pub edit_threshold: f64,
    /// Jaccard similarity below which an unexplained change is a scene change
    pub camera_moved_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            edit_threshold: 0.6,
            camera_moved_threshold: 0.3,
        }
    }
}

/// Stateless change classifier
#[derive(Debug, Clone, Default)]
pub struct ChangeClassifier {
    config: ClassifierConfig,
}

impl ChangeClassifier {
    /// Create a classifier with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom thresholds
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Detect what changed between two sets of text lines.
    ///
    /// Deterministic for fixed inputs: no randomness, and candidate order
    /// follows input order. Every distinct line of both inputs ends up in
    /// exactly one of: unchanged (exact match), `new_lines`, `removed_lines`,
    /// or one side of an `edited_pairs` entry.
    pub fn classify(&self, current: &[String], previous: &[String]) -> ChangeClassification {
        if current.is_empty() && previous.is_empty() {
            return ChangeClassification {
                kind: ChangeKind::None,
                new_lines: vec![],
                removed_lines: vec![],
                edited_pairs: vec![],
                similarity: 1.0,
            };
        }

        if previous.is_empty() {
            // First detection
            return ChangeClassification {
                kind: ChangeKind::New,
                new_lines: dedup_in_order(current),
                removed_lines: vec![],
                edited_pairs: vec![],
                similarity: 0.0,
            };
        }

        if current.is_empty() {
            // Text disappeared
            return ChangeClassification {
                kind: ChangeKind::Removed,
                new_lines: vec![],
                removed_lines: dedup_in_order(previous),
                edited_pairs: vec![],
                similarity: 0.0,
            };
        }

        let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
        let previous_set: HashSet<&str> = previous.iter().map(String::as_str).collect();

        let intersection = current_set.intersection(&previous_set).count();
        let union = current_set.union(&previous_set).count();
        let jaccard = if union > 0 {
            intersection as f64 / union as f64
        } else {
            0.0
        };

        // Previous lines with no exact match are candidates for removal until
        // an edit pair consumes them.
        let mut removed_lines: Vec<String> = dedup_in_order(previous)
            .into_iter()
            .filter(|line| !current_set.contains(line.as_str()))
            .collect();

        let mut new_lines: Vec<String> = Vec::new();
        let mut edited_pairs: Vec<(String, String)> = Vec::new();
        let mut consumed: HashSet<usize> = HashSet::new();

        for curr_line in dedup_in_order(current) {
            if previous_set.contains(curr_line.as_str()) {
                continue; // Exact match - stable
            }

            // Find the most similar previous line not already accounted for,
            // either by an exact match or by an earlier edit pair
            let mut best_match: Option<usize> = None;
            let mut best_similarity = 0.0;
            for (i, prev_line) in previous.iter().enumerate() {
                if consumed.contains(&i) || current_set.contains(prev_line.as_str()) {
                    continue;
                }
                let sim = similarity(&curr_line, prev_line);
                if sim > best_similarity {
                    best_similarity = sim;
                    best_match = Some(i);
                }
            }

            match best_match {
                Some(i) if best_similarity > self.config.edit_threshold => {
                    consumed.insert(i);
                    let old = previous[i].clone();
                    removed_lines.retain(|line| line != &old);
                    edited_pairs.push((old, curr_line));
                }
                _ => new_lines.push(curr_line),
            }
        }

        let kind = if jaccard < self.config.camera_moved_threshold && edited_pairs.is_empty() {
            // Low overlap not explained by edits: the scene itself changed
            ChangeKind::CameraMoved
        } else if !new_lines.is_empty() && removed_lines.is_empty() && edited_pairs.is_empty() {
            ChangeKind::New
        } else if !edited_pairs.is_empty() && new_lines.is_empty() && removed_lines.is_empty() {
            ChangeKind::Edited
        } else if !removed_lines.is_empty() && new_lines.is_empty() && edited_pairs.is_empty() {
            ChangeKind::Removed
        } else if current == previous {
            ChangeKind::Stable
        } else if !new_lines.is_empty() || !removed_lines.is_empty() || !edited_pairs.is_empty() {
            ChangeKind::Mixed
        } else {
            // Same line set, different order or duplicates
            ChangeKind::Stable
        };

        ChangeClassification {
            kind,
            new_lines,
            removed_lines,
            edited_pairs,
            similarity: jaccard,
        }
    }
}

/// Distinct lines of `lines`, keeping first-seen order
fn dedup_in_order(lines: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    lines
        .iter()
        .filter(|line| seen.insert(line.as_str()))
        .cloned()
        .collect()
}
