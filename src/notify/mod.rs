//! Notification rendering
//!
//! Turns change classifications into natural, conversational messages:
//! "I can see new text on the board: 'Project Due Monday'" instead of
//! "TEXT DETECTED (3 regions)". Rendering is a pure presentation layer on
//! top of the classification result; several equivalent phrasings exist per
//! change kind and the variant is chosen by a deterministic content hash, so
//! output never depends on an RNG and stays reproducible in tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::consensus::{ChangeClassification, ChangeKind, ClusterSummary, HistorySummary};

/// Output channel formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    /// Plain text for console logs
    Console,
    /// Markdown with bold emphasis for chat messages
    Markdown,
}

impl MessageStyle {
    fn bold(&self) -> &'static str {
        match self {
            MessageStyle::Console => "",
            MessageStyle::Markdown => "**",
        }
    }
}

/// Pick one phrasing variant, keyed by the message content
fn pick(variants: Vec<String>, salt: &str) -> String {
    debug_assert!(!variants.is_empty());
    let mut hasher = DefaultHasher::new();
    salt.hash(&mut hasher);
    let index = (hasher.finish() as usize) % variants.len();
    variants.into_iter().nth(index).expect("non-empty variants")
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Render a confirmed change as a conversational message
pub fn render_change(
    changes: &ChangeClassification,
    text_lines: &[String],
    style: MessageStyle,
) -> String {
    let b = style.bold();

    match changes.kind {
        ChangeKind::New => {
            let new_lines = &changes.new_lines;
            let mut msg = if new_lines.len() == 1 {
                let line = &new_lines[0];
                pick(
                    vec![
                        format!("I can see new text on the board: {b}{line}{b}"),
                        format!("Someone just wrote: {b}{line}{b}"),
                        format!("New writing appeared - it says {b}{line}{b}"),
                    ],
                    line,
                )
            } else {
                let first = new_lines.first().map(String::as_str).unwrap_or_default();
                let n = new_lines.len();
                pick(
                    vec![
                        format!(
                            "I see {n} new lines on the board. First one reads: {b}{first}{b}"
                        ),
                        format!(
                            "New text just appeared ({n} lines) - starts with: {b}{first}{b}"
                        ),
                        format!("Someone added {n} lines. The first says: {b}{first}{b}"),
                    ],
                    first,
                )
            };
            if style == MessageStyle::Markdown && new_lines.len() > 1 {
                for line in new_lines.iter().skip(1).take(2) {
                    msg.push_str(&format!("\n  {b}{line}{b}"));
                }
            }
            msg
        }

        ChangeKind::Edited => {
            let pairs = &changes.edited_pairs;
            let mut msg = if pairs.len() == 1 {
                let (old, new) = &pairs[0];
                pick(
                    vec![
                        format!(
                            "Looks like someone edited the board: {b}{old}{b} changed to {b}{new}{b}"
                        ),
                        format!("I noticed an edit - {b}{old}{b} is now {b}{new}{b}"),
                        format!("The text was updated: {b}{old}{b} became {b}{new}{b}"),
                    ],
                    new,
                )
            } else {
                let n = pairs.len();
                pick(
                    vec![
                        format!("A few things were edited on the board ({n} changes)"),
                        format!("I see {n} edits on the whiteboard"),
                        format!("Someone made {n} changes to the text"),
                    ],
                    &pairs[0].1,
                )
            };
            if style == MessageStyle::Markdown && pairs.len() > 1 {
                for (old, new) in pairs.iter().take(2) {
                    msg.push_str(&format!("\n  ~~{old}~~ -> {b}{new}{b}"));
                }
            }
            msg
        }

        ChangeKind::CameraMoved => {
            let preview = text_lines
                .first()
                .map(String::as_str)
                .unwrap_or("something new");
            let match_pct = format!("{:.0}%", changes.similarity * 100.0);
            pick(
                vec![
                    format!(
                        "Whoa, I think the camera moved! I'm looking at completely different text now ({match_pct} match to before). I see: {b}{preview}{b}"
                    ),
                    format!("The view changed dramatically - I'm now reading: {b}{preview}{b}"),
                    format!("Looks like I'm pointed somewhere new. Now seeing: {b}{preview}{b}"),
                ],
                preview,
            )
        }

        ChangeKind::Mixed => {
            let mut parts = Vec::new();
            if let Some(line) = changes.new_lines.first() {
                parts.push(format!("added {b}{line}{b}"));
            }
            if let Some(line) = changes.removed_lines.first() {
                parts.push(format!("removed {b}{line}{b}"));
            }
            if let Some((old, new)) = changes.edited_pairs.first() {
                parts.push(format!("changed {b}{old}{b} to {b}{new}{b}"));
            }
            let detail = parts.join(", ");
            pick(
                vec![
                    format!("The board got a makeover: {detail}"),
                    format!("Several things changed - {detail}"),
                    format!("Whiteboard update: {detail}"),
                ],
                &detail,
            )
        }

        ChangeKind::Removed => {
            let removed = &changes.removed_lines;
            if removed.len() == 1 {
                let line = &removed[0];
                pick(
                    vec![
                        format!("Someone erased: {b}{line}{b}"),
                        format!("Text was removed: {b}{line}{b}"),
                    ],
                    line,
                )
            } else {
                let n = removed.len();
                pick(
                    vec![
                        format!("{n} lines were erased from the board"),
                        format!("Looks like someone wiped {n} lines off the board"),
                    ],
                    &removed[0],
                )
            }
        }

        ChangeKind::Stable => {
            let count = text_lines.len();
            let s = plural(count);
            pick(
                vec![
                    format!("Board looks the same - still reading {count} line{s}"),
                    format!("No changes - {count} line{s} still there"),
                ],
                &count.to_string(),
            )
        }

        ChangeKind::None => {
            if let Some(first) = text_lines.first() {
                let count = text_lines.len();
                let s = plural(count);
                format!("I can read {count} line{s}: {b}{first}{b}")
            } else {
                "I don't see any text right now".to_string()
            }
        }
    }
}

/// Render a cleared-board message
pub fn render_cleared(previous: &[String], _style: MessageStyle) -> String {
    if previous.is_empty() {
        pick(
            vec![
                "I don't see any text right now".to_string(),
                "The board appears empty".to_string(),
            ],
            "empty",
        )
    } else {
        pick(
            vec![
                "Looks like the board was erased - it's blank now".to_string(),
                "The whiteboard was cleared".to_string(),
                "Everything was wiped off the board".to_string(),
            ],
            &previous[0],
        )
    }
}

/// Human-readable summary of the live aggregator consensus
pub fn render_consensus_summary(details: &[ClusterSummary]) -> String {
    if details.is_empty() {
        return "No readings yet".to_string();
    }
    let mut parts = Vec::new();
    for d in details.iter().take(5) {
        parts.push(format!(
            "  \"{}\" (seen {}x, conf {:.0}%)",
            d.text,
            d.times_seen,
            d.avg_confidence * 100.0
        ));
    }
    format!("Best reading:\n{}", parts.join("\n"))
}

/// Human-readable summary of a history consensus query
pub fn render_history_summary(summaries: &[HistorySummary]) -> String {
    if summaries.is_empty() {
        return "No text found in recent history".to_string();
    }
    let mut parts = Vec::new();
    for s in summaries {
        let min_pct = format!("{:.0}%", s.min_confidence * 100.0);
        let max_pct = format!("{:.0}%", s.max_confidence * 100.0);
        let range = if min_pct == max_pct {
            max_pct
        } else {
            format!("{min_pct}-{max_pct}")
        };
        parts.push(format!(
            "  \"{}\" - seen {}x (confidence: {range})",
            s.text, s.times_seen
        ));
    }
    parts.join("\n")
}

/// Advisory suggestions from what the text boundary can observe.
///
/// Returns an empty list when everything looks fine; throttling repeated
/// feedback is the caller's concern.
pub fn quality_feedback(avg_confidence: f64, num_regions: usize, recognized: usize) -> Vec<String> {
    let mut feedback = Vec::new();

    if avg_confidence > 0.0 && avg_confidence < 0.4 {
        feedback.push(format!(
            "Confidence is low ({:.0}%) - try adjusting lighting or moving the camera closer",
            avg_confidence * 100.0
        ));
    } else if avg_confidence >= 0.85 {
        feedback.push(format!(
            "Getting clear reads! Confidence: {:.0}%",
            avg_confidence * 100.0
        ));
    }

    if num_regions > 0 && recognized == 0 {
        feedback.push(
            "Detected text regions but couldn't read them - the text may be too blurry or at an angle"
                .to_string(),
        );
    }

    feedback
}
