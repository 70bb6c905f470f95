//! Text Consensus Layer
//!
//! The algorithmic core: converges noisy, frame-by-frame OCR readings of the
//! same physical writing into a single best-guess transcription, decides when
//! the board state has stably changed, and classifies how it changed.
//!
//! Everything in this layer is synchronous and free of I/O; time enters only
//! through injected `Instant`s, so the whole layer is testable with a
//! synthetic clock.

pub mod aggregator;
pub mod classifier;
pub mod debounce;
pub mod history;
pub mod similarity;

pub use aggregator::{AggregatorConfig, ClusterSummary, ConfidenceAggregator};
pub use classifier::{ChangeClassification, ChangeClassifier, ChangeKind, ClassifierConfig};
pub use debounce::DebounceTracker;
pub use history::{summarize_history, HistoryRecord, HistorySummary};
pub use similarity::similarity;
