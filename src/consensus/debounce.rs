//! Debounced state transitions
//!
//! Per-frame signals flicker: a single missed detection must not count as
//! "the board was erased". The tracker only confirms a transition after the
//! new value has been observed continuously for a minimum duration.

use std::time::{Duration, Instant};

/// State machine that suppresses short-lived flicker in a raw signal.
///
/// Holds a `confirmed` value and an optional pending candidate with the
/// timestamp it was first observed. The confirmed value only changes once the
/// candidate has persisted for at least the hold duration; a single differing
/// observation restarts the timer. Rapid alternation between two values never
/// confirms either.
///
/// Time is injected through `observe`, so the tracker performs no blocking
/// waits and is testable with a synthetic clock.
#[derive(Debug, Clone)]
pub struct DebounceTracker<T> {
    confirmed: T,
    pending: Option<(T, Instant)>,
    hold: Duration,
}

impl<T: Clone + PartialEq> DebounceTracker<T> {
    /// Create a tracker with the given initial confirmed value and hold time
    pub fn new(initial: T, hold: Duration) -> Self {
        Self {
            confirmed: initial,
            pending: None,
            hold,
        }
    }

    /// Feed one raw observation at time `now`.
    ///
    /// Returns the newly confirmed value when this observation completes a
    /// debounced transition, `None` otherwise. Elapsed time is computed with
    /// saturating arithmetic: a clock that moves backward reads as zero
    /// elapsed and can never confirm a transition retroactively.
    pub fn observe(&mut self, raw: T, now: Instant) -> Option<T> {
        if raw == self.confirmed {
            self.pending = None;
            return None;
        }

        match self.pending.take() {
            Some((pending, since)) if pending == raw => {
                if now.saturating_duration_since(since) >= self.hold {
                    self.confirmed = raw.clone();
                    return Some(raw);
                }
                // Still waiting; keep the original start time
                self.pending = Some((pending, since));
            }
            _ => {
                self.pending = Some((raw, now));
            }
        }

        None
    }

    /// The last confirmed value
    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    /// The candidate value currently waiting out the hold time, if any
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }
}
