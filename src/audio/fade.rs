//! Time-based linear fade-out state.
//!
//! A fade is armed once (capturing the volume at that moment) and then
//! advanced by the engine's periodic `update` calls. The ramp itself lives
//! here; stopping and removal stay with the registry.

use std::time::{Duration, Instant};

/// Progress of a single advance step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeProgress {
    /// Fade still running; the contained value is the volume to apply now.
    Ramping(f32),
    /// Elapsed time reached the duration; the sound should be stopped.
    Done,
}

/// Fade-out state for one sound instance.
#[derive(Debug, Clone, Copy)]
pub struct FadeState {
    started_at: Instant,
    duration: Duration,
    original_volume: f32,
}

impl FadeState {
    /// Arm a fade starting at `now`, ramping down from `volume`.
    pub fn arm(now: Instant, duration_ms: u64, volume: f32) -> Self {
        Self {
            started_at: now,
            duration: Duration::from_millis(duration_ms),
            original_volume: volume,
        }
    }

    /// Compute the fade position at `now`.
    ///
    /// A zero duration reports `Done` on the first advance, since any
    /// elapsed time (including zero) has already reached it. Uses saturating
    /// arithmetic so a tick observed before the arming timestamp cannot
    /// underflow.
    pub fn advance(&self, now: Instant) -> FadeProgress {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed >= self.duration {
            return FadeProgress::Done;
        }

        let ratio = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        FadeProgress::Ramping(self.original_volume * (1.0 - ratio))
    }
}
