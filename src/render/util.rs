//! Render utility helpers.
//!
//! Small and dependency-light:
//! - a monotonic frame clock that supplies "now" to the cycle controller
//! - numeric helpers for animation

use std::time::{Duration, Instant};

/// Monotonic clock for the frame loop.
///
/// The controller works in `Duration`s since the clock started, so a resumed-from-breakpoint
/// jump only advances the cycle; it never runs it backwards.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Duration since this clock was created (or last reset).
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Restart the clock from zero.
    #[inline]
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(110.0, -110.0, 0.0), 110.0);
        assert_eq!(lerp(110.0, -110.0, 0.5), 0.0);
        assert_eq!(lerp(110.0, -110.0, 1.0), -110.0);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut clock = FrameClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
        clock.reset();
        assert!(clock.elapsed() <= b + Duration::from_secs(1));
    }
}
