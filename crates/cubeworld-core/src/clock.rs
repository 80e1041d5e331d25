//! Frame clock and frame-rate estimation.
//!
//! The clock is the single source of truth for the frame counter that
//! responses report and view requests wait on. It also owns the estimate of
//! frames per second that every per-tick rate (`1 / fps`) is derived from.
//!
//! # Rate estimation
//!
//! - Until tick 3 completes the rate is the configured default.
//! - At tick 3 a bootstrap measures the wall-clock rate of the first ticks
//!   and picks either the default (below the threshold) or 60.
//! - Afterwards, every time a full window (60 seconds by default) has
//!   elapsed, the rate becomes ticks-in-window / window length.

use crate::config::SimulationSettings;

/// Ticks after which the bootstrap estimate is taken.
const BOOTSTRAP_TICKS: u64 = 3;

/// Rate chosen by the bootstrap for fast hosts.
const FAST_FPS: f32 = 60.0;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Frame counter would overflow.
    #[error("frame counter overflow: cannot advance beyond u64::MAX")]
    FrameOverflow,

    /// Invalid clock configuration.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Frame counter plus rate estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    /// Ticks completed so far.
    frame: u64,
    /// Current frames-per-second estimate.
    fps: f32,
    /// Rate used before and after the bootstrap.
    default_fps: f32,
    /// Bootstrap decision point.
    bootstrap_threshold: f32,
    /// Length of the rolling window, seconds.
    window_seconds: f64,
    /// When the clock started, seconds since the epoch.
    started_at: f64,
    /// When the current window started.
    window_start: f64,
    /// Ticks counted in the current window.
    window_ticks: u64,
}

impl FrameClock {
    /// Create a clock at frame 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the default rate is not
    /// positive or the window is empty.
    pub fn new(settings: &SimulationSettings, now: f64) -> Result<Self, ClockError> {
        if settings.default_fps <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: "default_fps must be positive".to_owned(),
            });
        }
        if settings.fps_window_seconds == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "fps_window_seconds must be at least 1".to_owned(),
            });
        }
        #[allow(clippy::cast_precision_loss)]
        let window_seconds = settings.fps_window_seconds as f64;
        Ok(Self {
            frame: 0,
            fps: settings.default_fps,
            default_fps: settings.default_fps,
            bootstrap_threshold: settings.fps_bootstrap_threshold,
            window_seconds,
            started_at: now,
            window_start: now,
            window_ticks: 0,
        })
    }

    /// Current frame counter.
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Current frames-per-second estimate.
    pub const fn fps(&self) -> f32 {
        self.fps
    }

    /// Override the rate (tests and fixed-rate hosts).
    pub const fn set_fps(&mut self, fps: f32) {
        self.fps = fps;
    }

    /// Count one completed tick at wall-clock time `now` and update the rate
    /// estimate. Returns the new frame counter.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::FrameOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self, now: f64) -> Result<u64, ClockError> {
        self.frame = self.frame.checked_add(1).ok_or(ClockError::FrameOverflow)?;
        self.window_ticks = self.window_ticks.saturating_add(1);

        if self.frame == BOOTSTRAP_TICKS {
            let elapsed = now - self.started_at;
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let measured = if elapsed > 0.0 {
                (self.frame as f64 / elapsed) as f32
            } else {
                f32::INFINITY
            };
            self.fps = if measured < self.bootstrap_threshold {
                self.default_fps
            } else {
                FAST_FPS
            };
            tracing::info!(measured, fps = self.fps, "preset frames per second");
        }

        let window = now - self.window_start;
        if window >= self.window_seconds {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let fps = (self.window_ticks as f64 / window) as f32;
            if fps > 0.0 {
                self.fps = fps;
            }
            tracing::info!(fps = self.fps, "tick loop rate");
            self.window_ticks = 0;
            self.window_start = now;
        }

        Ok(self.frame)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_clock() -> FrameClock {
        FrameClock::new(&SimulationSettings::default(), 1000.0).unwrap()
    }

    #[test]
    fn starts_at_default_rate() {
        let clock = make_clock();
        assert_eq!(clock.frame(), 0);
        assert!((clock.fps() - 6.5).abs() < f32::EPSILON);
    }

    #[test]
    fn slow_bootstrap_keeps_default() {
        let mut clock = make_clock();
        for t in 1..=3 {
            clock.advance(1000.0 + f64::from(t)).unwrap();
        }
        assert_eq!(clock.frame(), 3);
        assert!((clock.fps() - 6.5).abs() < f32::EPSILON);
    }

    #[test]
    fn fast_bootstrap_picks_sixty() {
        let mut clock = make_clock();
        for t in 1..=3 {
            clock.advance(1000.0 + f64::from(t) * 0.001).unwrap();
        }
        assert!((clock.fps() - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn window_sets_measured_rate() {
        let mut clock = make_clock();
        for t in 1..=700 {
            clock.advance(1000.0 + f64::from(t) * 0.1).unwrap();
        }
        assert!((clock.fps() - 10.0).abs() < 0.1);
    }

    #[test]
    fn rejects_nonpositive_default() {
        let settings = SimulationSettings {
            default_fps: 0.0,
            ..SimulationSettings::default()
        };
        assert!(FrameClock::new(&settings, 0.0).is_err());
    }
}
