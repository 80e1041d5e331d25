//! Run control shared by the tick thread, the session workers and the
//! binary.
//!
//! All fields are atomics so the tick loop can poll them without taking
//! the simulation lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Stop flag and tick counter.
#[derive(Debug)]
pub struct RunControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wall-clock time when the run started.
    started_at: DateTime<Utc>,

    /// Ticks completed by the run loop.
    ticks: AtomicU64,
}

impl RunControl {
    /// Control state for a run starting now.
    pub fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            started_at: Utc::now(),
            ticks: AtomicU64::new(0),
        }
    }

    /// Request a clean stop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Count one finished tick.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Ticks finished so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Seconds since the run started.
    pub fn elapsed_seconds(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock seconds since the Unix epoch, the time base of every
/// birth, death and waypoint.
pub fn now_seconds() -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let micros = Utc::now().timestamp_micros() as f64;
    micros / 1_000_000.0
}
