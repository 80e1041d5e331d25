//! Simulation loop runner.
//!
//! [`Runner`] owns the renderer and drives ticks on the calling thread:
//!
//! - **Imports**: queued scene imports are applied before each tick
//! - **Tick**: the world-state phases of [`Simulation::tick`]
//! - **Capture**: armed views are rendered and their waiters woken
//! - **Hooks**: the session server drains its accept queue
//! - **Advance**: the frame counter and rate estimate move on
//!
//! Between ticks the loop sleeps to the current rate estimate, or a full
//! second when `simulation.clock_time` is set, and stops once
//! [`RunControl::request_stop`](crate::control::RunControl::request_stop)
//! has been called.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::bridge::SimulationHandle;
use crate::control::now_seconds;
use crate::render::Renderer;
use crate::tick::{TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of a finished run.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Work done once per tick on the tick thread, with the simulation locked.
///
/// The session server implements this to move freshly accepted sockets to
/// its workers.
pub trait TickHooks: Send {
    /// Called after capture and before the frame counter advances.
    fn after_tick(&mut self, summary: &TickSummary);
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHooks;

impl TickHooks for NoOpHooks {
    fn after_tick(&mut self, _summary: &TickSummary) {}
}

/// Drives ticks and owns the only renderer.
pub struct Runner<R: Renderer> {
    handle: Arc<SimulationHandle>,
    renderer: R,
}

impl<R: Renderer> Runner<R> {
    /// A runner over `handle` rendering with `renderer`.
    pub const fn new(handle: Arc<SimulationHandle>, renderer: R) -> Self {
        Self { handle, renderer }
    }

    /// The shared handle.
    pub const fn handle(&self) -> &Arc<SimulationHandle> {
        &self.handle
    }

    /// Run one full tick at wall-clock time `now`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Tick`] if the frame counter cannot advance.
    pub fn step(&mut self, now: f64, hooks: &mut dyn TickHooks) -> Result<TickSummary, RunnerError> {
        let handle = Arc::clone(&self.handle);
        let mut sim = handle.lock();

        handle.drain_imports(&mut sim, now);
        let summary = sim.tick(now);
        handle.capture_due(&sim, &mut self.renderer);
        hooks.after_tick(&summary);
        sim.advance_frame(now)?;
        drop(sim);

        handle.control().record_tick();
        if summary.births > 0 || !summary.deaths.is_empty() {
            tracing::debug!(
                frame = summary.frame,
                births = summary.births,
                deaths = summary.deaths.len(),
                live = summary.live,
                "population changed"
            );
        }
        Ok(summary)
    }

    /// Tick until a stop is requested.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if a tick fails unrecoverably.
    pub fn run(&mut self, hooks: &mut dyn TickHooks) -> Result<RunResult, RunnerError> {
        let mut result = RunResult::default();
        let clock_time = self.handle.lock().settings.clock_time;
        info!(clock_time, "simulation starting");

        while !self.handle.control().is_stop_requested() {
            let started = Instant::now();
            let summary = self.step(now_seconds(), hooks)?;
            result.total_ticks = result.total_ticks.saturating_add(1);

            let period = if clock_time {
                Duration::from_secs(1)
            } else {
                tick_period(self.handle.lock().fps())
            };
            result.final_summary = Some(summary);
            if let Some(rest) = period.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }

        info!(
            total_ticks = result.total_ticks,
            final_frame = result.final_summary.as_ref().map(|s| s.frame),
            live = result.final_summary.as_ref().map(|s| s.live),
            "simulation stopped"
        );
        Ok(result)
    }
}

/// Wall-clock length of one tick at `fps`.
fn tick_period(fps: f32) -> Duration {
    if fps > 0.0 && fps.is_finite() {
        Duration::from_secs_f32(1.0 / fps)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::thread;

    use cubeworld_types::{CubeUuid, PlayerKind};

    use super::*;
    use crate::config::CubeworldConfig;
    use crate::inbox::ImportRequest;
    use crate::render::RasterRenderer;
    use crate::tick::Simulation;
    use crate::world::tests::{add_cube, make_world};

    struct CountingHooks(u32);

    impl TickHooks for CountingHooks {
        fn after_tick(&mut self, _summary: &TickSummary) {
            self.0 = self.0.saturating_add(1);
        }
    }

    fn make_runner(default_fps: f32) -> Runner<RasterRenderer> {
        let mut config = CubeworldConfig::default();
        config.simulation.seed = Some(9);
        config.simulation.default_fps = default_fps;
        let mut sim = Simulation::new(&config, now_seconds()).unwrap();
        sim.world = make_world();
        add_cube(&mut sim.world, PlayerKind::Male, 0.0, 0.0, 100.0);
        Runner::new(Arc::new(SimulationHandle::new(sim, 2)), RasterRenderer::new())
    }

    #[test]
    fn step_runs_hooks_and_advances() {
        let mut runner = make_runner(6.5);
        let mut hooks = CountingHooks(0);
        let summary = runner.step(1.0, &mut hooks).unwrap();
        assert_eq!(summary.frame, 0);
        assert_eq!(hooks.0, 1);
        assert_eq!(runner.handle().lock().frame(), 1);
        assert_eq!(runner.handle().control().ticks(), 1);
    }

    #[test]
    fn step_applies_queued_imports_first() {
        let mut runner = make_runner(6.5);
        runner
            .handle()
            .submit_import(ImportRequest::Object(r#"{"cubes":[{"cube_index":-1,"cube_uuid":"new"}]}"#.to_owned()))
            .unwrap();
        let summary = runner.step(1.0, &mut NoOpHooks).unwrap();
        assert_eq!(summary.live, 2);
        assert!(runner.handle().lock().world.cubes.by_uuid(&CubeUuid::from("new")).is_some());
    }

    #[test]
    fn run_stops_on_request() {
        let mut runner = make_runner(200.0);
        let handle = Arc::clone(runner.handle());
        let stopper = thread::spawn(move || {
            while handle.control().ticks() < 3 {
                thread::sleep(Duration::from_millis(5));
            }
            handle.control().request_stop();
        });
        let result = runner.run(&mut NoOpHooks).unwrap();
        stopper.join().unwrap();
        assert!(result.total_ticks >= 3);
        assert!(result.final_summary.is_some());
    }

    #[test]
    fn period_follows_rate() {
        assert_eq!(tick_period(0.0), Duration::ZERO);
        assert!((tick_period(4.0).as_secs_f32() - 0.25).abs() < 1e-6);
    }
}
