//! The render bridge: state shared between the tick thread and the session
//! workers.
//!
//! A [`SimulationHandle`] bundles the simulation lock, the capture
//! barriers, the import inbox and the run control. Session workers use it
//! to validate requests, pose cubes for a view and wait for pixels. The
//! tick thread uses it to render armed views and apply queued imports.
//!
//! Lock order is always simulation first, then a barrier. A view request
//! releases the simulation lock before it waits.

use std::time::Duration;

use glam::Vec2;
use parking_lot::{Mutex, MutexGuard};

use cubeworld_types::CubeUuid;
use cubeworld_world::kinematics;

use crate::capture::{CaptureError, CaptureRegistry, ViewImage};
use crate::control::RunControl;
use crate::inbox::{ImportInbox, ImportRequest, InboxError};
use crate::render::{Camera, Renderer};
use crate::tick::Simulation;

/// Everything the tick thread and the session workers share.
#[derive(Debug)]
pub struct SimulationHandle {
    sim: Mutex<Simulation>,
    captures: CaptureRegistry,
    inbox: ImportInbox,
    control: RunControl,
    view_timeout: Duration,
}

impl SimulationHandle {
    /// Wrap a simulation. Barriers are sized to its cube and ground tables.
    pub fn new(sim: Simulation, inbox_capacity: usize) -> Self {
        let captures = CaptureRegistry::new(sim.world.cubes.capacity(), sim.world.grounds.capacity());
        let view_timeout = Duration::from_millis(sim.render.view_timeout_ms);
        Self {
            sim: Mutex::new(sim),
            captures,
            inbox: ImportInbox::new(inbox_capacity),
            control: RunControl::new(),
            view_timeout,
        }
    }

    /// Take the simulation lock.
    pub fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.sim.lock()
    }

    /// The capture barriers.
    pub const fn captures(&self) -> &CaptureRegistry {
        &self.captures
    }

    /// Run control.
    pub const fn control(&self) -> &RunControl {
        &self.control
    }

    /// Queue a scene import for the tick thread.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError`] if the inbox is full or closed.
    pub fn submit_import(&self, request: ImportRequest) -> Result<(), InboxError> {
        self.inbox.submit(request)
    }

    /// Pose `uuid` with `yaw` and `gaze`, then wait for a first-person frame
    /// rendered at least `capture_delay` ticks from now.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::UnknownCube`] if no cube has the uuid, or
    /// [`CaptureError::ScreenViewNotAllowed`] unless the cube is active,
    /// displayed and bound to a client.
    pub fn first_person_view(&self, uuid: &CubeUuid, yaw: f32, gaze: Vec2) -> Result<ViewImage, CaptureError> {
        let barrier = {
            let mut sim = self.sim.lock();
            let start = sim.frame().saturating_add(sim.render.capture_delay);
            let label = sim.world.label_camera();
            let fov = sim.render.perspective_fov;
            let (width, height) = (sim.render.view_width, sim.render.view_height);
            let rotation = sim.display_rotation();

            let cube = sim
                .world
                .cubes
                .by_uuid_mut(uuid)
                .ok_or_else(|| CaptureError::UnknownCube(uuid.clone()))?;
            if !(cube.active && cube.display && cube.remote) {
                return Err(CaptureError::ScreenViewNotAllowed(uuid.clone()));
            }
            cube.set_yaw(yaw);
            cube.gaze = gaze;

            let projection = kinematics::perspective(fov, width, height);
            let bbox = kinematics::bounding_box(cube.model(rotation), label.view(), projection, width, height);
            let bbox = kinematics::flip_bounding_box(bbox, height);

            let barrier = self
                .captures
                .cube(cube.index)
                .ok_or_else(|| CaptureError::ScreenViewNotAllowed(uuid.clone()))?;
            barrier.arm(start, bbox);
            tracing::debug!(cube = cube.index, start, "first-person view armed");
            barrier
        };
        Ok(barrier.wait(self.view_timeout))
    }

    /// Wait for a frame of ground `index` seen from its view preset.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::GroundViewNotAllowed`] unless the ground
    /// exists and is active, displayed and enabled for viewing.
    pub fn ground_view(&self, index: i64) -> Result<ViewImage, CaptureError> {
        let not_allowed = CaptureError::GroundViewNotAllowed { index };
        let barrier = {
            let sim = self.sim.lock();
            let start = sim.frame().saturating_add(sim.render.capture_delay);
            let slot = usize::try_from(index).ok();
            let viewable = slot
                .and_then(|s| sim.world.grounds.get(s))
                .is_some_and(cubeworld_world::Ground::viewable);
            let barrier = slot
                .and_then(|s| self.captures.ground(s))
                .filter(|_| viewable)
                .ok_or(not_allowed)?;
            barrier.arm(start, [0.0; 4]);
            tracing::debug!(ground = index, start, "ground view armed");
            barrier
        };
        Ok(barrier.wait(self.view_timeout))
    }

    /// Render every armed view whose start frame has been reached. Called by
    /// the tick thread with the simulation locked. Returns the number of
    /// frames captured.
    pub fn capture_due(&self, sim: &Simulation, renderer: &mut dyn Renderer) -> usize {
        let frame = sim.frame();
        let render = &sim.render;
        let window = &sim.world.window;
        let rotation = sim.display_rotation();
        let mut captured = 0_usize;

        for index in self.captures.due_cubes(frame) {
            let (Some(cube), Some(barrier)) = (sim.world.cubes.get(index), self.captures.cube(index)) else {
                continue;
            };
            let camera = Camera::first_person(cube, render.perspective_fov, render.view_width, render.view_height, rotation);
            if barrier.capture_if_due(frame, |buf| {
                renderer.render(&sim.world, &camera, render.view_width, render.view_height, window.channels, buf);
            }) {
                captured = captured.saturating_add(1);
            }
        }

        for index in self.captures.due_grounds(frame) {
            let (Some(ground), Some(barrier)) = (sim.world.grounds.get(index), self.captures.ground(index)) else {
                continue;
            };
            let camera = Camera::preset(&ground.view, render.perspective_fov, window.width, window.height, rotation);
            if barrier.capture_if_due(frame, |buf| {
                renderer.render(&sim.world, &camera, window.width, window.height, window.channels, buf);
            }) {
                captured = captured.saturating_add(1);
            }
        }

        if captured > 0 {
            tracing::trace!(frame, captured, "views captured");
        }
        captured
    }

    /// Apply every queued import. Called by the tick thread between ticks.
    /// Returns the number applied without error.
    pub fn drain_imports(&self, sim: &mut Simulation, now: f64) -> usize {
        let mut applied = 0_usize;
        for request in self.inbox.drain() {
            match sim.apply_import(&request, now) {
                Ok(summary) => {
                    tracing::info!(request = %request.describe(), cubes = summary.cubes, "scene import applied");
                    applied = applied.saturating_add(1);
                }
                Err(e) => {
                    tracing::warn!(request = %request.describe(), error = %e, "scene import failed");
                }
            }
        }
        applied
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use cubeworld_types::{PixelMode, PlayerKind};

    use super::*;
    use crate::config::CubeworldConfig;
    use crate::render::RasterRenderer;
    use crate::world::tests::{add_cube, make_world};

    fn make_handle(capture_delay: u64) -> Arc<SimulationHandle> {
        let mut config = CubeworldConfig::default();
        config.simulation.seed = Some(3);
        config.simulation.strategy_enabled = false;
        config.render.capture_delay = capture_delay;
        config.render.view_width = 32;
        config.render.view_height = 24;
        config.render.window_width = 40;
        config.render.window_height = 30;
        let mut sim = Simulation::new(&config, 0.0).unwrap();
        let window = sim.world.window.clone();
        sim.world = make_world();
        sim.world.window = window;
        add_cube(&mut sim.world, PlayerKind::Male, 0.0, 0.0, 100.0);
        add_cube(&mut sim.world, PlayerKind::Female, 4.0, 4.0, 100.0);
        Arc::new(SimulationHandle::new(sim, 4))
    }

    /// Tick in the background until `stop` is requested.
    fn spawn_ticker(handle: &Arc<SimulationHandle>) -> thread::JoinHandle<()> {
        let handle = Arc::clone(handle);
        thread::spawn(move || {
            let mut renderer = RasterRenderer::new();
            let mut now = 0.0;
            while !handle.control().is_stop_requested() {
                {
                    let mut sim = handle.lock();
                    sim.tick(now);
                    handle.capture_due(&sim, &mut renderer);
                    sim.advance_frame(now).unwrap();
                }
                now += 0.1;
                thread::sleep(Duration::from_millis(2));
            }
        })
    }

    #[test]
    fn unknown_and_unbound_cubes_are_refused() {
        let handle = make_handle(0);
        assert_eq!(
            handle.first_person_view(&CubeUuid::from("ghost"), 0.0, Vec2::ZERO),
            Err(CaptureError::UnknownCube(CubeUuid::from("ghost")))
        );
        assert!(matches!(
            handle.first_person_view(&CubeUuid::from("male-0"), 0.0, Vec2::ZERO),
            Err(CaptureError::ScreenViewNotAllowed(_))
        ));
    }

    #[test]
    fn ground_view_needs_a_login() {
        let handle = make_handle(0);
        assert!(matches!(handle.ground_view(0), Err(CaptureError::GroundViewNotAllowed { index: 0 })));
        assert!(matches!(handle.ground_view(-1), Err(CaptureError::GroundViewNotAllowed { .. })));
        handle.lock().world.login(&CubeUuid::from("male-0"));
        assert!(matches!(handle.ground_view(7), Err(CaptureError::GroundViewNotAllowed { .. })));
    }

    #[test]
    fn view_poses_cube_and_returns_fresh_pixels() {
        let handle = make_handle(2);
        let uuid = CubeUuid::from("male-0");
        handle.lock().world.login(&uuid);
        let ticker = spawn_ticker(&handle);

        let requested_at = handle.lock().frame();
        let first = handle.first_person_view(&uuid, 1.0, Vec2::new(0.1, 0.0)).unwrap();
        let second = handle.first_person_view(&uuid, 1.0, Vec2::ZERO).unwrap();
        handle.control().request_stop();
        ticker.join().unwrap();

        assert!(!first.timed_out);
        assert!(first.pixels_frame.unwrap() >= requested_at + 2);
        assert!(second.pixels_frame.unwrap() > first.pixels_frame.unwrap());
        assert_eq!((first.width, first.height, first.channels), (32, 24, 3));
        assert_eq!(first.mode, PixelMode::Bgr);
        assert_eq!(first.pixels.len(), 32 * 24 * 3);

        let sim = handle.lock();
        let cube = sim.world.cubes.get(0).unwrap();
        assert!((cube.yaw() - 1.0).abs() < f32::EPSILON);
        assert!(cube.gaze.x.abs() < f32::EPSILON);
    }

    #[test]
    fn view_bounding_box_lies_inside_the_image() {
        let handle = make_handle(0);
        let uuid = CubeUuid::from("male-0");
        handle.lock().world.login(&uuid);
        let ticker = spawn_ticker(&handle);
        let image = handle.first_person_view(&uuid, 0.0, Vec2::ZERO).unwrap();
        handle.control().request_stop();
        ticker.join().unwrap();

        let [x0, y0, x1, y1] = image.bounding_box;
        assert!(x1 > x0 && y1 > y0, "empty box {:?}", image.bounding_box);
        assert!((0.0..=32.0).contains(&x0) && (0.0..=32.0).contains(&x1));
        assert!((0.0..=24.0).contains(&y0) && (0.0..=24.0).contains(&y1));
    }

    #[test]
    fn ground_view_renders_window_size() {
        let handle = make_handle(0);
        handle.lock().world.login(&CubeUuid::from("male-0"));
        let ticker = spawn_ticker(&handle);
        let image = handle.ground_view(0).unwrap();
        handle.control().request_stop();
        ticker.join().unwrap();

        assert!(!image.timed_out);
        assert_eq!((image.width, image.height), (40, 30));
        assert_eq!(image.pixels.len(), 40 * 30 * 3);
    }

    #[test]
    fn queued_imports_apply_between_ticks() {
        let handle = make_handle(0);
        handle
            .submit_import(ImportRequest::Object(
                r#"{"cubes":[{"cube_index":-1,"cube_uuid":"imported"}]}"#.to_owned(),
            ))
            .unwrap();
        handle.submit_import(ImportRequest::Object("broken".to_owned())).unwrap();
        let mut sim = handle.lock();
        assert_eq!(handle.drain_imports(&mut sim, 1.0), 1);
        assert!(sim.world.cubes.by_uuid(&CubeUuid::from("imported")).is_some());
    }
}
