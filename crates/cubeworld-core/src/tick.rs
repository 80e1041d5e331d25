//! Tick cycle: one pass of the simulation loop.
//!
//! [`Simulation::tick`] advances world state in a fixed order:
//!
//! 1. **Growth** -- children grow toward their adult size.
//! 2. **Burn** -- players pay the idle energy cost; exhausted cubes die.
//! 3. **Position** -- movers step along their heading and are clamped and
//!    blocked at the playfield edge.
//! 4. **Contact** -- the event table is dispatched over every overlapping
//!    pair, then movers that still overlap are rolled back.
//! 5. **Strategy** -- cubes without a client run their built-in policy.
//! 6. **Motion cost** -- movers pay for their speed.
//!
//! Capturing armed views and advancing the frame counter close the tick;
//! both belong to the run loop because they need the renderer and the
//! accept queue (see [`crate::runner`]).

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use cubeworld_agents::{AgentConfig, DeathCause, motion, vitals};
use cubeworld_types::PlayerKind;
use cubeworld_world::SceneRecord;
use cubeworld_world::kinematics::DISPLAY_ROTATION_STEP_DEGREES;

use crate::clock::{ClockError, FrameClock};
use crate::config::{CubeworldConfig, RenderConfig, SimulationSettings};
use crate::contact;
use crate::inbox::ImportRequest;
use crate::scene_loader::{self, SceneError, SceneSummary};
use crate::strategy;
use crate::world::World;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    /// Frame counter while the tick ran.
    pub frame: u64,
    /// Rate the tick used for per-second quantities.
    pub fps: f32,
    /// Children born.
    pub births: usize,
    /// Cubes that left the game, with the cause.
    pub deaths: Vec<(usize, DeathCause)>,
    /// Fights resolved.
    pub fights: usize,
    /// Resource draws.
    pub feeds: usize,
    /// Overlapping pairs found by the blocking pass.
    pub overlaps: usize,
    /// Cubes still in the game at the end of the tick.
    pub live: usize,
}

/// The mutable simulation state, owned by the tick thread and lent to
/// session workers under the simulation lock.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Cubes and scenery.
    pub world: World,
    /// Frame counter and rate.
    pub clock: FrameClock,
    /// Per-cube rule parameters.
    pub agent: AgentConfig,
    /// Tick loop settings.
    pub settings: SimulationSettings,
    /// Render and capture settings.
    pub render: RenderConfig,
    rng: SmallRng,
    /// Accumulated display rotation angle, degrees.
    display_angle: f32,
    /// Wall-clock time of the last tick.
    last_tick: f64,
}

impl Simulation {
    /// An empty world at frame 0.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if the simulation settings are invalid.
    pub fn new(config: &CubeworldConfig, now: f64) -> Result<Self, TickError> {
        let clock = FrameClock::new(&config.simulation, now)?;
        let mut world = World::new(&config.capacity);
        world.window.width = config.render.window_width;
        world.window.height = config.render.window_height;
        world.window.channels = config.render.channels;

        let rng = match config.simulation.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        Ok(Self {
            world,
            clock,
            agent: config.agent_config(),
            settings: config.simulation.clone(),
            render: config.render.clone(),
            rng,
            display_angle: 0.0,
            last_tick: now,
        })
    }

    /// Current frame counter.
    pub const fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Current frames-per-second estimate.
    pub const fn fps(&self) -> f32 {
        self.clock.fps()
    }

    /// Wall-clock seconds of the last tick, stamped on responses.
    pub const fn last_tick(&self) -> f64 {
        self.last_tick
    }

    /// Display-only rotation applied to cube models in rendered output.
    pub fn display_rotation(&self) -> Vec3 {
        self.render.rotation.rotation(self.display_angle)
    }

    /// Apply a scene record.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] for the first bad slot; earlier sections stay
    /// applied.
    pub fn apply_scene(&mut self, scene: &SceneRecord, now: f64) -> Result<SceneSummary, SceneError> {
        scene_loader::apply_scene(&mut self.world, scene, now)
    }

    /// Apply one deferred import.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if the file cannot be read, the text does not
    /// parse, or a slot is bad.
    pub fn apply_import(&mut self, request: &ImportRequest, now: f64) -> Result<SceneSummary, SceneError> {
        let scene = match request {
            ImportRequest::File(path) => scene_loader::read_scene_file(path)?,
            ImportRequest::Object(text) => SceneRecord::from_json(text)?,
        };
        self.apply_scene(&scene, now)
    }

    /// Run the world-state phases of one tick at wall-clock time `now`.
    pub fn tick(&mut self, now: f64) -> TickSummary {
        let fps = self.clock.fps();
        let bound = self.world.bound();
        self.last_tick = now;
        let mut deaths = Vec::new();

        // --- Growth ---
        for cube in self.world.cubes.iter_mut() {
            vitals::grow(cube, &self.agent, now);
        }

        // --- Burn ---
        for cube in self.world.cubes.iter_mut() {
            if let Some(cause) = vitals::burn_energy(cube, &self.agent, fps, now).death {
                deaths.push((cube.index, cause));
            }
        }

        // --- Position ---
        for cube in self.world.cubes.iter_mut() {
            motion::update_position(cube, bound, fps, now);
        }

        // --- Contact ---
        let before = active_flags(&self.world);
        let report = contact::resolve_contacts(&mut self.world, &mut self.rng, &self.agent, now);
        let overlaps = contact::block_overlaps(&mut self.world, now);
        departures(&self.world, &before, &mut deaths, |kind| match kind {
            PlayerKind::Resource => DeathCause::Depleted,
            _ => DeathCause::Defeated,
        });

        // --- Strategy ---
        let before = active_flags(&self.world);
        strategy::run_strategies(&mut self.world, &self.settings, &mut self.rng, &self.agent, fps, now);
        departures(&self.world, &before, &mut deaths, |_| DeathCause::Retired);

        // --- Motion cost ---
        for cube in self.world.cubes.iter_mut() {
            if let Some(cause) = vitals::motion_cost(cube, &self.agent, fps, now).death {
                deaths.push((cube.index, cause));
            }
        }

        self.display_angle = (self.display_angle + DISPLAY_ROTATION_STEP_DEGREES) % 360.0;

        let summary = TickSummary {
            frame: self.clock.frame(),
            fps,
            births: report.births,
            deaths,
            fights: report.fights,
            feeds: report.feeds,
            overlaps,
            live: self.world.live_count(),
        };
        tracing::trace!(
            frame = summary.frame,
            births = summary.births,
            deaths = summary.deaths.len(),
            live = summary.live,
            "tick complete"
        );
        summary
    }

    /// Count the finished tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if the frame counter would overflow.
    pub fn advance_frame(&mut self, now: f64) -> Result<u64, TickError> {
        Ok(self.clock.advance(now)?)
    }
}

fn active_flags(world: &World) -> Vec<bool> {
    world.cubes.iter().map(|c| c.active).collect()
}

/// Record cubes that were active in `before` and are not any more.
fn departures(world: &World, before: &[bool], deaths: &mut Vec<(usize, DeathCause)>, cause: impl Fn(PlayerKind) -> DeathCause) {
    for (cube, was_active) in world.cubes.iter().zip(before) {
        if *was_active && !cube.active {
            deaths.push((cube.index, cause(cube.kind)));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use core::f32::consts::FRAC_PI_2;

    use cubeworld_types::{CubeUuid, WaypointEvent};

    use super::*;
    use crate::world::tests::{add_cube, make_world};

    /// A seeded simulation on a 10x10 ground with strategies off, so only
    /// the rules under test move anything.
    fn make_sim() -> Simulation {
        let mut config = CubeworldConfig::default();
        config.simulation.seed = Some(42);
        config.simulation.strategy_enabled = false;
        let mut sim = Simulation::new(&config, 0.0).unwrap();
        sim.world = make_world();
        sim
    }

    #[test]
    fn mating_happy_path_adds_a_growing_child() {
        let mut sim = make_sim();
        let m = add_cube(&mut sim.world, PlayerKind::Male, 0.0, 0.0, 400.0);
        let f = add_cube(&mut sim.world, PlayerKind::Female, 0.1, 0.0, 400.0);
        for i in [m, f] {
            sim.world.cubes.get_mut(i).unwrap().set_scale(0.5);
        }

        let summary = sim.tick(90.0);
        assert_eq!(summary.births, 1);
        assert_eq!(sim.world.cubes.len(), 3);

        let child = sim.world.cubes.get(2).unwrap();
        assert!((child.energy - 400.0).abs() < 0.01);
        assert!(child.scale.abs() < f32::EPSILON);
        for i in [m, f] {
            assert!((sim.world.cubes.get(i).unwrap().energy - 200.0).abs() < 0.01);
        }

        // part the parents so they do not mate again
        sim.world.cubes.get_mut(m).unwrap().position.x = 5.0;
        sim.tick(150.0);
        let child = sim.world.cubes.get(2).unwrap();
        assert!((child.scale - child.scale_factor).abs() < 1e-5);
    }

    #[test]
    fn incest_produces_no_child() {
        let mut sim = make_sim();
        let x = add_cube(&mut sim.world, PlayerKind::Male, 0.0, 0.0, 400.0);
        let d = add_cube(&mut sim.world, PlayerKind::Female, 0.1, 0.0, 400.0);
        let father = sim.world.cubes.get(x).unwrap().uuid.clone();
        sim.world.cubes.get_mut(d).unwrap().life.father = father;

        let summary = sim.tick(90.0);
        assert_eq!(summary.births, 0);
        assert_eq!(sim.world.cubes.len(), 2);
        for i in [x, d] {
            assert!(sim.world.cubes.get(i).unwrap().energy > 399.9);
        }
    }

    #[test]
    fn resource_transfer_is_capped() {
        let mut sim = make_sim();
        let p = add_cube(&mut sim.world, PlayerKind::Enby, 0.0, 0.0, 900.0);
        let r = add_cube(&mut sim.world, PlayerKind::Resource, 0.5, 0.0, 500.0);

        let summary = sim.tick(10.0);
        assert_eq!(summary.feeds, 1);
        assert!((sim.world.cubes.get(p).unwrap().energy - 1000.0).abs() < 0.01);
        assert!((sim.world.cubes.get(r).unwrap().energy - 300.0).abs() < 0.01);
    }

    #[test]
    fn out_of_bounds_step_is_blocked() {
        let mut sim = make_sim();
        let a = add_cube(&mut sim.world, PlayerKind::Male, 9.9, 0.0, 400.0);
        {
            let cube = sim.world.cubes.get_mut(a).unwrap();
            cube.set_yaw(FRAC_PI_2);
            cube.velocity = 5.0;
        }

        sim.tick(10.0);
        let cube = sim.world.cubes.get(a).unwrap();
        assert!(cube.position.x <= 10.0);
        assert!(cube.velocity.abs() < f32::EPSILON);
        assert!(cube.position_blocked);
        assert_eq!(cube.waypoints.last().map(|w| w.event), Some(WaypointEvent::Blocked));
    }

    #[test]
    fn exhausted_player_dies_in_burn() {
        let mut sim = make_sim();
        let a = add_cube(&mut sim.world, PlayerKind::Female, 0.0, 0.0, 0.0001);
        let summary = sim.tick(10.0);
        assert_eq!(summary.deaths, vec![(a, DeathCause::Exhaustion)]);
        assert_eq!(summary.live, 0);
    }

    #[test]
    fn defeated_predator_is_reported() {
        let mut sim = make_sim();
        let p = add_cube(&mut sim.world, PlayerKind::Male, 0.0, 0.0, 100.0);
        let r = add_cube(&mut sim.world, PlayerKind::Predator, 0.5, 0.0, 100.0);
        sim.world.cubes.get_mut(r).unwrap().scale_factor = 0.5;
        sim.world.cubes.get_mut(r).unwrap().set_scale(0.5);

        let summary = sim.tick(10.0);
        assert_eq!(summary.fights, 1);
        assert!(sim.world.cubes.get(p).unwrap().active);
        assert!(summary.deaths.contains(&(r, DeathCause::Defeated)));
    }

    #[test]
    fn strategies_drive_unbound_cubes_only() {
        let mut config = CubeworldConfig::default();
        config.simulation.seed = Some(1);
        let mut sim = Simulation::new(&config, 0.0).unwrap();
        sim.world = make_world();
        let m = add_cube(&mut sim.world, PlayerKind::Male, -5.0, 0.0, 10.0);
        let bound = add_cube(&mut sim.world, PlayerKind::Male, 5.0, 5.0, 10.0);
        add_cube(&mut sim.world, PlayerKind::Resource, -5.0, 4.0, 500.0);
        sim.world.login(&CubeUuid::from(format!("male-{bound}")));

        sim.tick(10.0);
        assert!(sim.world.cubes.get(m).unwrap().velocity > 0.0);
        assert!(sim.world.cubes.get(bound).unwrap().velocity.abs() < f32::EPSILON);
    }

    #[test]
    fn imports_apply_inline_scenes() {
        let mut sim = make_sim();
        let request = ImportRequest::Object(r#"{"cubes":[{"cube_index":-1,"cube_uuid":"late"}]}"#.to_owned());
        let summary = sim.apply_import(&request, 5.0).unwrap();
        assert_eq!(summary.cubes, 1);
        assert!(sim.world.cubes.by_uuid(&CubeUuid::from("late")).is_some());

        let bad = ImportRequest::Object("not json".to_owned());
        assert!(matches!(sim.apply_import(&bad, 5.0), Err(SceneError::Json { .. })));
    }

    #[test]
    fn advancing_counts_frames() {
        let mut sim = make_sim();
        assert_eq!(sim.frame(), 0);
        sim.tick(1.0);
        assert_eq!(sim.advance_frame(1.0).unwrap(), 1);
        assert_eq!(sim.frame(), 1);
    }

    #[test]
    fn window_takes_render_size() {
        let config = CubeworldConfig::default();
        let sim = Simulation::new(&config, 0.0).unwrap();
        assert_eq!(sim.world.window.width, config.render.window_width);
        assert_eq!(sim.world.window.channels, 4);
    }
}
