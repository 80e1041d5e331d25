//! Energy and growth applied to cubes each tick.
//!
//! - Players burn `energy_cost * scale_factor / fps` just for staying in
//!   the game.
//! - Moving cubes pay `velocity * energy_factor / fps` on top.
//! - Children grow linearly to their adult size over the youth interval,
//!   then latch.
//!
//! Energy never goes below zero; reaching zero ends the cube's life.

use cubeworld_world::kinematics;

use crate::agent::Cube;
use crate::config::AgentConfig;
use crate::death::{DeathCause, kill};

/// Result of applying a vital step to a cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalTickResult {
    /// If the cube died during this step, the cause.
    pub death: Option<DeathCause>,
}

/// Idle burn for active players.
pub fn burn_energy(cube: &mut Cube, config: &AgentConfig, fps: f32, now: f64) -> VitalTickResult {
    if !cube.active || !cube.kind.is_player() || fps <= 0.0 {
        return VitalTickResult { death: None };
    }
    cube.energy = (cube.energy - config.energy_cost * cube.scale_factor / fps).max(0.0);
    if cube.energy <= 0.0 {
        kill(cube, DeathCause::Exhaustion, now);
        return VitalTickResult {
            death: Some(DeathCause::Exhaustion),
        };
    }
    VitalTickResult { death: None }
}

/// Motion cost for any active cube.
pub fn motion_cost(cube: &mut Cube, config: &AgentConfig, fps: f32, now: f64) -> VitalTickResult {
    if !cube.active || fps <= 0.0 || cube.velocity <= 0.0 {
        return VitalTickResult { death: None };
    }
    cube.energy = (cube.energy - cube.velocity * config.energy_factor / fps).max(0.0);
    if cube.energy <= 0.0 {
        kill(cube, DeathCause::Exertion, now);
        return VitalTickResult {
            death: Some(DeathCause::Exertion),
        };
    }
    VitalTickResult { death: None }
}

/// Grow a child toward its adult size. Seeded cubes (no mother) never
/// change size.
pub fn grow(cube: &mut Cube, config: &AgentConfig, now: f64) {
    if !cube.active || cube.life.mother.is_empty() {
        return;
    }
    let age = cube.age(now);
    if age < config.youth_hold_seconds {
        let scale = kinematics::youth_scale(cube.scale_factor, age, config.youth_hold_seconds);
        cube.set_scale(scale);
        cube.position.y = scale;
        cube.position_previous.y = scale;
    } else if cube.scale < cube.scale_factor {
        cube.set_scale(cube.scale_factor);
        cube.position.y = cube.scale_factor;
        cube.position_previous.y = cube.scale_factor;
    }
}

#[cfg(test)]
mod tests {
    use cubeworld_types::{CubeUuid, PlayerKind};

    use super::*;
    use crate::agent::tests::make_cube;

    const EPS: f32 = 1e-5;

    #[test]
    fn burn_scales_with_size_and_rate() {
        let config = AgentConfig::default();
        let mut cube = make_cube(0, PlayerKind::Male, 0.0, 0.0, 10.0);
        let result = burn_energy(&mut cube, &config, 6.5, 1.0);
        assert!(result.death.is_none());
        assert!((cube.energy - (10.0 - 0.01 / 6.5)).abs() < EPS);
    }

    #[test]
    fn resources_do_not_burn() {
        let config = AgentConfig::default();
        let mut cube = make_cube(0, PlayerKind::Resource, 0.0, 0.0, 10.0);
        let _ = burn_energy(&mut cube, &config, 6.5, 1.0);
        assert!((cube.energy - 10.0).abs() < EPS);
    }

    #[test]
    fn burn_to_zero_kills() {
        let config = AgentConfig::default();
        let mut cube = make_cube(0, PlayerKind::Female, 0.0, 0.0, 0.0001);
        let result = burn_energy(&mut cube, &config, 6.5, 3.0);
        assert_eq!(result.death, Some(DeathCause::Exhaustion));
        assert!(!cube.active);
        assert!(cube.energy.abs() < EPS);
    }

    #[test]
    fn motion_cost_and_death_stop_the_cube() {
        let config = AgentConfig::default();
        let mut cube = make_cube(0, PlayerKind::Predator, 0.0, 0.0, 0.1);
        cube.velocity = 5.0;
        let result = motion_cost(&mut cube, &config, 6.5, 3.0);
        assert_eq!(result.death, Some(DeathCause::Exertion));
        assert!(cube.velocity.abs() < EPS);
    }

    #[test]
    fn child_grows_then_latches() {
        let config = AgentConfig::default();
        let mut cube = make_cube(0, PlayerKind::Male, 0.0, 0.0, 10.0);
        cube.scale_factor = 0.8;
        cube.set_scale(0.0);
        cube.life.mother = CubeUuid::from("mum");
        cube.life.birth = 100.0;

        grow(&mut cube, &config, 130.0);
        assert!((cube.scale - 0.4).abs() < EPS);
        assert!((cube.position.y - 0.4).abs() < EPS);
        assert!((cube.radius - 0.4 * core::f32::consts::SQRT_2).abs() < EPS);

        grow(&mut cube, &config, 170.0);
        assert!((cube.scale - 0.8).abs() < EPS);
        grow(&mut cube, &config, 500.0);
        assert!((cube.scale - 0.8).abs() < EPS);
    }

    #[test]
    fn seeded_cubes_keep_their_size() {
        let config = AgentConfig::default();
        let mut cube = make_cube(0, PlayerKind::Male, 0.0, 0.0, 10.0);
        grow(&mut cube, &config, 1.0);
        assert!((cube.scale - 1.0).abs() < EPS);
    }
}
