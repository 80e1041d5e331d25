//! Per-tick motion: stepping, blocking, backing up, and steering.
//!
//! Positions integrate once per tick by `velocity / fps` along the cube's
//! heading. A cube never leaves the playfield square: a step that would end
//! outside it is clamped to the edge and the cube is blocked.

use glam::{Vec2, Vec3};
use rand::Rng;

use cubeworld_types::{PlayerKind, WaypointEvent};
use cubeworld_world::kinematics;

use crate::agent::Cube;
use crate::config::AgentConfig;
use crate::error::AgentError;

/// A remote movement order, already decoded from the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveCommand {
    /// New facing yaw.
    pub angle: f32,
    /// Travel heading used when `direction_active`.
    pub direction: f32,
    /// Travel along `direction` instead of the facing yaw.
    pub direction_active: bool,
    /// Requested speed; capped at the configured maximum.
    pub velocity: f32,
    /// Distance to travel; 0 means unlimited.
    pub distance: f32,
    /// Absolute gaze (yaw, pitch).
    pub gaze: Vec2,
}

/// Advance a cube by one tick. `bound` is the playfield half-extent; `None`
/// means no ground is loaded.
pub fn update_position(cube: &mut Cube, bound: Option<f32>, fps: f32, now: f64) {
    if !cube.active || cube.velocity <= 0.0 || cube.energy <= 0.0 || fps <= 0.0 {
        return;
    }

    cube.position_previous = cube.position;
    cube.distance_previous = cube.distance;

    if let Some(half) = bound
        && !kinematics::within_bounds(cube.position, half)
    {
        stop_blocked(cube, now);
        return;
    }

    let speed = cube.velocity;
    let mut step = 1.0 / fps;
    if cube.distance > 0.0 {
        step = step.min(cube.distance);
        cube.distance -= step;
        if cube.distance <= 0.0 {
            cube.velocity = 0.0;
        }
    }

    let delta = kinematics::heading_step(cube.heading(), speed * step);
    cube.position.x += delta.x;
    cube.position.z += delta.y;

    if let Some(half) = bound
        && !kinematics::within_bounds(cube.position, half)
    {
        cube.position = kinematics::clamp_to_bounds(cube.position, half);
        stop_blocked(cube, now);
    }
}

fn stop_blocked(cube: &mut Cube, now: f64) {
    cube.velocity = 0.0;
    cube.position_blocked = true;
    cube.record_waypoint(WaypointEvent::Blocked, now);
}

/// Undo the last step of a moving cube that still overlaps another.
///
/// Resources, inactive cubes and cubes mid-backup are left alone.
pub fn block_position(cube: &mut Cube, now: f64) {
    if !cube.active || cube.kind == PlayerKind::Resource {
        return;
    }
    if cube.backup_timer > 0 || cube.velocity <= 0.0 {
        return;
    }
    cube.position = cube.position_previous;
    cube.distance = cube.distance_previous;
    stop_blocked(cube, now);
}

/// Apply a remote movement order and take one step.
///
/// # Errors
///
/// Returns [`AgentError::NotActive`] if the cube is out of the game.
pub fn remote_move(
    cube: &mut Cube,
    command: &MoveCommand,
    config: &AgentConfig,
    bound: Option<f32>,
    fps: f32,
    now: f64,
) -> Result<(), AgentError> {
    if !cube.active {
        return Err(AgentError::NotActive(cube.uuid.clone()));
    }
    if command.direction_active {
        cube.position_blocked = false;
    }
    cube.set_yaw(command.angle);
    cube.direction = command.direction;
    cube.direction_active = command.direction_active;
    cube.distance = command.distance;
    cube.velocity = command.velocity.min(config.velocity_max);
    cube.gaze = command.gaze;
    cube.record_waypoint(WaypointEvent::Movement, now);
    update_position(cube, bound, fps, now);
    Ok(())
}

/// Face a target position and close in at a tenth of the distance per
/// second.
pub fn move_toward(cube: &mut Cube, target: Vec3) {
    let dx = target.x - cube.position.x;
    let dz = target.z - cube.position.z;
    cube.direction_active = false;
    cube.set_yaw(kinematics::find_angle(dz, dx));
    cube.velocity = dx.hypot(dz) / 10.0;
}

/// Stop and forget every pursuit.
pub const fn rest(cube: &mut Cube) {
    cube.targets.clear();
    cube.velocity = 0.0;
}

/// Run or start a backup manoeuvre. Returns `true` while the strategy
/// should yield to it.
///
/// A blocked cube turns to a random heading behind it, faces away from it
/// and reverses for `backup_seconds`.
pub fn backup_active<R: Rng>(cube: &mut Cube, config: &AgentConfig, rng: &mut R, fps: f32, now: f64) -> bool {
    if cube.backup_timer > 0 {
        cube.backup_timer = cube.backup_timer.saturating_sub(1);
        return true;
    }
    if !cube.position_blocked {
        return false;
    }
    let pi = core::f32::consts::PI;
    let u: f32 = rng.random();
    cube.direction = pi.mul_add(u + 0.5, cube.yaw());
    cube.direction_active = true;
    cube.set_yaw(cube.direction + pi);
    let u2: f32 = rng.random();
    cube.velocity = u2 + 0.5;
    cube.backup_timer = backup_ticks(config.backup_seconds, fps);
    cube.position_blocked = false;
    cube.record_waypoint(WaypointEvent::Reverse, now);
    true
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn backup_ticks(seconds: f32, fps: f32) -> u32 {
    (seconds * fps).round().max(0.0) as u32
}
