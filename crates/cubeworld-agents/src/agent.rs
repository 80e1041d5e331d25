//! The cube: identity, pose, motion, energy, lineage and ledgers.
//!
//! A [`Cube`] is created either from a scene record (seed cubes) or by
//! mating (children). It keeps its uuid and slot index for its whole life;
//! death only clears `active` and `display`.

use glam::{Mat4, Vec2, Vec3, Vec4};

use cubeworld_types::{CubeUuid, PlayerKind, WaypointEvent};
use cubeworld_world::kinematics;
use cubeworld_world::scene::CubeRecord;

/// Pursuit targets, as roster indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Targets {
    /// Male a female is courting.
    pub male: Option<usize>,
    /// Opponent being hunted or fled to.
    pub matched: Option<usize>,
    /// Resource being foraged.
    pub resource: Option<usize>,
}

impl Targets {
    /// Forget every target.
    pub const fn clear(&mut self) {
        *self = Self {
            male: None,
            matched: None,
            resource: None,
        };
    }
}

/// Parentage and mating history. Lineage is stored by uuid only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lineage {
    /// Father's uuid; empty for seeded cubes.
    pub father: CubeUuid,
    /// Mother's uuid; empty for seeded cubes.
    pub mother: CubeUuid,
    /// Birth time, seconds since the epoch.
    pub birth: f64,
    /// Death time, seconds since the epoch; 0 while alive.
    pub death: f64,
    /// Partners, in mating order.
    pub mates: Vec<CubeUuid>,
    /// Mating times, parallel to `mates`.
    pub mate_times: Vec<f64>,
    /// Energy given to each child, parallel to `mates`.
    pub mate_energies: Vec<f32>,
    /// Children, in birth order.
    pub children: Vec<CubeUuid>,
}

impl Lineage {
    /// Time of the most recent mating, if any.
    pub fn last_mate_time(&self) -> Option<f64> {
        self.mate_times.last().copied()
    }
}

/// One fight between a player and a predator, seen from one side.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// The other party.
    pub opponent: CubeUuid,
    /// When it happened.
    pub time: f64,
    /// Energy credited to this side.
    pub energy: f32,
    /// Whether this side survived.
    pub won: bool,
}

/// One draw of energy from a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    /// The resource drawn from.
    pub resource: CubeUuid,
    /// When it happened.
    pub time: f64,
    /// Energy actually gained.
    pub energy: f32,
}

/// One entry of the motion history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// When it was recorded.
    pub time: f64,
    /// What happened.
    pub event: WaypointEvent,
    /// Position at that moment.
    pub position: Vec3,
    /// Blocked flag at that moment.
    pub blocked: bool,
}

/// A participant in the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    // Identity
    /// Slot in the roster.
    pub index: usize,
    /// Stable identifier.
    pub uuid: CubeUuid,
    /// Kind, fixed at birth.
    pub kind: PlayerKind,
    /// Emoticon code point used for the face texture.
    pub emoticon: String,
    /// Display name.
    pub firstname: String,

    // Lifecycle
    /// Participating in the simulation.
    pub active: bool,
    /// Visible.
    pub display: bool,
    /// Bound to a client session.
    pub remote: bool,

    // Appearance
    /// Adult size.
    pub scale_factor: f32,
    /// Current size; below `scale_factor` while growing.
    pub scale: f32,
    /// Draw style.
    pub cube_type: i32,
    /// Colour class label.
    pub color_class: String,
    /// Fill colour.
    pub color: Vec4,
    /// Material slot.
    pub material: i32,
    /// Surface label.
    pub surface: String,
    /// Texture slot.
    pub texture_index: i32,
    /// Per-face texture coordinates.
    pub texture_map: Vec<f32>,

    // Spatial
    /// Centre; Y equals `scale`.
    pub position: Vec3,
    /// Centre before the last step, for rollback.
    pub position_previous: Vec3,
    /// Euler rotation; `rotation.y` is the facing yaw.
    pub rotation: Vec3,
    /// First-person gaze offsets (yaw, pitch).
    pub gaze: Vec2,
    /// Half-diagonal in XZ.
    pub radius: f32,
    /// Current speed.
    pub velocity: f32,
    /// Remaining travel distance; 0 means unlimited.
    pub distance: f32,
    /// Remaining distance before the last step.
    pub distance_previous: f32,
    /// Heading of travel when `direction_active`.
    pub direction: f32,
    /// Travel along `direction` rather than the facing yaw.
    pub direction_active: bool,
    /// Stopped by an edge or an overlapping cube.
    pub position_blocked: bool,
    /// Ticks left in a backup manoeuvre.
    pub backup_timer: u32,

    // Energy and history
    /// Energy meter.
    pub energy: f32,
    /// Pursuit targets.
    pub targets: Targets,
    /// Parentage and mating.
    pub life: Lineage,
    /// Fights.
    pub matches: Vec<MatchRecord>,
    /// Resource draws.
    pub captures: Vec<CaptureRecord>,
    /// Motion history.
    pub waypoints: Vec<Waypoint>,
}

impl Cube {
    /// A fresh, active, displayed, adult-sized cube.
    pub fn new(index: usize, uuid: CubeUuid, kind: PlayerKind, scale_factor: f32, position: Vec3, energy: f32, now: f64) -> Self {
        let mut cube = Self {
            index,
            uuid,
            kind,
            emoticon: String::new(),
            firstname: String::new(),
            active: true,
            display: true,
            remote: false,
            scale_factor,
            scale: scale_factor,
            cube_type: 1,
            color_class: String::new(),
            color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            material: 0,
            surface: String::new(),
            texture_index: 0,
            texture_map: Vec::new(),
            position,
            position_previous: position,
            rotation: Vec3::ZERO,
            gaze: Vec2::ZERO,
            radius: kinematics::radius_for_scale(scale_factor),
            velocity: 0.0,
            distance: 0.0,
            distance_previous: 0.0,
            direction: 0.0,
            direction_active: false,
            position_blocked: false,
            backup_timer: 0,
            energy,
            targets: Targets::default(),
            life: Lineage {
                birth: now,
                ..Lineage::default()
            },
            matches: Vec::new(),
            captures: Vec::new(),
            waypoints: Vec::new(),
        };
        cube.record_waypoint(WaypointEvent::Idle, now);
        cube
    }

    /// Build a seed cube from a scene record. A blank uuid is replaced by
    /// a fresh one; the record's radius is ignored.
    pub fn from_record(index: usize, record: &CubeRecord, texture_index: i32, now: f64) -> Self {
        let uuid = if record.cube_uuid.is_empty() {
            CubeUuid::generate()
        } else {
            record.cube_uuid.clone()
        };
        let mut cube = Self::new(
            index,
            uuid,
            record.cube_player,
            record.cube_scale_factor,
            record.position(),
            record.resource_energy,
            now,
        );
        cube.emoticon.clone_from(&record.cube_emoticon);
        cube.firstname.clone_from(&record.cube_firstname);
        cube.cube_type = record.cube_type;
        cube.color_class.clone_from(&record.cube_color_class);
        cube.color = record.color();
        cube.material = record.cube_material;
        cube.surface.clone_from(&record.cube_surface);
        cube.texture_index = texture_index;
        cube.texture_map.clone_from(&record.cube_texture_map);
        cube.rotation = record.rotation();
        cube
    }

    /// Facing yaw.
    pub const fn yaw(&self) -> f32 {
        self.rotation.y
    }

    /// Turn to face `yaw`.
    pub const fn set_yaw(&mut self, yaw: f32) {
        self.rotation.y = yaw;
    }

    /// Heading actually travelled along.
    pub const fn heading(&self) -> f32 {
        if self.direction_active {
            self.direction
        } else {
            self.rotation.y
        }
    }

    /// Seconds since birth.
    pub fn age(&self, now: f64) -> f64 {
        now - self.life.birth
    }

    /// Younger than `youth_hold_seconds`.
    pub fn is_youth(&self, now: f64, youth_hold_seconds: f64) -> bool {
        self.age(now) < youth_hold_seconds
    }

    /// Mated within the last `mate_hold_seconds`.
    pub fn is_recuperating(&self, now: f64, mate_hold_seconds: f64) -> bool {
        self.life
            .last_mate_time()
            .is_some_and(|t| now - t < mate_hold_seconds)
    }

    /// Active and displayed.
    pub const fn is_live(&self) -> bool {
        self.active && self.display
    }

    /// Set size and keep the radius invariant.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.radius = kinematics::radius_for_scale(scale);
    }

    /// Model matrix, with an extra display-only rotation.
    pub fn model(&self, display_rotation: Vec3) -> Mat4 {
        kinematics::model_matrix(self.position, self.rotation + display_rotation, self.scale)
    }

    /// Append a waypoint at the current position.
    pub fn record_waypoint(&mut self, event: WaypointEvent, now: f64) {
        self.waypoints.push(Waypoint {
            time: now,
            event,
            position: self.position,
            blocked: self.position_blocked,
        });
    }

    /// Score as (total, mate, food, kill). Resources always score zero.
    pub fn total_points(&self) -> [f32; 4] {
        if self.kind == PlayerKind::Resource {
            return [0.0; 4];
        }
        let mate: f32 = self.life.mate_energies.iter().sum();
        let food: f32 = self.captures.iter().map(|c| c.energy).sum();
        let kill: f32 = self.matches.iter().map(|m| m.energy).sum();
        [mate + food + kill, mate, food, kill]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Adult cube of the given kind at `(x, scale, z)` born at t=0.
    pub(crate) fn make_cube(index: usize, kind: PlayerKind, x: f32, z: f32, energy: f32) -> Cube {
        Cube::new(
            index,
            CubeUuid::from(format!("{kind}-{index}")),
            kind,
            1.0,
            Vec3::new(x, 1.0, z),
            energy,
            0.0,
        )
    }

    #[test]
    fn new_cube_starts_idle_with_radius_invariant() {
        let cube = make_cube(0, PlayerKind::Male, 0.0, 0.0, 100.0);
        assert!(cube.active && cube.display && !cube.remote);
        assert!((cube.radius - cube.scale * core::f32::consts::SQRT_2).abs() < 1e-6);
        assert_eq!(cube.waypoints.len(), 1);
        assert_eq!(cube.waypoints.first().map(|w| w.event), Some(WaypointEvent::Idle));
    }

    #[test]
    fn record_with_blank_uuid_gets_one() {
        let record: CubeRecord =
            serde_json::from_str(r#"{"cube_index":0,"cube_player":"predator","spatial_radius":9.0}"#)
                .unwrap();
        let cube = Cube::from_record(0, &record, 0, 5.0);
        assert!(!cube.uuid.is_empty());
        assert!((cube.radius - core::f32::consts::SQRT_2).abs() < 1e-6);
        assert!((cube.life.birth - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn heading_prefers_direction_override() {
        let mut cube = make_cube(0, PlayerKind::Enby, 0.0, 0.0, 10.0);
        cube.set_yaw(1.0);
        cube.direction = 2.0;
        assert!((cube.heading() - 1.0).abs() < 1e-6);
        cube.direction_active = true;
        assert!((cube.heading() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn points_sum_ledgers() {
        let mut cube = make_cube(0, PlayerKind::Male, 0.0, 0.0, 10.0);
        cube.life.mate_energies.push(100.0);
        cube.captures.push(CaptureRecord {
            resource: CubeUuid::from("r"),
            time: 1.0,
            energy: 50.0,
        });
        cube.matches.push(MatchRecord {
            opponent: CubeUuid::from("p"),
            time: 2.0,
            energy: 25.0,
            won: true,
        });
        let points = cube.total_points();
        assert!((points[0] - 175.0).abs() < 1e-4);
        assert!((points[3] - 25.0).abs() < 1e-4);
    }

    #[test]
    fn resources_score_nothing() {
        let mut cube = make_cube(0, PlayerKind::Resource, 0.0, 0.0, 10.0);
        cube.life.mate_energies.push(100.0);
        assert!(cube.total_points().iter().all(|p| p.abs() < f32::EPSILON));
    }

    #[test]
    fn recuperation_follows_last_mate() {
        let mut cube = make_cube(0, PlayerKind::Female, 0.0, 0.0, 10.0);
        assert!(!cube.is_recuperating(100.0, 30.0));
        cube.life.mate_times.push(90.0);
        assert!(cube.is_recuperating(100.0, 30.0));
        assert!(!cube.is_recuperating(121.0, 30.0));
    }
}
