//! Pose and projection math for cubes on the playfield.
//!
//! Travel happens in the XZ plane. A heading `a` moves a cube by
//! `(sin a, cos a)` in `(x, z)`, so yaw 0 faces +Z and yaw pi/2 faces +X.
//! Models are composed translation * rotation(X, Y, Z) * scale, matching the
//! unit cube spanning `[-1, 1]` on every axis.

use core::f32::consts::SQRT_2;

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Corners of the unit cube used for bounding-box projection.
pub const CUBE_CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
];

/// Near clip plane of every perspective projection.
pub const NEAR_PLANE: f32 = 0.1;

/// Far clip plane of every perspective projection.
pub const FAR_PLANE: f32 = 100.0;

/// Distance from the viewpoint to the first-person look-at target.
pub const GAZE_RADIUS: f32 = 10.0;

// ---------------------------------------------------------------------------
// Bearings and travel
// ---------------------------------------------------------------------------

/// Bearing from one point to another given the deltas `dz` and `dx`.
///
/// Half-angle form of `atan2(dx, dz)`; returns a value in `(-pi, pi]`.
/// Returns 0 when both deltas are zero.
pub fn find_angle(dz: f32, dx: f32) -> f32 {
    let hyp = dz.hypot(dx);
    let denom = dz + hyp;
    if denom.abs() < f32::EPSILON {
        // Target lies straight behind (dz < 0, dx == 0) or on top of us.
        return if dz < 0.0 { core::f32::consts::PI } else { 0.0 };
    }
    2.0 * (dx / denom).atan()
}

/// Displacement in `(x, z)` for travelling `distance` along heading `angle`.
pub fn heading_step(angle: f32, distance: f32) -> Vec2 {
    Vec2::new(distance * angle.sin(), distance * angle.cos())
}

/// XZ distance between two positions.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    (a.x - b.x).hypot(a.z - b.z)
}

/// Whether a position lies inside the square `[-half_extent, half_extent]`
/// in both X and Z.
pub fn within_bounds(position: Vec3, half_extent: f32) -> bool {
    position.x.abs() <= half_extent && position.z.abs() <= half_extent
}

/// Clamp a position into the playfield square, leaving Y untouched.
pub fn clamp_to_bounds(position: Vec3, half_extent: f32) -> Vec3 {
    let h = half_extent.abs();
    Vec3::new(position.x.clamp(-h, h), position.y, position.z.clamp(-h, h))
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// Half-diagonal of a cube of the given scale in the XZ plane.
pub fn radius_for_scale(scale: f32) -> f32 {
    scale * SQRT_2
}

/// Scale of a youth `age_seconds` old that grows linearly to `scale_factor`
/// over `youth_hold_seconds`. Saturates at `scale_factor`.
pub fn youth_scale(scale_factor: f32, age_seconds: f64, youth_hold_seconds: f64) -> f32 {
    if youth_hold_seconds <= 0.0 || age_seconds >= youth_hold_seconds {
        return scale_factor;
    }
    #[allow(clippy::cast_possible_truncation)]
    let fraction = (age_seconds.max(0.0) / youth_hold_seconds) as f32;
    scale_factor * fraction
}

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

/// Rotation composed X * Y * Z from Euler angles in radians.
pub fn rotation_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_rotation_x(rotation.x)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_z(rotation.z)
}

/// Model matrix: translation * rotation * uniform scale.
pub fn model_matrix(position: Vec3, rotation: Vec3, scale: f32) -> Mat4 {
    Mat4::from_translation(position) * rotation_matrix(rotation) * Mat4::from_scale(Vec3::splat(scale))
}

/// Right-handed perspective projection with OpenGL depth range.
pub fn perspective(fov_degrees: f32, width: u32, height: u32) -> Mat4 {
    #[allow(clippy::cast_precision_loss)]
    let aspect = if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    };
    Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}

/// View matrix of a fixed camera preset.
pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(position, target, up)
}

/// View matrix seen from a cube's front face.
///
/// The viewpoint sits `scale_factor` ahead of the cube centre along its yaw.
/// The target lies [`GAZE_RADIUS`] away, turned by `gaze.x` and pitched by
/// `gaze.y`.
pub fn first_person_view(position: Vec3, yaw: f32, scale_factor: f32, gaze: Vec2, up: Vec3) -> Mat4 {
    let eye = Vec3::new(
        scale_factor.mul_add(yaw.sin(), position.x),
        position.y,
        scale_factor.mul_add(yaw.cos(), position.z),
    );
    let target = Vec3::new(
        GAZE_RADIUS.mul_add((yaw + gaze.x).sin(), eye.x),
        GAZE_RADIUS.mul_add(gaze.y.sin(), eye.y),
        GAZE_RADIUS.mul_add((yaw + gaze.x).cos(), eye.z),
    );
    Mat4::look_at_rh(eye, target, up)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project a model-space point to window coordinates (bottom-left origin).
///
/// Returns `None` for points behind the camera.
pub fn project_point(point: Vec3, model_view: Mat4, projection: Mat4, width: u32, height: u32) -> Option<Vec2> {
    let clip = projection * model_view * Vec4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (width as f32, height as f32);
    Some(Vec2::new(
        w * ndc.x.mul_add(0.5, 0.5),
        h * ndc.y.mul_add(0.5, 0.5),
    ))
}

/// Screen-space bounding box `(xmin, ymin, xmax, ymax)` of the unit cube
/// under `model`, seen through `view` and `projection`, clamped to the
/// viewport. Bottom-left origin.
pub fn bounding_box(model: Mat4, view: Mat4, projection: Mat4, width: u32, height: u32) -> [f32; 4] {
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (width as f32, height as f32);
    let model_view = view * model;
    let mut bbox = [f32::MAX, f32::MAX, 0.0, 0.0];
    for corner in CUBE_CORNERS {
        let Some(p) = project_point(corner, model_view, projection, width, height) else {
            continue;
        };
        bbox[0] = bbox[0].min(p.x.clamp(0.0, w));
        bbox[1] = bbox[1].min(p.y.clamp(0.0, h));
        bbox[2] = bbox[2].max(p.x.clamp(0.0, w));
        bbox[3] = bbox[3].max(p.y.clamp(0.0, h));
    }
    if bbox[0] > bbox[2] || bbox[1] > bbox[3] {
        return [0.0; 4];
    }
    bbox
}

/// Convert a bottom-left-origin box to image coordinates (top-left origin).
pub fn flip_bounding_box(bbox: [f32; 4], height: u32) -> [f32; 4] {
    #[allow(clippy::cast_precision_loss)]
    let h = height as f32;
    [bbox[0], h - bbox[3], bbox[2], h - bbox[1]]
}

// ---------------------------------------------------------------------------
// Display rotation
// ---------------------------------------------------------------------------

/// Axes animated by the display-only rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxes {
    /// No animation.
    #[default]
    None,
    /// Spin about X.
    X,
    /// Spin about Y.
    Y,
    /// Spin about Z.
    Z,
    /// Spin about all three axes.
    All,
}

impl RotationAxes {
    /// Map the operator flag `-r 1..4` to axes. Anything else disables it.
    pub const fn from_flag(flag: u8) -> Self {
        match flag {
            1 => Self::X,
            2 => Self::Y,
            3 => Self::Z,
            4 => Self::All,
            _ => Self::None,
        }
    }

    /// Extra model rotation for the given accumulated angle in degrees.
    /// Axis rates are x*3, y*2, z*4.
    pub fn rotation(self, angle_degrees: f32) -> Vec3 {
        let a = angle_degrees.to_radians();
        let (x, y, z) = match self {
            Self::None => (0.0, 0.0, 0.0),
            Self::X => (3.0 * a, 0.0, 0.0),
            Self::Y => (0.0, 2.0 * a, 0.0),
            Self::Z => (0.0, 0.0, 4.0 * a),
            Self::All => (3.0 * a, 2.0 * a, 4.0 * a),
        };
        Vec3::new(x, y, z)
    }
}

/// Degrees added to the display rotation each tick.
pub const DISPLAY_ROTATION_STEP_DEGREES: f32 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-4;

    #[test]
    fn find_angle_matches_atan2() {
        for (dz, dx) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.5), (3.0, -4.0), (-2.0, -2.0)] {
            let a = find_angle(dz, dx);
            assert!((a - f32::atan2(dx, dz)).abs() < EPS, "dz={dz} dx={dx} a={a}");
        }
    }

    #[test]
    fn find_angle_is_collinear_with_delta() {
        let (dz, dx) = (2.0_f32, 5.0_f32);
        let a = find_angle(dz, dx);
        let unit = heading_step(a, 1.0);
        let len = dz.hypot(dx);
        assert!((unit.x - dx / len).abs() < EPS);
        assert!((unit.y - dz / len).abs() < EPS);
    }

    #[test]
    fn find_angle_straight_behind() {
        assert!((find_angle(-1.0, 0.0) - PI).abs() < EPS);
        assert!(find_angle(0.0, 0.0).abs() < EPS);
    }

    #[test]
    fn heading_quarter_turn_moves_along_x() {
        let step = heading_step(FRAC_PI_2, 2.0);
        assert!((step.x - 2.0).abs() < EPS);
        assert!(step.y.abs() < EPS);
    }

    #[test]
    fn clamp_keeps_y() {
        let p = clamp_to_bounds(Vec3::new(11.0, 0.7, -12.0), 10.0);
        assert!((p.x - 10.0).abs() < EPS);
        assert!((p.z + 10.0).abs() < EPS);
        assert!((p.y - 0.7).abs() < EPS);
        assert!(within_bounds(p, 10.0));
    }

    #[test]
    fn youth_grows_linearly_and_latches() {
        assert!(youth_scale(1.0, 0.0, 60.0).abs() < EPS);
        assert!((youth_scale(1.0, 30.0, 60.0) - 0.5).abs() < EPS);
        assert!((youth_scale(0.8, 60.0, 60.0) - 0.8).abs() < EPS);
        assert!((youth_scale(0.8, 600.0, 60.0) - 0.8).abs() < EPS);
    }

    #[test]
    fn radius_is_half_diagonal() {
        assert!((radius_for_scale(0.5) - 0.5 * SQRT_2).abs() < EPS);
    }

    #[test]
    fn bounding_box_of_visible_cube_is_inside_viewport() {
        let model = model_matrix(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, 1.0);
        let view = look_at(Vec3::new(0.0, 5.0, 15.0), Vec3::ZERO, Vec3::Y);
        let proj = perspective(60.0, 640, 480);
        let bbox = bounding_box(model, view, proj, 640, 480);
        assert!(bbox[0] > 0.0 && bbox[2] < 640.0);
        assert!(bbox[1] > 0.0 && bbox[3] < 480.0);
        assert!(bbox[0] < bbox[2] && bbox[1] < bbox[3]);
        // Centred horizontally.
        assert!(((bbox[0] + bbox[2]) / 2.0 - 320.0).abs() < 1.0);
    }

    #[test]
    fn flipped_box_swaps_y_extent() {
        let flipped = flip_bounding_box([10.0, 20.0, 30.0, 40.0], 100);
        assert_eq!(flipped.map(f32::to_bits), [10.0_f32, 60.0, 30.0, 80.0].map(f32::to_bits));
    }

    #[test]
    fn rotation_flag_mapping() {
        assert_eq!(RotationAxes::from_flag(4), RotationAxes::All);
        assert_eq!(RotationAxes::from_flag(0), RotationAxes::None);
        let r = RotationAxes::All.rotation(1.0);
        assert!((r.z - 4.0_f32.to_radians()).abs() < EPS);
    }
}
