//! Static scenery: the window, camera, lights, materials, textures, grounds
//! and wireframes.
//!
//! These are value records written by the scene loader and read by the
//! renderer. Only grounds carry simulation state: their half-extent bounds
//! the playfield and their `remote` flag gates ground views.

use glam::{Mat4, Vec3, Vec4};

use cubeworld_types::GroundUuid;

use crate::kinematics;

/// Main window and capture surface settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    /// Title shown by interactive front ends.
    pub title: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channels read back per pixel.
    pub channels: u32,
    /// Clear colour (RGBA, 0..1).
    pub background: Vec4,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Cubeworld".to_owned(),
            width: 1280,
            height: 720,
            channels: 4,
            background: Vec4::ONE,
        }
    }
}

/// A fixed camera: eye, look-at target and up vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPreset {
    /// Eye position.
    pub position: Vec3,
    /// Look-at point.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 20.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl CameraPreset {
    /// View matrix of this preset.
    pub fn view(&self) -> Mat4 {
        kinematics::look_at(self.position, self.target, self.up)
    }
}

/// A point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// World position.
    pub position: Vec3,
    /// Overall intensity per channel.
    pub intensity: Vec3,
    /// Ambient term.
    pub ambient: Vec3,
    /// Diffuse term.
    pub diffuse: Vec3,
    /// Specular term.
    pub specular: Vec3,
    /// Constant attenuation.
    pub constant: f32,
    /// Linear attenuation.
    pub linear: f32,
    /// Quadratic attenuation.
    pub quadratic: f32,
}

/// Surface response to light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Ambient reflectance.
    pub ambient: Vec3,
    /// Diffuse reflectance.
    pub diffuse: Vec3,
    /// Specular reflectance.
    pub specular: Vec3,
    /// Specular exponent.
    pub shininess: f32,
}

/// A texture slot. Only the source path is kept; decoding belongs to the
/// renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Image file path.
    pub filename: String,
}

/// A square playfield tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Ground {
    /// Identifier used by ground view requests.
    pub uuid: GroundUuid,
    /// Half-extent of the square; also the playfield bound.
    pub scale_factor: f32,
    /// Draw style (0 wireframe, 1 fill, 2 textured, 3 lit).
    pub ground_type: i32,
    /// Fill colour.
    pub color: Vec4,
    /// Material slot.
    pub material: i32,
    /// Texture slot.
    pub texture_index: i32,
    /// Texture coordinates of the four corners.
    pub texture_map: [f32; 8],
    /// Centre of the tile.
    pub position: Vec3,
    /// Euler rotation of the tile.
    pub rotation: Vec3,
    /// Camera used for ground views and bounding boxes.
    pub view: CameraPreset,
    /// Participates in the scene.
    pub active: bool,
    /// Drawn.
    pub display: bool,
    /// At least one client is logged in.
    pub remote: bool,
}

impl Ground {
    /// A fresh, active, displayed ground of the given half-extent.
    pub fn new(uuid: GroundUuid, scale_factor: f32) -> Self {
        Self {
            uuid,
            scale_factor,
            ground_type: 1,
            color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            material: 0,
            texture_index: 0,
            texture_map: [0.0; 8],
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            view: CameraPreset::default(),
            active: true,
            display: true,
            remote: false,
        }
    }

    /// Model matrix of the tile.
    pub fn model(&self) -> Mat4 {
        kinematics::model_matrix(self.position, self.rotation, self.scale_factor)
    }

    /// Whether ground views of this tile may be served.
    pub const fn viewable(&self) -> bool {
        self.active && self.display && self.remote
    }
}

/// A decorative wireframe cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wire {
    /// Uniform scale.
    pub scale_factor: f32,
    /// Centre.
    pub position: Vec3,
    /// Euler rotation.
    pub rotation: Vec3,
    /// Draw style.
    pub wire_type: i32,
    /// Line colour.
    pub color: Vec4,
}

impl Wire {
    /// Model matrix of the wireframe.
    pub fn model(&self) -> Mat4 {
        kinematics::model_matrix(self.position, self.rotation, self.scale_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ground_is_live_but_not_remote() {
        let g = Ground::new(GroundUuid::from("g0"), 10.0);
        assert!(g.active && g.display);
        assert!(!g.viewable());
    }

    #[test]
    fn ground_model_scales_corners() {
        let g = Ground::new(GroundUuid::from("g0"), 10.0);
        let corner = g.model().transform_point3(Vec3::new(1.0, 0.0, 1.0));
        assert!((corner.x - 10.0).abs() < 1e-5);
        assert!((corner.z - 10.0).abs() < 1e-5);
    }
}
