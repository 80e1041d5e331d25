//! Declarative scene records.
//!
//! A scene document is a JSON object whose sections are all optional:
//! `window`, `camera`, `lights`, `materials`, `textures`, `grounds`, `cubes`
//! and `wires`. Slot indices are required in every array entry; everything
//! else falls back to a neutral default so hand-written scenes can stay
//! short.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use cubeworld_types::{CubeUuid, GroundUuid, PlayerKind};

use crate::scenery::{CameraPreset, Ground, Light, Material, WindowSettings, Wire};

/// A full scene document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Free-form dataset label, logged on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Main window settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowRecord>,
    /// Default camera. Also resets ground 0's view preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraRecord>,
    /// Light slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lights: Vec<LightRecord>,
    /// Material slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialRecord>,
    /// Texture slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<TextureRecord>,
    /// Ground tiles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounds: Vec<GroundRecord>,
    /// Cubes. `cube_index = -1` appends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cubes: Vec<CubeRecord>,
    /// Wireframes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wires: Vec<WireRecord>,
}

impl SceneRecord {
    /// Parse a scene document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn one() -> f32 {
    1.0
}

const fn opaque_white() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

const fn opaque_grey() -> [f32; 4] {
    [0.5, 0.5, 0.5, 1.0]
}

const fn y_up() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

const fn default_camera_position() -> [f32; 3] {
    [0.0, 10.0, 20.0]
}

const fn default_width() -> u32 {
    1280
}

const fn default_height() -> u32 {
    720
}

const fn default_channels() -> u32 {
    4
}

fn default_title() -> String {
    "Cubeworld".to_owned()
}

const fn default_kind() -> PlayerKind {
    PlayerKind::Resource
}

fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}

fn vec4(v: [f32; 4]) -> Vec4 {
    Vec4::from_array(v)
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `window` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// Window title.
    #[serde(default = "default_title")]
    pub window_title: String,
    /// Width in pixels.
    #[serde(default = "default_width")]
    pub main_window_width: u32,
    /// Height in pixels.
    #[serde(default = "default_height")]
    pub main_window_height: u32,
    /// Channels per pixel.
    #[serde(default = "default_channels")]
    pub main_window_channels: u32,
    /// Clear colour.
    #[serde(default = "opaque_white")]
    pub window_background_color: [f32; 4],
}

impl From<&WindowRecord> for WindowSettings {
    fn from(r: &WindowRecord) -> Self {
        Self {
            title: r.window_title.clone(),
            width: r.main_window_width,
            height: r.main_window_height,
            channels: r.main_window_channels,
            background: vec4(r.window_background_color),
        }
    }
}

/// `camera` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    /// Eye position.
    #[serde(default = "default_camera_position")]
    pub camera_position: [f32; 3],
    /// Look-at target.
    #[serde(default)]
    pub camera_target: [f32; 3],
    /// Up vector.
    #[serde(default = "y_up")]
    pub camera_up: [f32; 3],
}

impl From<&CameraRecord> for CameraPreset {
    fn from(r: &CameraRecord) -> Self {
        Self {
            position: vec3(r.camera_position),
            target: vec3(r.camera_target),
            up: vec3(r.camera_up),
        }
    }
}

/// One entry of `lights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightRecord {
    /// Slot.
    pub light_index: i64,
    /// Position.
    #[serde(default)]
    pub light_position: [f32; 3],
    /// Intensity.
    #[serde(default)]
    pub light_intensity: [f32; 3],
    /// Ambient term.
    #[serde(default)]
    pub light_ambient: [f32; 3],
    /// Diffuse term.
    #[serde(default)]
    pub light_diffuse: [f32; 3],
    /// Specular term.
    #[serde(default)]
    pub light_specular: [f32; 3],
    /// Constant attenuation.
    #[serde(default = "one")]
    pub light_constant: f32,
    /// Linear attenuation.
    #[serde(default)]
    pub light_linear: f32,
    /// Quadratic attenuation.
    #[serde(default)]
    pub light_quadratic: f32,
}

impl From<&LightRecord> for Light {
    fn from(r: &LightRecord) -> Self {
        Self {
            position: vec3(r.light_position),
            intensity: vec3(r.light_intensity),
            ambient: vec3(r.light_ambient),
            diffuse: vec3(r.light_diffuse),
            specular: vec3(r.light_specular),
            constant: r.light_constant,
            linear: r.light_linear,
            quadratic: r.light_quadratic,
        }
    }
}

/// One entry of `materials`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    /// Slot.
    pub material_index: i64,
    /// Ambient reflectance.
    #[serde(default)]
    pub material_ambient: [f32; 3],
    /// Diffuse reflectance.
    #[serde(default)]
    pub material_diffuse: [f32; 3],
    /// Specular reflectance.
    #[serde(default)]
    pub material_specular: [f32; 3],
    /// Specular exponent.
    #[serde(default)]
    pub material_shininess: f32,
}

impl From<&MaterialRecord> for Material {
    fn from(r: &MaterialRecord) -> Self {
        Self {
            ambient: vec3(r.material_ambient),
            diffuse: vec3(r.material_diffuse),
            specular: vec3(r.material_specular),
            shininess: r.material_shininess,
        }
    }
}

/// One entry of `textures`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRecord {
    /// Slot.
    pub texture_index: i64,
    /// Image path.
    pub texture_filename: String,
}

/// One entry of `grounds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundRecord {
    /// Slot.
    pub ground_index: i64,
    /// Identifier.
    #[serde(default)]
    pub ground_uuid: GroundUuid,
    /// Half-extent.
    #[serde(default = "ten")]
    pub ground_scale_factor: f32,
    /// Draw style.
    #[serde(default = "one_i32")]
    pub ground_type: i32,
    /// Fill colour.
    #[serde(default = "opaque_grey")]
    pub ground_color: [f32; 4],
    /// Material slot.
    #[serde(default)]
    pub ground_material: i32,
    /// Texture slot.
    #[serde(default)]
    pub ground_texture_index: i32,
    /// Corner texture coordinates.
    #[serde(default)]
    pub ground_texture_map: [f32; 8],
    /// Centre.
    #[serde(default)]
    pub ground_spatial_position: [f32; 3],
    /// Rotation.
    #[serde(default)]
    pub ground_spatial_rotation: [f32; 3],
    /// Ground-view eye.
    #[serde(default = "default_camera_position")]
    pub ground_view_position: [f32; 3],
    /// Ground-view target.
    #[serde(default)]
    pub ground_view_target: [f32; 3],
    /// Ground-view up.
    #[serde(default = "y_up")]
    pub ground_view_up: [f32; 3],
}

const fn ten() -> f32 {
    10.0
}

const fn one_i32() -> i32 {
    1
}

impl From<&GroundRecord> for Ground {
    fn from(r: &GroundRecord) -> Self {
        Self {
            color: vec4(r.ground_color),
            ground_type: r.ground_type,
            material: r.ground_material,
            texture_index: r.ground_texture_index,
            texture_map: r.ground_texture_map,
            position: vec3(r.ground_spatial_position),
            rotation: vec3(r.ground_spatial_rotation),
            view: CameraPreset {
                position: vec3(r.ground_view_position),
                target: vec3(r.ground_view_target),
                up: vec3(r.ground_view_up),
            },
            ..Self::new(r.ground_uuid.clone(), r.ground_scale_factor)
        }
    }
}

/// One entry of `cubes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeRecord {
    /// Slot, or -1 to append.
    pub cube_index: i64,
    /// Kind.
    #[serde(default = "default_kind")]
    pub cube_player: PlayerKind,
    /// Identifier. Blank means mint a fresh one.
    #[serde(default)]
    pub cube_uuid: CubeUuid,
    /// Emoticon tag (hex code point).
    #[serde(default)]
    pub cube_emoticon: String,
    /// Display name.
    #[serde(default)]
    pub cube_firstname: String,
    /// Adult size.
    #[serde(default = "one")]
    pub cube_scale_factor: f32,
    /// Draw style.
    #[serde(default = "one_i32")]
    pub cube_type: i32,
    /// Colour class label.
    #[serde(default)]
    pub cube_color_class: String,
    /// Colour.
    #[serde(default = "opaque_grey")]
    pub cube_color: [f32; 4],
    /// Material slot.
    #[serde(default)]
    pub cube_material: i32,
    /// Surface label.
    #[serde(default)]
    pub cube_surface: String,
    /// Texture slot, or -1 to load `cube_texture_filename` into a new slot.
    #[serde(default)]
    pub cube_texture_index: i32,
    /// Texture file for `cube_texture_index = -1`.
    #[serde(default)]
    pub cube_texture_filename: String,
    /// Per-face texture coordinates.
    #[serde(default)]
    pub cube_texture_map: Vec<f32>,
    /// Centre.
    #[serde(default)]
    pub spatial_position: [f32; 3],
    /// Rotation.
    #[serde(default)]
    pub spatial_rotation: [f32; 3],
    /// Ignored; the radius always follows the scale.
    #[serde(default)]
    pub spatial_radius: f32,
    /// Starting energy.
    #[serde(default)]
    pub resource_energy: f32,
}

impl CubeRecord {
    /// Centre as a vector.
    pub fn position(&self) -> Vec3 {
        vec3(self.spatial_position)
    }

    /// Rotation as a vector.
    pub fn rotation(&self) -> Vec3 {
        vec3(self.spatial_rotation)
    }

    /// Colour as a vector.
    pub fn color(&self) -> Vec4 {
        vec4(self.cube_color)
    }
}

/// One entry of `wires`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Slot.
    pub wire_index: i64,
    /// Uniform scale.
    #[serde(default = "one")]
    pub wire_scale_factor: f32,
    /// Centre.
    #[serde(default)]
    pub wire_position: [f32; 3],
    /// Rotation.
    #[serde(default)]
    pub wire_rotation: [f32; 3],
    /// Draw style.
    #[serde(default)]
    pub wire_type: i32,
    /// Colour.
    #[serde(default = "opaque_grey")]
    pub wire_color: [f32; 4],
}

impl From<&WireRecord> for Wire {
    fn from(r: &WireRecord) -> Self {
        Self {
            scale_factor: r.wire_scale_factor,
            position: vec3(r.wire_position),
            rotation: vec3(r.wire_rotation),
            wire_type: r.wire_type,
            color: vec4(r.wire_color),
        }
    }
}
