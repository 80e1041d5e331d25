//! Applying scene records to the world.
//!
//! Sections are applied in a fixed order: window, camera, lights,
//! materials, textures, grounds, cubes, wires. Every entry is addressed by
//! slot, so re-applying a record rewrites the same slots. The first bad
//! index aborts the rest of the record; sections before it stay applied.

use std::path::{Path, PathBuf};

use cubeworld_agents::{AgentError, Cube};
use cubeworld_world::scene::CubeRecord;
use cubeworld_world::{CameraPreset, Ground, Light, Material, SceneRecord, Texture, WindowSettings, Wire, WorldError};

use crate::world::World;

/// Errors raised while reading or applying a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The scene file could not be read.
    #[error("failed to read scene file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The scene text is not a valid scene document.
    #[error("invalid scene JSON: {source}")]
    Json {
        /// Underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// A scenery slot was out of range.
    #[error("scene rejected: {source}")]
    World {
        /// Underlying slot error.
        #[from]
        source: WorldError,
    },

    /// A cube slot was out of range or clashed.
    #[error("scene rejected: {source}")]
    Agent {
        /// Underlying roster error.
        #[from]
        source: AgentError,
    },
}

/// What one application changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneSummary {
    /// Light slots written.
    pub lights: usize,
    /// Material slots written.
    pub materials: usize,
    /// Texture slots written, including per-cube loads.
    pub textures: usize,
    /// Ground slots written.
    pub grounds: usize,
    /// Cube slots written.
    pub cubes: usize,
    /// Wire slots written.
    pub wires: usize,
}

/// Read and parse a scene file.
pub fn read_scene_file(path: &Path) -> Result<SceneRecord, SceneError> {
    let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SceneRecord::from_json(&text)?)
}

/// Apply a scene record at wall-clock time `now`.
pub fn apply_scene(world: &mut World, scene: &SceneRecord, now: f64) -> Result<SceneSummary, SceneError> {
    let mut summary = SceneSummary::default();
    if let Some(dataset) = &scene.dataset {
        tracing::info!(dataset = %dataset, "applying scene dataset");
    }

    if let Some(window) = &scene.window {
        world.window = WindowSettings::from(window);
    }
    if let Some(camera) = &scene.camera {
        world.camera = CameraPreset::from(camera);
        if let Some(ground) = world.grounds.get_mut(0) {
            ground.view = world.camera;
        }
    }
    for record in &scene.lights {
        world.lights.set(record.light_index, Light::from(record))?;
        summary.lights = summary.lights.saturating_add(1);
    }
    for record in &scene.materials {
        world.materials.set(record.material_index, Material::from(record))?;
        summary.materials = summary.materials.saturating_add(1);
    }
    for record in &scene.textures {
        world.textures.set(
            record.texture_index,
            Texture {
                filename: record.texture_filename.clone(),
            },
        )?;
        summary.textures = summary.textures.saturating_add(1);
    }
    for record in &scene.grounds {
        let mut ground = Ground::from(record);
        let slot = world.grounds.check_index(record.ground_index)?;
        if let Some(previous) = world.grounds.get(slot) {
            ground.remote = previous.remote;
        }
        world.grounds.set(record.ground_index, ground)?;
        summary.grounds = summary.grounds.saturating_add(1);
    }
    for record in &scene.cubes {
        if apply_cube(world, record, now)? {
            summary.textures = summary.textures.saturating_add(1);
        }
        summary.cubes = summary.cubes.saturating_add(1);
    }
    for record in &scene.wires {
        world.wires.set(record.wire_index, Wire::from(record))?;
        summary.wires = summary.wires.saturating_add(1);
    }

    tracing::debug!(?summary, cubes = world.cubes.len(), "scene applied");
    Ok(summary)
}

/// Place one cube. Returns `true` if a texture slot was loaded for it.
fn apply_cube(world: &mut World, record: &CubeRecord, now: f64) -> Result<bool, SceneError> {
    let slot = world.cubes.resolve_index(record.cube_index)?;

    let mut loaded = false;
    let mut texture_index = record.cube_texture_index;
    if texture_index == -1 {
        texture_index = 0;
        match world.load_texture(&record.cube_texture_filename).map(i32::try_from) {
            Ok(Ok(index)) => {
                texture_index = index;
                loaded = true;
            }
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(
                    file = %record.cube_texture_filename,
                    cube = slot,
                    "no texture slot for cube, using slot 0"
                );
            }
        }
    }

    let cube = Cube::from_record(slot, record, texture_index, now);
    tracing::debug!(index = slot, uuid = %cube.uuid, kind = %cube.kind, "cube placed");
    world.cubes.place(slot, cube)?;
    Ok(loaded)
}
