//! Playfield geometry, kinematics and scenery for the Cubeworld simulation.
//!
//! This crate models everything about the world that is not an agent: the
//! math that moves and projects cubes, the static scenery the renderer
//! draws, and the declarative scene records that populate both.
//!
//! # Modules
//!
//! - [`error`] -- Error types for slot placement.
//! - [`kinematics`] -- Bearings, travel steps, bounds, growth, model/view/
//!   projection composition and bounding-box projection.
//! - [`scene`] -- Serde records of the JSON scene format.
//! - [`scenery`] -- Window, camera, lights, materials, textures, grounds, wires.
//! - [`slots`] -- [`SlotTable`], the fixed-capacity index-addressed store.
//!
//! [`SlotTable`]: slots::SlotTable

pub mod error;
pub mod kinematics;
pub mod scene;
pub mod scenery;
pub mod slots;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use kinematics::RotationAxes;
pub use scene::SceneRecord;
pub use scenery::{CameraPreset, Ground, Light, Material, Texture, WindowSettings, Wire};
pub use slots::SlotTable;
