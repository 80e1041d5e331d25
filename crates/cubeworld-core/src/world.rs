//! The world store: cubes plus every scenery table.
//!
//! A [`World`] is owned by the [`Simulation`](crate::tick::Simulation) and
//! only ever mutated under the simulation lock. Tables are fixed-capacity
//! and index-addressed so scene records can rewrite any slot.

use cubeworld_agents::CubeRoster;
use cubeworld_types::CubeUuid;
use cubeworld_world::{CameraPreset, Ground, Light, Material, SlotTable, Texture, WindowSettings, Wire, WorldError};

use crate::config::CapacityConfig;

/// Everything the simulation and the renderer share.
#[derive(Debug, Clone)]
pub struct World {
    /// The cubes.
    pub cubes: CubeRoster,
    /// Ground tiles; ground 0 bounds the playfield.
    pub grounds: SlotTable<Ground>,
    /// Point lights.
    pub lights: SlotTable<Light>,
    /// Materials.
    pub materials: SlotTable<Material>,
    /// Texture files.
    pub textures: SlotTable<Texture>,
    /// Decorative wireframes.
    pub wires: SlotTable<Wire>,
    /// Main window settings.
    pub window: WindowSettings,
    /// Overview camera.
    pub camera: CameraPreset,
}

impl World {
    /// An empty world with the configured table sizes.
    pub fn new(capacity: &CapacityConfig) -> Self {
        Self {
            cubes: CubeRoster::new(capacity.cubes),
            grounds: SlotTable::new("grounds", capacity.grounds),
            lights: SlotTable::new("lights", capacity.lights),
            materials: SlotTable::new("materials", capacity.materials),
            textures: SlotTable::new("textures", capacity.textures),
            wires: SlotTable::new("wires", capacity.wires),
            window: WindowSettings::default(),
            camera: CameraPreset::default(),
        }
    }

    /// Playfield half-extent: ground 0's scale factor, if loaded.
    pub fn bound(&self) -> Option<f32> {
        self.grounds.get(0).map(|g| g.scale_factor)
    }

    /// Camera used for bounding boxes: ground 0's preset, or the overview
    /// camera when no ground is loaded.
    pub fn label_camera(&self) -> CameraPreset {
        self.grounds.get(0).map_or(self.camera, |g| g.view)
    }

    /// Put a texture file in the next free slot.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CapacityExhausted`] if every slot is taken.
    pub fn load_texture(&mut self, filename: &str) -> Result<usize, WorldError> {
        self.textures.push(Texture {
            filename: filename.to_owned(),
        })
    }

    /// Bind a cube to a client and open every ground for viewing. Returns
    /// `false` if the uuid is unknown.
    pub fn login(&mut self, uuid: &CubeUuid) -> bool {
        let Some(cube) = self.cubes.by_uuid_mut(uuid) else {
            return false;
        };
        if cube.active && cube.display {
            cube.remote = true;
        }
        for (_, ground) in self.grounds.iter_mut() {
            ground.remote = true;
        }
        true
    }

    /// Release a cube and close ground views. Returns `false` if the uuid
    /// is unknown or was not bound.
    pub fn logout(&mut self, uuid: &CubeUuid) -> bool {
        let Some(cube) = self.cubes.by_uuid_mut(uuid) else {
            return false;
        };
        if !cube.remote {
            return false;
        }
        cube.remote = false;
        for (_, ground) in self.grounds.iter_mut() {
            ground.remote = false;
        }
        true
    }

    /// Number of cubes still in the game.
    pub fn live_count(&self) -> usize {
        self.cubes.iter().filter(|c| c.active).count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use glam::Vec3;

    use cubeworld_agents::Cube;
    use cubeworld_types::{GroundUuid, PlayerKind};

    use super::*;

    /// A world with one 10x10 ground and default capacities.
    pub(crate) fn make_world() -> World {
        let mut world = World::new(&CapacityConfig::default());
        let _ = world.grounds.push(Ground::new(GroundUuid::from("ground-0"), 10.0));
        world
    }

    /// Add an adult cube born at t=0 and return its index.
    pub(crate) fn add_cube(world: &mut World, kind: PlayerKind, x: f32, z: f32, energy: f32) -> usize {
        let index = world.cubes.next_index();
        let cube = Cube::new(
            index,
            CubeUuid::from(format!("{kind}-{index}")),
            kind,
            1.0,
            Vec3::new(x, 1.0, z),
            energy,
            0.0,
        );
        world.cubes.push(cube).unwrap_or(index)
    }

    #[test]
    fn bound_follows_ground_zero() {
        assert_eq!(World::new(&CapacityConfig::default()).bound(), None);
        assert_eq!(make_world().bound(), Some(10.0));
    }

    #[test]
    fn login_binds_cube_and_grounds() {
        let mut world = make_world();
        let index = add_cube(&mut world, PlayerKind::Male, 0.0, 0.0, 100.0);
        let uuid = CubeUuid::from("male-0");
        assert!(world.login(&uuid));
        assert!(world.cubes.get(index).is_some_and(|c| c.remote));
        assert!(world.grounds.get(0).is_some_and(Ground::viewable));

        assert!(world.logout(&uuid));
        assert!(!world.logout(&uuid));
        assert!(world.grounds.get(0).is_some_and(|g| !g.remote));
    }

    #[test]
    fn unknown_login_is_rejected() {
        let mut world = make_world();
        assert!(!world.login(&CubeUuid::from("nobody")));
    }

    #[test]
    fn textures_fill_in_order() {
        let mut world = make_world();
        assert_eq!(world.load_texture("a.png").ok(), Some(0));
        assert_eq!(world.load_texture("b.png").ok(), Some(1));
    }
}
