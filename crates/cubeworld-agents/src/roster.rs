//! Fixed-capacity roster of cubes with a uuid index.
//!
//! Slots are dense: a cube lives at `index` for its whole life and slots
//! are never reused, so the uuid map stays valid after death. The roster
//! only grows, either by appending (births, `cube_index = -1`) or by a scene
//! record rewriting an existing slot.

use std::collections::HashMap;

use cubeworld_types::CubeUuid;

use crate::agent::Cube;
use crate::error::AgentError;

/// Default roster capacity.
pub const DEFAULT_CAPACITY: usize = 50;

/// The cubes of one world.
#[derive(Debug, Clone)]
pub struct CubeRoster {
    capacity: usize,
    cubes: Vec<Cube>,
    by_uuid: HashMap<CubeUuid, usize>,
}

impl Default for CubeRoster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CubeRoster {
    /// Create an empty roster.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cubes: Vec::with_capacity(capacity),
            by_uuid: HashMap::with_capacity(capacity),
        }
    }

    /// Maximum number of cubes.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots, dead cubes included.
    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    /// Whether no cube was ever added.
    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    /// Whether another cube can be appended.
    pub fn is_full(&self) -> bool {
        self.cubes.len() >= self.capacity
    }

    /// Index the next appended cube will receive.
    pub fn next_index(&self) -> usize {
        self.cubes.len()
    }

    /// Slot of the cube with this uuid.
    pub fn index_of(&self, uuid: &CubeUuid) -> Option<usize> {
        self.by_uuid.get(uuid).copied()
    }

    /// Borrow the cube at `index`.
    pub fn get(&self, index: usize) -> Option<&Cube> {
        self.cubes.get(index)
    }

    /// Mutably borrow the cube at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Cube> {
        self.cubes.get_mut(index)
    }

    /// Borrow the cube with this uuid.
    pub fn by_uuid(&self, uuid: &CubeUuid) -> Option<&Cube> {
        self.index_of(uuid).and_then(|i| self.cubes.get(i))
    }

    /// Mutably borrow the cube with this uuid.
    pub fn by_uuid_mut(&mut self, uuid: &CubeUuid) -> Option<&mut Cube> {
        let index = self.index_of(uuid)?;
        self.cubes.get_mut(index)
    }

    /// Iterate all cubes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Cube> {
        self.cubes.iter()
    }

    /// Mutably iterate all cubes in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cube> {
        self.cubes.iter_mut()
    }

    /// Two distinct cubes at once. `None` if `i == j` or either is missing.
    pub fn pair_mut(&mut self, i: usize, j: usize) -> Option<(&mut Cube, &mut Cube)> {
        if i == j || i >= self.cubes.len() || j >= self.cubes.len() {
            return None;
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let (head, tail) = self.cubes.split_at_mut(hi);
        let a = head.get_mut(lo)?;
        let b = tail.first_mut()?;
        if i < j { Some((a, b)) } else { Some((b, a)) }
    }

    /// Append a cube, assigning it the next slot.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RosterFull`] when at capacity, or
    /// [`AgentError::DuplicateUuid`] if the uuid is taken.
    pub fn push(&mut self, mut cube: Cube) -> Result<usize, AgentError> {
        if self.is_full() {
            return Err(AgentError::RosterFull {
                capacity: self.capacity,
            });
        }
        if let Some(index) = self.index_of(&cube.uuid) {
            return Err(AgentError::DuplicateUuid {
                uuid: cube.uuid,
                index,
            });
        }
        let index = self.cubes.len();
        cube.index = index;
        self.by_uuid.insert(cube.uuid.clone(), index);
        self.cubes.push(cube);
        Ok(index)
    }

    /// Validate a slot index coming from a scene record. `-1` resolves to
    /// the next free slot.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::IndexOutOfRange`], [`AgentError::RosterFull`]
    /// or [`AgentError::IndexGap`].
    pub fn resolve_index(&self, index: i64) -> Result<usize, AgentError> {
        if index == -1 {
            if self.is_full() {
                return Err(AgentError::RosterFull {
                    capacity: self.capacity,
                });
            }
            return Ok(self.cubes.len());
        }
        let slot = usize::try_from(index)
            .ok()
            .filter(|i| *i < self.capacity)
            .ok_or(AgentError::IndexOutOfRange {
                index,
                capacity: self.capacity,
            })?;
        if slot > self.cubes.len() {
            return Err(AgentError::IndexGap {
                index: slot,
                len: self.cubes.len(),
            });
        }
        Ok(slot)
    }

    /// Write a cube into an existing slot or the next free one.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::IndexGap`] past the next free slot,
    /// [`AgentError::RosterFull`] at capacity, or
    /// [`AgentError::DuplicateUuid`] if another slot owns the uuid.
    pub fn place(&mut self, slot: usize, mut cube: Cube) -> Result<usize, AgentError> {
        if slot == self.cubes.len() {
            return self.push(cube);
        }
        if let Some(owner) = self.index_of(&cube.uuid)
            && owner != slot
        {
            return Err(AgentError::DuplicateUuid {
                uuid: cube.uuid,
                index: owner,
            });
        }
        let len = self.cubes.len();
        let entry = self.cubes.get_mut(slot).ok_or(AgentError::IndexGap {
            index: slot,
            len,
        })?;
        if self.by_uuid.get(&entry.uuid) == Some(&slot) {
            self.by_uuid.remove(&entry.uuid);
        }
        cube.index = slot;
        self.by_uuid.insert(cube.uuid.clone(), slot);
        *entry = cube;
        Ok(slot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cubeworld_types::PlayerKind;

    use super::*;
    use crate::agent::tests::make_cube;

    #[test]
    fn push_assigns_dense_indices() {
        let mut roster = CubeRoster::new(3);
        assert_eq!(roster.push(make_cube(9, PlayerKind::Male, 0.0, 0.0, 1.0)).ok(), Some(0));
        assert_eq!(roster.push(make_cube(9, PlayerKind::Female, 0.0, 0.0, 1.0)).ok(), Some(1));
        assert_eq!(roster.get(1).map(|c| c.index), Some(1));
        assert_eq!(roster.index_of(&CubeUuid::from("female-9")), Some(1));
    }

    #[test]
    fn push_rejects_when_full() {
        let mut roster = CubeRoster::new(1);
        assert!(roster.push(make_cube(0, PlayerKind::Male, 0.0, 0.0, 1.0)).is_ok());
        assert!(matches!(
            roster.push(make_cube(1, PlayerKind::Male, 0.0, 0.0, 1.0)),
            Err(AgentError::RosterFull { capacity: 1 })
        ));
    }

    #[test]
    fn duplicate_uuid_is_rejected() {
        let mut roster = CubeRoster::new(5);
        assert!(roster.push(make_cube(0, PlayerKind::Male, 0.0, 0.0, 1.0)).is_ok());
        assert!(matches!(
            roster.push(make_cube(0, PlayerKind::Male, 1.0, 1.0, 1.0)),
            Err(AgentError::DuplicateUuid { index: 0, .. })
        ));
    }

    #[test]
    fn place_rewrites_slot_and_remaps_uuid() {
        let mut roster = CubeRoster::new(5);
        assert!(roster.push(make_cube(0, PlayerKind::Male, 0.0, 0.0, 1.0)).is_ok());
        assert!(roster.place(0, make_cube(7, PlayerKind::Predator, 2.0, 2.0, 5.0)).is_ok());
        assert_eq!(roster.len(), 1);
        assert!(roster.index_of(&CubeUuid::from("male-0")).is_none());
        assert_eq!(roster.index_of(&CubeUuid::from("predator-7")), Some(0));
    }

    #[test]
    fn resolve_index_rules() {
        let mut roster = CubeRoster::new(2);
        assert_eq!(roster.resolve_index(-1).ok(), Some(0));
        assert!(matches!(roster.resolve_index(1), Err(AgentError::IndexGap { .. })));
        assert!(matches!(
            roster.resolve_index(2),
            Err(AgentError::IndexOutOfRange { .. })
        ));
        assert!(roster.push(make_cube(0, PlayerKind::Male, 0.0, 0.0, 1.0)).is_ok());
        assert!(roster.push(make_cube(1, PlayerKind::Male, 0.0, 0.0, 1.0)).is_ok());
        assert!(matches!(roster.resolve_index(-1), Err(AgentError::RosterFull { .. })));
        assert_eq!(roster.resolve_index(1).ok(), Some(1));
    }

    #[test]
    fn pair_mut_preserves_argument_order() {
        let mut roster = CubeRoster::new(3);
        assert!(roster.push(make_cube(0, PlayerKind::Male, 0.0, 0.0, 1.0)).is_ok());
        assert!(roster.push(make_cube(1, PlayerKind::Female, 0.0, 0.0, 1.0)).is_ok());
        let (a, b) = roster.pair_mut(1, 0).unwrap();
        assert_eq!(a.kind, PlayerKind::Female);
        assert_eq!(b.kind, PlayerKind::Male);
        assert!(roster.pair_mut(0, 0).is_none());
    }
}
