//! Fixed-capacity, index-addressed storage.
//!
//! Scene sections address their records by integer slot. Writing slot `k`
//! grows the live count to `k + 1`, so the table behaves like the dense
//! arrays scene files were authored against. Slots past the live count are
//! empty.

use crate::error::WorldError;

/// A table of at most `capacity` records addressed by slot index.
#[derive(Debug, Clone)]
pub struct SlotTable<T> {
    section: &'static str,
    capacity: usize,
    slots: Vec<Option<T>>,
}

impl<T> SlotTable<T> {
    /// Create an empty table. `section` names it in errors and logs.
    pub const fn new(section: &'static str, capacity: usize) -> Self {
        Self {
            section,
            capacity,
            slots: Vec::new(),
        }
    }

    /// Maximum number of slots.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live slots (highest written index + 1).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been written.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Validate an index coming from a scene record.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::IndexOutOfRange`] when negative or at/beyond capacity.
    pub fn check_index(&self, index: i64) -> Result<usize, WorldError> {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.capacity)
            .ok_or(WorldError::IndexOutOfRange {
                section: self.section,
                index,
                capacity: self.capacity,
            })
    }

    /// Write a record into `index`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::IndexOutOfRange`] when the index is invalid.
    pub fn set(&mut self, index: i64, value: T) -> Result<usize, WorldError> {
        let slot = self.check_index(index)?;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot.saturating_add(1), || None);
        }
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(value);
        }
        Ok(slot)
    }

    /// Write a record into the next free slot and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CapacityExhausted`] when the table is full.
    pub fn push(&mut self, value: T) -> Result<usize, WorldError> {
        let slot = self.slots.len();
        if slot >= self.capacity {
            return Err(WorldError::CapacityExhausted {
                section: self.section,
                capacity: self.capacity,
            });
        }
        self.slots.push(Some(value));
        Ok(slot)
    }

    /// Borrow the record at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutably borrow the record at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Iterate occupied slots with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    /// Mutably iterate occupied slots.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|v| (i, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_grows_live_count() {
        let mut table = SlotTable::new("lights", 5);
        assert!(table.set(2, "b").is_ok());
        assert_eq!(table.len(), 3);
        assert!(table.get(0).is_none());
        assert_eq!(table.get(2), Some(&"b"));
    }

    #[test]
    fn index_at_capacity_is_rejected() {
        let mut table = SlotTable::new("grounds", 5);
        assert!(matches!(
            table.set(5, 1),
            Err(WorldError::IndexOutOfRange { index: 5, .. })
        ));
        assert!(table.set(-1, 1).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn push_stops_at_capacity() {
        let mut table = SlotTable::new("textures", 2);
        assert_eq!(table.push('a').ok(), Some(0));
        assert_eq!(table.push('b').ok(), Some(1));
        assert!(matches!(
            table.push('c'),
            Err(WorldError::CapacityExhausted { capacity: 2, .. })
        ));
    }

    #[test]
    fn iter_skips_holes() {
        let mut table = SlotTable::new("wires", 4);
        let _ = table.set(0, 10);
        let _ = table.set(3, 40);
        let seen: Vec<_> = table.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(seen, vec![(0, 10), (3, 40)]);
    }
}
