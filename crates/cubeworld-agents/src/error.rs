//! Error types for the cubeworld-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! This module defines the error hierarchy used across roster management
//! and agent actions.

use cubeworld_types::CubeUuid;

/// Errors that can occur during agent state operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Every roster slot is occupied.
    #[error("maximum number of cubes ({capacity}) already allocated")]
    RosterFull {
        /// Roster capacity.
        capacity: usize,
    },

    /// A slot index is negative or at/beyond capacity.
    #[error("cube index {index} exceeds allocation ({capacity})")]
    IndexOutOfRange {
        /// The offending index.
        index: i64,
        /// Roster capacity.
        capacity: usize,
    },

    /// A slot index would leave unoccupied slots below it.
    #[error("cube index {index} leaves a gap after {len} cubes")]
    IndexGap {
        /// The offending index.
        index: usize,
        /// Current roster length.
        len: usize,
    },

    /// The uuid already belongs to a cube in another slot.
    #[error("duplicate cube uuid {uuid} (already at index {index})")]
    DuplicateUuid {
        /// The clashing uuid.
        uuid: CubeUuid,
        /// Slot that owns it.
        index: usize,
    },

    /// Agent with the given uuid was not found in the roster.
    #[error("cube not found: {0}")]
    CubeNotFound(CubeUuid),

    /// The cube is inactive and cannot act.
    #[error("cube {0} is not active")]
    NotActive(CubeUuid),
}
