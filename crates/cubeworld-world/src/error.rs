//! Error types for the `cubeworld-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

/// Errors that can occur while placing scenery into fixed-capacity slots.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A slot index is negative or at/beyond the table capacity.
    #[error("{section} index {index} exceeds allocation ({capacity})")]
    IndexOutOfRange {
        /// Table name, e.g. `"lights"`.
        section: &'static str,
        /// The offending index.
        index: i64,
        /// Capacity of the table.
        capacity: usize,
    },

    /// Every slot of the table is already occupied.
    #[error("maximum number of {section} ({capacity}) already allocated")]
    CapacityExhausted {
        /// Table name.
        section: &'static str,
        /// Capacity of the table.
        capacity: usize,
    },
}
