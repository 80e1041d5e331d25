//! Enumeration types for the Cubeworld simulation.
//!
//! Kinds are a closed set, fixed at birth. Contact outcomes between two
//! kinds come from a constant 5x5 table keyed by [`PlayerKind::index`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Player kinds
// ---------------------------------------------------------------------------

/// The kind of a cube. Determines its strategy and contact behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Mates with females, hunts predators when strong, forages.
    Male,
    /// Mates with males when adult and rested, forages.
    Female,
    /// Non-binary player. Cannot mate; hunts predators with a luck bonus.
    Enby,
    /// Hunts smaller male, female and enby cubes.
    Predator,
    /// Static energy source consumed by players.
    Resource,
}

impl PlayerKind {
    /// All kinds, in contact-table order.
    pub const ALL: [Self; 5] = [
        Self::Male,
        Self::Female,
        Self::Enby,
        Self::Predator,
        Self::Resource,
    ];

    /// Row/column of this kind in the contact table.
    pub const fn index(self) -> usize {
        match self {
            Self::Male => 0,
            Self::Female => 1,
            Self::Enby => 2,
            Self::Predator => 3,
            Self::Resource => 4,
        }
    }

    /// Wire name of the kind (`"male"`, `"female"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Enby => "enby",
            Self::Predator => "predator",
            Self::Resource => "resource",
        }
    }

    /// Male, female and enby cubes are players: they burn energy, forage
    /// and can be preyed upon.
    pub const fn is_player(self) -> bool {
        matches!(self, Self::Male | Self::Female | Self::Enby)
    }
}

impl core::fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Contact events
// ---------------------------------------------------------------------------

/// What happens when two cubes touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactEvent {
    /// No state change; the blocking pass keeps them apart.
    Stop,
    /// A male and a female may produce a child.
    Mate,
    /// A player and a predator fight.
    Attack,
    /// A player draws energy from a resource.
    Feed,
}

// ---------------------------------------------------------------------------
// Waypoints
// ---------------------------------------------------------------------------

/// Event recorded in a cube's waypoint log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaypointEvent {
    /// Created or resting.
    Idle,
    /// A move was requested.
    Movement,
    /// Stopped by the playfield edge or another cube.
    Blocked,
    /// Started a backup manoeuvre.
    Reverse,
}

impl WaypointEvent {
    /// Numeric code used in waypoint exports (0..=3).
    pub const fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Movement => 1,
            Self::Blocked => 2,
            Self::Reverse => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Pixel layout
// ---------------------------------------------------------------------------

/// Channel layout of a captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelMode {
    /// Four channels as read back from the renderer.
    #[serde(rename = "RGBA")]
    Rgba,
    /// Three channels, blue first, as delivered to clients.
    #[serde(rename = "BGR")]
    Bgr,
}

impl PixelMode {
    /// Wire name of the layout.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rgba => "RGBA",
            Self::Bgr => "BGR",
        }
    }
}
