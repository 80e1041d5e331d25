//! Cube state, roster, and per-cube mechanics for the Cubeworld simulation.
//!
//! This crate contains the logic layer for cubes: everything that operates
//! on a cube (or a pair of cubes) without touching sockets or rendering. It
//! sits between `cubeworld-world` (geometry and scene records) and
//! `cubeworld-core` (the tick driver that decides when these run).
//!
//! # Modules
//!
//! - [`agent`] -- The cube record ([`Cube`]) with its ledgers and waypoints
//! - [`combat`] -- Player vs. predator fights ([`attack`])
//! - [`config`] -- Tunable energy, life, combat and motion parameters ([`AgentConfig`])
//! - [`death`] -- Death causes and consequences ([`DeathCause`])
//! - [`error`] -- Error types for roster and cube operations ([`AgentError`])
//! - [`family`] -- Lineage checks for mating and courting
//! - [`forage`] -- Players drawing energy from resources ([`feed`])
//! - [`motion`] -- Stepping, blocking, backups and steering
//! - [`reproduction`] -- Mating rules and child creation ([`mate`])
//! - [`roster`] -- Fixed-capacity cube storage with uuid lookup ([`CubeRoster`])
//! - [`vitals`] -- Per-tick energy burn and growth

pub mod agent;
pub mod combat;
pub mod config;
pub mod death;
pub mod error;
pub mod family;
pub mod forage;
pub mod motion;
pub mod reproduction;
pub mod roster;
pub mod vitals;

// Re-export primary types at crate root for convenience.
pub use agent::{CaptureRecord, Cube, Lineage, MatchRecord, Targets, Waypoint};
pub use combat::{AttackOutcome, attack};
pub use config::AgentConfig;
pub use death::{DeathCause, kill};
pub use error::AgentError;
pub use forage::feed;
pub use motion::MoveCommand;
pub use reproduction::{Birth, ChildTexture, MateRefusal, mate};
pub use roster::CubeRoster;
