//! Shared type definitions for the Cubeworld simulation.
//!
//! This crate is the single source of truth for the identifiers, closed
//! enumerations and wire-protocol payloads used across the workspace.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed uuid wrappers for cubes and grounds
//! - [`enums`] -- Player kinds, contact events, waypoint events, pixel layouts
//! - [`protocol`] -- Request and response payloads of the TCP/JSON protocol

pub mod enums;
pub mod ids;
pub mod protocol;

// Re-export all public types at crate root for convenience.
pub use enums::{ContactEvent, PixelMode, PlayerKind, WaypointEvent};
pub use ids::{CubeUuid, GroundUuid};
pub use protocol::{
    Envelope, ErrorKind, ErrorResponse, GoodBye, GroundViewRequest, GroundViewResponse,
    ImportJsonFileRequest, ImportJsonObjectRequest, ImportJsonResponse, LoginRequest,
    LoginResponse, LogoutResponse, MoveRequest, MoveResponse, StatusResponse, ViewRequest,
    ViewResponse, message_types,
};
