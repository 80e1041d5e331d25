//! Wire protocol payloads exchanged with remote clients.
//!
//! Every message is a single JSON object carrying `message_type`,
//! `sequence` and `timestamp`. Requests are decoded in two steps: the
//! [`Envelope`] first, then the body struct for the named message type.
//! Responses echo the request's `sequence` and carry the frame counter.

use serde::{Deserialize, Serialize};

use crate::ids::{CubeUuid, GroundUuid};

// ---------------------------------------------------------------------------
// Message type names
// ---------------------------------------------------------------------------

/// Message type names as they appear on the wire.
pub mod message_types {
    /// Bind a cube to the session.
    pub const LOGIN_REQUEST: &str = "LoginRequest";
    /// Release the bound cube.
    pub const LOGOUT_REQUEST: &str = "LogoutRequest";
    /// Steer the bound cube.
    pub const MOVE_REQUEST: &str = "MoveRequest";
    /// Query the bound cube.
    pub const STATUS_REQUEST: &str = "StatusRequest";
    /// Capture a first-person view.
    pub const VIEW_REQUEST: &str = "ViewRequest";
    /// Capture a ground view.
    pub const GROUND_VIEW_REQUEST: &str = "GroundViewRequest";
    /// Queue a scene file for import.
    pub const IMPORT_JSON_FILE_REQUEST: &str = "ImportJSONFileRequest";
    /// Queue an inline scene object for import.
    pub const IMPORT_JSON_OBJECT_REQUEST: &str = "ImportJSONObjectRequest";

    /// Reply to a login.
    pub const LOGIN_RESPONSE: &str = "LoginResponse";
    /// Reply to a logout.
    pub const LOGOUT_RESPONSE: &str = "LogoutResponse";
    /// Reply to a move.
    pub const MOVE_RESPONSE: &str = "MoveResponse";
    /// Reply to a status query.
    pub const STATUS_RESPONSE: &str = "StatusResponse";
    /// Reply to a view request.
    pub const VIEW_RESPONSE: &str = "ViewResponse";
    /// Reply to a ground view request.
    pub const GROUND_VIEW_RESPONSE: &str = "GroundViewResponse";
    /// Reply to a scene file import.
    pub const IMPORT_JSON_FILE_RESPONSE: &str = "ImportJSONFileResponse";
    /// Reply to an inline scene import.
    pub const IMPORT_JSON_OBJECT_RESPONSE: &str = "ImportJSONObjectResponse";
    /// Fixed error object.
    pub const ERROR: &str = "Error";
    /// Session terminator.
    pub const GOODBYE: &str = "GoodBye";
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Common header present on every request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    /// Name of the request, e.g. `"MoveRequest"`.
    #[serde(default)]
    pub message_type: String,
    /// Client-chosen sequence number echoed in the response.
    #[serde(default)]
    pub sequence: u32,
    /// Client timestamp in seconds since the epoch.
    #[serde(default)]
    pub timestamp: f64,
    /// Cube the request is about. Empty for pure ground requests.
    #[serde(default)]
    pub cube_uuid: CubeUuid,
}

/// Login credentials and the cube to bind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    /// Ground the client intends to observe.
    #[serde(default)]
    pub ground_uuid: GroundUuid,
    /// Account name.
    pub username: String,
    /// Account secret.
    pub password: String,
}

/// Steering command for a bound cube.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveRequest {
    /// New facing yaw in radians.
    pub spatial_angle: f32,
    /// Heading of travel used when `spatial_direction_active` is set.
    pub spatial_direction: f32,
    /// Travel along `spatial_direction` instead of the facing yaw.
    pub spatial_direction_active: bool,
    /// Requested speed; clamped to the velocity limit.
    pub velocity: f32,
    /// Distance to travel before stopping; 0 means unlimited.
    pub distance: f32,
    /// Absolute gaze offsets (yaw, pitch).
    pub gaze: [f32; 2],
}

/// First-person view request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewRequest {
    /// Facing yaw to render from.
    pub spatial_angle: f32,
    /// Absolute gaze offsets (yaw, pitch).
    pub gaze: [f32; 2],
}

/// Ground view request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GroundViewRequest {
    /// Index of the ground to capture.
    pub groundview: i32,
}

/// Deferred import of a scene file on the server's filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportJsonFileRequest {
    /// Path of the scene file.
    pub jsonfilename: String,
}

/// Deferred import of an inline scene object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportJsonObjectRequest {
    /// Scene record serialized as a JSON string.
    pub jsonobject: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Reply to a successful login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginResponse {
    /// Always `"LoginResponse"`.
    pub message_type: &'static str,
    /// Echoed request sequence.
    pub sequence: u32,
    /// Wall-clock seconds of the last completed tick.
    pub timestamp: f64,
    /// The bound cube.
    pub cube_uuid: CubeUuid,
    /// Current frame counter.
    pub frame: u64,
}

/// Reply to a logout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogoutResponse {
    /// Always `"LogoutResponse"`.
    pub message_type: &'static str,
    /// Echoed request sequence.
    pub sequence: u32,
    /// Wall-clock seconds of the last completed tick.
    pub timestamp: f64,
    /// The released cube.
    pub cube_uuid: CubeUuid,
}

/// Reply to an accepted move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveResponse {
    /// Always `"MoveResponse"`.
    pub message_type: &'static str,
    /// Echoed request sequence.
    pub sequence: u32,
    /// Wall-clock seconds of the last completed tick.
    pub timestamp: f64,
    /// The moved cube.
    pub cube_uuid: CubeUuid,
    /// Current frame counter.
    pub frame: u64,
    /// Whether the immediate step was blocked.
    pub spatial_position_blocked: bool,
    /// Energy after the step.
    pub resource_energy: f32,
}

/// Full status of a bound cube.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    /// Always `"StatusResponse"`.
    pub message_type: &'static str,
    /// Echoed request sequence.
    pub sequence: u32,
    /// Wall-clock seconds of the last completed tick.
    pub timestamp: f64,
    /// Current frame counter.
    pub frame: u64,
    /// The queried cube.
    pub cube_uuid: CubeUuid,
    /// Kind name.
    pub cube_player: String,
    /// Display name.
    pub cube_firstname: String,
    /// Participating in the simulation.
    pub cube_active: bool,
    /// Visible on the playfield.
    pub cube_display: bool,
    /// Bound to a session.
    pub cube_remote: bool,
    /// Adult size.
    pub cube_scale_factor: f32,
    /// Facing yaw.
    pub spatial_angle: f32,
    /// Travel heading override.
    pub spatial_direction: f32,
    /// Whether the heading override is in effect.
    pub spatial_direction_active: bool,
    /// Gaze offsets (yaw, pitch).
    pub spatial_gaze: [f32; 2],
    /// Half-diagonal in the XZ plane.
    pub spatial_radius: f32,
    /// Remaining travel distance.
    pub spatial_distance: f32,
    /// Remaining travel distance before the last step.
    pub spatial_distance_previous: f32,
    /// Current speed.
    pub spatial_velocity: f32,
    /// Stopped by an edge or another cube.
    pub spatial_position_blocked: bool,
    /// Birth time in seconds since the epoch.
    pub life_birth: f64,
    /// Death time in seconds since the epoch; 0 while alive.
    pub life_death: f64,
    /// Father's uuid, empty for seeded cubes.
    pub life_father: CubeUuid,
    /// Mother's uuid, empty for seeded cubes.
    pub life_mother: CubeUuid,
    /// Energy meter.
    pub resource_energy: f32,
    /// Score as (total, mate, food, kill).
    pub total_points: [f32; 4],
}

/// Captured first-person image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResponse {
    /// Always `"ViewResponse"`.
    pub message_type: &'static str,
    /// Echoed request sequence.
    pub sequence: u32,
    /// Wall-clock seconds of the last completed tick.
    pub timestamp: f64,
    /// Current frame counter.
    pub frame: u64,
    /// The viewing cube.
    pub cube_uuid: CubeUuid,
    /// Image container, always `"raw"`.
    pub extension: &'static str,
    /// `"BGR"` or `"RGBA"`.
    pub mode: &'static str,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channels per pixel.
    pub channels: u32,
    /// Cube outline in image space (xmin, ymin, xmax, ymax), top-left origin.
    pub bounding_box: [f32; 4],
    /// zlib-compressed, base64-encoded pixels. Absent if nothing was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels_b64: Option<String>,
    /// Frame at which the pixels were captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels_frame: Option<u64>,
}

/// Captured ground image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundViewResponse {
    /// Always `"GroundViewResponse"`.
    pub message_type: &'static str,
    /// Echoed request sequence.
    pub sequence: u32,
    /// Wall-clock seconds of the last completed tick.
    pub timestamp: f64,
    /// Current frame counter.
    pub frame: u64,
    /// Index of the captured ground.
    pub groundview: i32,
    /// Image container, always `"raw"`.
    pub extension: &'static str,
    /// `"BGR"` or `"RGBA"`.
    pub mode: &'static str,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channels per pixel.
    pub channels: u32,
    /// Unused for ground views; zeros.
    pub bounding_box: [f32; 4],
    /// zlib-compressed, base64-encoded pixels. Absent if nothing was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels_b64: Option<String>,
    /// Frame at which the pixels were captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels_frame: Option<u64>,
}

/// Acknowledgement of a queued import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportJsonResponse {
    /// `"ImportJSONFileResponse"` or `"ImportJSONObjectResponse"`.
    pub message_type: &'static str,
    /// Echoed request sequence.
    pub sequence: u32,
    /// Wall-clock seconds of the last completed tick.
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fixed error replies. The connection stays open after any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A move targeted an inactive cube.
    CubeNotActive,
    /// The ground is unknown, hidden or not enabled for viewing.
    GroundViewNotAllowed,
    /// No cube has the given uuid.
    CubeIndexNotFound,
    /// An import could not be queued.
    JsonImportFailed,
    /// The cube is not bound to a session.
    RemoteNotEnabled,
    /// Unknown, malformed or incomplete request.
    UnknownMessageType,
    /// The cube cannot be viewed (inactive, hidden or not remote).
    ScreenViewNotAllowed,
}

impl ErrorKind {
    /// Exact error text sent to clients.
    pub const fn message(self) -> &'static str {
        match self {
            Self::CubeNotActive => "Cube not active.",
            Self::GroundViewNotAllowed => "Ground View not allowed.",
            Self::CubeIndexNotFound => "Cube index not found.",
            Self::JsonImportFailed => "JSON file import failed.",
            Self::RemoteNotEnabled => "Remote not enabled.",
            Self::UnknownMessageType => "Unknown message type.",
            Self::ScreenViewNotAllowed => "Screen View not allowed.",
        }
    }
}

/// Fixed-string error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Always `"Error"`.
    pub message_type: &'static str,
    /// One of the [`ErrorKind`] texts.
    pub error: &'static str,
}

impl From<ErrorKind> for ErrorResponse {
    fn from(kind: ErrorKind) -> Self {
        Self {
            message_type: message_types::ERROR,
            error: kind.message(),
        }
    }
}

/// Session terminator. The worker closes the connection after sending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoodBye {
    /// Always `"GoodBye"`.
    pub message_type: &'static str,
}

impl Default for GoodBye {
    fn default() -> Self {
        Self {
            message_type: message_types::GOODBYE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_header_fields() {
        let env: Envelope = serde_json::from_str(r#"{"message_type":"StatusRequest"}"#).unwrap();
        assert_eq!(env.message_type, "StatusRequest");
        assert_eq!(env.sequence, 0);
        assert!(env.cube_uuid.is_empty());
    }

    #[test]
    fn move_request_requires_all_fields() {
        let partial = serde_json::from_str::<MoveRequest>(r#"{"spatial_angle":1.0}"#);
        assert!(partial.is_err());
        let full: MoveRequest = serde_json::from_str(
            r#"{"spatial_angle":1.0,"spatial_direction":0.0,"spatial_direction_active":false,
                "velocity":2.0,"distance":0.0,"gaze":[0.1,-0.2]}"#,
        )
        .unwrap();
        assert!((full.gaze[1] + 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn error_objects_use_fixed_text() {
        let json = serde_json::to_string(&ErrorResponse::from(ErrorKind::RemoteNotEnabled)).unwrap();
        assert_eq!(json, r#"{"message_type":"Error","error":"Remote not enabled."}"#);
    }

    #[test]
    fn goodbye_object() {
        let json = serde_json::to_string(&GoodBye::default()).unwrap();
        assert_eq!(json, r#"{"message_type":"GoodBye"}"#);
    }

    #[test]
    fn view_response_omits_pixels_when_empty() {
        let r = ViewResponse {
            message_type: message_types::VIEW_RESPONSE,
            sequence: 3,
            timestamp: 0.0,
            frame: 10,
            cube_uuid: CubeUuid::from("c"),
            extension: "raw",
            mode: "RGBA",
            width: 0,
            height: 0,
            channels: 4,
            bounding_box: [0.0; 4],
            pixels_b64: None,
            pixels_frame: None,
        };
        let v: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert!(v.get("pixels_b64").is_none());
        assert_eq!(v["sequence"], 3);
    }
}
