//! Request dispatch for one client connection.
//!
//! A [`Session`] decodes each inbound message, checks that the named cube
//! is bound, and produces the serialized reply. It takes the simulation
//! lock only for request-scoped sections and never while waiting for a
//! view.
//!
//! | Request | Reply |
//! |---------|-------|
//! | `LoginRequest` | `LoginResponse`, or `GoodBye` and close |
//! | `LogoutRequest` | `LogoutResponse`, or `GoodBye` and close |
//! | `MoveRequest` | `MoveResponse` |
//! | `StatusRequest` | `StatusResponse` |
//! | `ViewRequest` | `ViewResponse` |
//! | `GroundViewRequest` | `GroundViewResponse` |
//! | `ImportJSONFileRequest` | `ImportJSONFileResponse` |
//! | `ImportJSONObjectRequest` | `ImportJSONObjectResponse` |

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use serde::Serialize;
use tracing::{debug, info};

use cubeworld_agents::motion::{self, MoveCommand};
use cubeworld_core::capture::{CaptureError, ViewImage};
use cubeworld_core::control::now_seconds;
use cubeworld_core::inbox::ImportRequest;
use cubeworld_core::{Simulation, SimulationHandle};
use cubeworld_types::{
    CubeUuid, Envelope, ErrorKind, ErrorResponse, GoodBye, GroundViewRequest, GroundViewResponse, ImportJsonResponse,
    LoginRequest, LoginResponse, LogoutResponse, MoveRequest, MoveResponse, StatusResponse, ViewRequest, ViewResponse,
    message_types,
};

use crate::codec::{self, Inbound, Request};
use crate::error::ServerError;
use crate::login::LoginPolicy;

/// Serialized reply and whether the connection ends after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// JSON bytes to write.
    pub body: Vec<u8>,
    /// Close the connection once written.
    pub close: bool,
}

impl Reply {
    fn send<T: Serialize>(response: &T) -> Result<Self, ServerError> {
        Ok(Self {
            body: codec::encode(response)?,
            close: false,
        })
    }

    fn error(kind: ErrorKind) -> Result<Self, ServerError> {
        Self::send(&ErrorResponse::from(kind))
    }

    fn goodbye() -> Result<Self, ServerError> {
        Ok(Self {
            body: codec::encode(&GoodBye::default())?,
            close: true,
        })
    }
}

/// Per-connection state.
pub struct Session {
    handle: Arc<SimulationHandle>,
    policy: Arc<dyn LoginPolicy>,
    /// Cubes this connection logged in, kept after they die so status
    /// still answers for them.
    bound: HashSet<CubeUuid>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("bound", &self.bound).finish_non_exhaustive()
    }
}

/// A closed connection releases its cubes so another client can log in.
impl Drop for Session {
    fn drop(&mut self) {
        if self.bound.is_empty() {
            return;
        }
        let mut sim = self.handle.lock();
        for uuid in self.bound.drain() {
            if sim.world.logout(&uuid) {
                info!(cube = %uuid, "released on disconnect");
            }
        }
    }
}

impl Session {
    /// A fresh connection with nothing bound.
    pub fn new(handle: Arc<SimulationHandle>, policy: Arc<dyn LoginPolicy>) -> Self {
        Self {
            handle,
            policy,
            bound: HashSet::new(),
        }
    }

    /// Cubes logged in on this connection.
    pub const fn bound(&self) -> &HashSet<CubeUuid> {
        &self.bound
    }

    /// Answer one unit read off the socket.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the reply cannot be serialized or the
    /// image cannot be compressed.
    pub fn handle_inbound(&mut self, inbound: &Inbound) -> Result<Reply, ServerError> {
        match inbound {
            Inbound::Message(value) => match codec::decode_request(value) {
                Ok((envelope, request)) => self.dispatch(&envelope, request),
                Err(kind) => Reply::error(kind),
            },
            Inbound::Malformed => Reply::error(ErrorKind::UnknownMessageType),
        }
    }

    /// Answer a decoded request.
    ///
    /// # Errors
    ///
    /// See [`Session::handle_inbound`].
    pub fn dispatch(&mut self, envelope: &Envelope, request: Request) -> Result<Reply, ServerError> {
        debug!(message_type = %envelope.message_type, sequence = envelope.sequence, cube = %envelope.cube_uuid, "request");
        match request {
            Request::Login(login) => return self.login(envelope, &login),
            Request::Logout => return self.logout(envelope),
            _ => {}
        }

        if let Err(kind) = self.check_binding(&self.handle.lock(), &envelope.cube_uuid) {
            return Reply::error(kind);
        }

        match request {
            Request::Move(order) => self.move_cube(envelope, &order),
            Request::Status => self.status(envelope),
            Request::View(view) => self.view(envelope, &view),
            Request::GroundView(ground) => self.ground_view(envelope, ground),
            Request::ImportFile(file) => self.import(
                envelope,
                ImportRequest::File(PathBuf::from(file.jsonfilename)),
                message_types::IMPORT_JSON_FILE_RESPONSE,
            ),
            Request::ImportObject(object) => self.import(
                envelope,
                ImportRequest::Object(object.jsonobject),
                message_types::IMPORT_JSON_OBJECT_RESPONSE,
            ),
            Request::Login(_) | Request::Logout => Reply::error(ErrorKind::UnknownMessageType),
        }
    }

    /// A cube answers only the connection that bound it, while it stays
    /// bound. It keeps answering after it leaves the game, so the client
    /// can see how it died.
    fn check_binding(&self, sim: &Simulation, uuid: &CubeUuid) -> Result<(), ErrorKind> {
        let cube = sim.world.cubes.by_uuid(uuid).ok_or(ErrorKind::CubeIndexNotFound)?;
        if self.bound.contains(uuid) && (cube.remote || !cube.active) {
            Ok(())
        } else {
            Err(ErrorKind::RemoteNotEnabled)
        }
    }

    fn login(&mut self, envelope: &Envelope, login: &LoginRequest) -> Result<Reply, ServerError> {
        if !self.policy.accept(&login.username, &login.password) {
            info!(username = %login.username, "login rejected");
            return Reply::goodbye();
        }
        let mut sim = self.handle.lock();
        let held_elsewhere = sim.world.cubes.by_uuid(&envelope.cube_uuid).is_some_and(|c| c.remote)
            && !self.bound.contains(&envelope.cube_uuid);
        if held_elsewhere {
            info!(cube = %envelope.cube_uuid, "login for a cube another session holds");
            return Reply::goodbye();
        }
        if !sim.world.login(&envelope.cube_uuid) {
            info!(cube = %envelope.cube_uuid, "login for unknown cube");
            return Reply::goodbye();
        }
        self.bound.insert(envelope.cube_uuid.clone());
        info!(cube = %envelope.cube_uuid, username = %login.username, ground = %login.ground_uuid, "login");
        Reply::send(&LoginResponse {
            message_type: message_types::LOGIN_RESPONSE,
            sequence: envelope.sequence,
            timestamp: sim.last_tick(),
            cube_uuid: envelope.cube_uuid.clone(),
            frame: sim.frame(),
        })
    }

    fn logout(&mut self, envelope: &Envelope) -> Result<Reply, ServerError> {
        let mut sim = self.handle.lock();
        if !self.bound.remove(&envelope.cube_uuid) {
            return if sim.world.cubes.by_uuid(&envelope.cube_uuid).is_some_and(|c| c.remote) {
                Reply::error(ErrorKind::RemoteNotEnabled)
            } else {
                Reply::goodbye()
            };
        }
        if !sim.world.logout(&envelope.cube_uuid) {
            return Reply::goodbye();
        }
        info!(cube = %envelope.cube_uuid, "logout");
        Reply::send(&LogoutResponse {
            message_type: message_types::LOGOUT_RESPONSE,
            sequence: envelope.sequence,
            timestamp: sim.last_tick(),
            cube_uuid: envelope.cube_uuid.clone(),
        })
    }

    fn move_cube(&self, envelope: &Envelope, order: &MoveRequest) -> Result<Reply, ServerError> {
        let command = MoveCommand {
            angle: order.spatial_angle,
            direction: order.spatial_direction,
            direction_active: order.spatial_direction_active,
            velocity: order.velocity,
            distance: order.distance,
            gaze: Vec2::from(order.gaze),
        };
        let mut guard = self.handle.lock();
        let (fps, frame, timestamp) = (guard.fps(), guard.frame(), guard.last_tick());
        let sim = &mut *guard;
        let bound = sim.world.bound();
        let Some(cube) = sim.world.cubes.by_uuid_mut(&envelope.cube_uuid) else {
            return Reply::error(ErrorKind::CubeIndexNotFound);
        };
        if motion::remote_move(cube, &command, &sim.agent, bound, fps, now_seconds()).is_err() {
            return Reply::error(ErrorKind::CubeNotActive);
        }
        Reply::send(&MoveResponse {
            message_type: message_types::MOVE_RESPONSE,
            sequence: envelope.sequence,
            timestamp,
            cube_uuid: envelope.cube_uuid.clone(),
            frame,
            spatial_position_blocked: cube.position_blocked,
            resource_energy: cube.energy,
        })
    }

    fn status(&self, envelope: &Envelope) -> Result<Reply, ServerError> {
        let sim = self.handle.lock();
        let Some(cube) = sim.world.cubes.by_uuid(&envelope.cube_uuid) else {
            return Reply::error(ErrorKind::CubeIndexNotFound);
        };
        Reply::send(&StatusResponse {
            message_type: message_types::STATUS_RESPONSE,
            sequence: envelope.sequence,
            timestamp: sim.last_tick(),
            frame: sim.frame(),
            cube_uuid: cube.uuid.clone(),
            cube_player: cube.kind.as_str().to_owned(),
            cube_firstname: cube.firstname.clone(),
            cube_active: cube.active,
            cube_display: cube.display,
            cube_remote: cube.remote,
            cube_scale_factor: cube.scale_factor,
            spatial_angle: cube.yaw(),
            spatial_direction: cube.direction,
            spatial_direction_active: cube.direction_active,
            spatial_gaze: cube.gaze.to_array(),
            spatial_radius: cube.radius,
            spatial_distance: cube.distance,
            spatial_distance_previous: cube.distance_previous,
            spatial_velocity: cube.velocity,
            spatial_position_blocked: cube.position_blocked,
            life_birth: cube.life.birth,
            life_death: cube.life.death,
            life_father: cube.life.father.clone(),
            life_mother: cube.life.mother.clone(),
            resource_energy: cube.energy,
            total_points: cube.total_points(),
        })
    }

    fn view(&self, envelope: &Envelope, view: &ViewRequest) -> Result<Reply, ServerError> {
        let image = match self
            .handle
            .first_person_view(&envelope.cube_uuid, view.spatial_angle, Vec2::from(view.gaze))
        {
            Ok(image) => image,
            Err(e) => return Reply::error(error_kind(&e)),
        };
        let (frame, timestamp) = self.clock();
        let pixels_b64 = encoded_pixels(&image)?;
        Reply::send(&ViewResponse {
            message_type: message_types::VIEW_RESPONSE,
            sequence: envelope.sequence,
            timestamp,
            frame,
            cube_uuid: envelope.cube_uuid.clone(),
            extension: "raw",
            mode: image.mode.as_str(),
            width: image.width,
            height: image.height,
            channels: image.channels,
            bounding_box: image.bounding_box,
            pixels_b64,
            pixels_frame: image.pixels_frame,
        })
    }

    fn ground_view(&self, envelope: &Envelope, ground: GroundViewRequest) -> Result<Reply, ServerError> {
        let image = match self.handle.ground_view(i64::from(ground.groundview)) {
            Ok(image) => image,
            Err(e) => return Reply::error(error_kind(&e)),
        };
        let (frame, timestamp) = self.clock();
        let pixels_b64 = encoded_pixels(&image)?;
        Reply::send(&GroundViewResponse {
            message_type: message_types::GROUND_VIEW_RESPONSE,
            sequence: envelope.sequence,
            timestamp,
            frame,
            groundview: ground.groundview,
            extension: "raw",
            mode: image.mode.as_str(),
            width: image.width,
            height: image.height,
            channels: image.channels,
            bounding_box: image.bounding_box,
            pixels_b64,
            pixels_frame: image.pixels_frame,
        })
    }

    fn import(&self, envelope: &Envelope, request: ImportRequest, reply_type: &'static str) -> Result<Reply, ServerError> {
        let described = request.describe();
        if let Err(e) = self.handle.submit_import(request) {
            info!(request = %described, error = %e, "import refused");
            return Reply::error(ErrorKind::JsonImportFailed);
        }
        info!(request = %described, cube = %envelope.cube_uuid, "import queued");
        let (_, timestamp) = self.clock();
        Reply::send(&ImportJsonResponse {
            message_type: reply_type,
            sequence: envelope.sequence,
            timestamp,
        })
    }

    /// Frame counter and time of the last tick.
    fn clock(&self) -> (u64, f64) {
        let sim = self.handle.lock();
        (sim.frame(), sim.last_tick())
    }
}

fn error_kind(error: &CaptureError) -> ErrorKind {
    match error {
        CaptureError::UnknownCube(_) => ErrorKind::CubeIndexNotFound,
        CaptureError::ScreenViewNotAllowed(_) => ErrorKind::ScreenViewNotAllowed,
        CaptureError::GroundViewNotAllowed { .. } => ErrorKind::GroundViewNotAllowed,
    }
}

/// Pixels for the wire, or `None` if the barrier never captured.
fn encoded_pixels(image: &ViewImage) -> Result<Option<String>, ServerError> {
    if image.pixels_frame.is_none() {
        return Ok(None);
    }
    Ok(Some(codec::encode_pixels(&image.pixels)?))
}
