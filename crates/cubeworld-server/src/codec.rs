//! Message framing and payload encoding.
//!
//! Clients send bare JSON objects back to back, without delimiters; a
//! single `recv` usually carries exactly one. [`FrameReader`] buffers raw
//! bytes and peels complete objects off the front with `serde_json`'s
//! streaming deserializer, so split and coalesced reads both work.
//!
//! Image payloads are zlib-compressed (default level) and then base64
//! encoded.

use std::io::{self, Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use cubeworld_types::{
    Envelope, ErrorKind, GroundViewRequest, ImportJsonFileRequest, ImportJsonObjectRequest, LoginRequest, MoveRequest,
    ViewRequest, message_types,
};

/// Errors decoding an image payload.
#[derive(Debug, thiserror::Error)]
pub enum PixelDecodeError {
    /// The payload is not valid base64.
    #[error("invalid base64: {source}")]
    Base64 {
        /// Underlying decode error.
        #[from]
        source: base64::DecodeError,
    },

    /// The payload is not a valid zlib stream.
    #[error("invalid zlib stream: {source}")]
    Zlib {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },
}

/// One unit read off a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A complete JSON value.
    Message(Value),
    /// Bytes that can never become valid JSON, or an oversized message.
    Malformed,
}

/// Reassembles JSON messages from a byte stream.
#[derive(Debug)]
pub struct FrameReader {
    buf: Vec<u8>,
    chunk: usize,
    max_message: usize,
}

impl FrameReader {
    /// A reader that reads `chunk` bytes at a time and gives up on messages
    /// longer than `max_message`.
    pub fn new(chunk: usize, max_message: usize) -> Self {
        Self {
            buf: Vec::new(),
            chunk: chunk.max(1),
            max_message,
        }
    }

    /// Append raw bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Read one chunk from `source` into the buffer. Returns the number of
    /// bytes read; 0 means the peer closed the connection.
    ///
    /// # Errors
    ///
    /// Propagates the read error, including timeouts.
    pub fn fill<R: Read>(&mut self, source: &mut R) -> io::Result<usize> {
        let mut chunk = vec![0_u8; self.chunk];
        let n = source.read(&mut chunk)?;
        self.push(chunk.get(..n).unwrap_or_default());
        Ok(n)
    }

    /// Take the next complete message, if the buffer holds one.
    pub fn next_message(&mut self) -> Option<Inbound> {
        if self.buf.iter().all(u8::is_ascii_whitespace) {
            self.buf.clear();
            return None;
        }
        let (parsed, used) = {
            let mut stream = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            let parsed = stream.next();
            (parsed, stream.byte_offset())
        };
        match parsed {
            Some(Ok(value)) => {
                self.buf.drain(..used);
                Some(Inbound::Message(value))
            }
            Some(Err(e)) if e.is_eof() => {
                if self.buf.len() > self.max_message {
                    tracing::warn!(buffered = self.buf.len(), "oversized message dropped");
                    self.buf.clear();
                    return Some(Inbound::Malformed);
                }
                None
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "malformed message dropped");
                self.buf.clear();
                Some(Inbound::Malformed)
            }
            None => {
                self.buf.clear();
                None
            }
        }
    }
}

/// A request body, decoded according to its `message_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Bind a cube.
    Login(LoginRequest),
    /// Release a cube.
    Logout,
    /// Steer a cube.
    Move(MoveRequest),
    /// Query a cube.
    Status,
    /// First-person view.
    View(ViewRequest),
    /// Ground view.
    GroundView(GroundViewRequest),
    /// Queue a scene file.
    ImportFile(ImportJsonFileRequest),
    /// Queue an inline scene.
    ImportObject(ImportJsonObjectRequest),
}

/// Decode the envelope and body of one message.
///
/// # Errors
///
/// Returns [`ErrorKind::UnknownMessageType`] for unknown message types,
/// malformed headers and missing body fields.
pub fn decode_request(value: &Value) -> Result<(Envelope, Request), ErrorKind> {
    let envelope: Envelope = body(value)?;
    let request = match envelope.message_type.as_str() {
        message_types::LOGIN_REQUEST => Request::Login(body(value)?),
        message_types::LOGOUT_REQUEST => Request::Logout,
        message_types::MOVE_REQUEST => Request::Move(body(value)?),
        message_types::STATUS_REQUEST => Request::Status,
        message_types::VIEW_REQUEST => Request::View(body(value)?),
        message_types::GROUND_VIEW_REQUEST => Request::GroundView(body(value)?),
        message_types::IMPORT_JSON_FILE_REQUEST => Request::ImportFile(body(value)?),
        message_types::IMPORT_JSON_OBJECT_REQUEST => Request::ImportObject(body(value)?),
        _ => return Err(ErrorKind::UnknownMessageType),
    };
    Ok((envelope, request))
}

fn body<T: DeserializeOwned>(value: &Value) -> Result<T, ErrorKind> {
    T::deserialize(value).map_err(|e| {
        tracing::debug!(error = %e, "request body rejected");
        ErrorKind::UnknownMessageType
    })
}

/// Serialize a response.
///
/// # Errors
///
/// Returns the serialization error; none of the protocol types can fail.
pub fn encode<T: Serialize>(response: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(response)
}

/// Compress and base64-encode raw pixels.
///
/// # Errors
///
/// Returns the compressor's I/O error.
pub fn encode_pixels(pixels: &[u8]) -> io::Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(pixels)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Reverse [`encode_pixels`].
///
/// # Errors
///
/// Returns [`PixelDecodeError`] if the text is not base64 or not zlib.
pub fn decode_pixels(text: &str) -> Result<Vec<u8>, PixelDecodeError> {
    let compressed = STANDARD.decode(text)?;
    let mut pixels = Vec::new();
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut pixels)?;
    Ok(pixels)
}
