//! TCP/JSON session server for the Cubeworld simulation.
//!
//! Remote clients connect over TCP, log in to a cube and then steer it,
//! query its status and ask for rendered views. This crate provides:
//!
//! - **Framing and codec** ([`codec`]): JSON messages off a byte stream,
//!   request decoding and zlib + base64 image payloads
//! - **Dispatch** ([`handlers`]): one [`Session`] per connection, mapping
//!   requests to replies and fixed error objects
//! - **Lifecycle** ([`server`]): a non-blocking acceptor drained by the tick
//!   thread and a fixed pool of blocking worker threads
//! - **Credentials** ([`login`]): a pluggable [`LoginPolicy`]
//!
//! Workers never render. View requests go through the render bridge in
//! `cubeworld-core` and wait for the tick thread to capture the frame.

pub mod codec;
pub mod error;
pub mod handlers;
pub mod login;
pub mod server;

pub use error::ServerError;
pub use handlers::{Reply, Session};
pub use login::{AcceptAll, LoginPolicy};
pub use server::SessionServer;
