//! Session server lifecycle: acceptor, worker pool and connection loop.
//!
//! The listener is non-blocking and is drained once per tick by the tick
//! thread (through [`TickHooks`]). Accepted sockets go over an unbounded
//! MPMC queue to a fixed pool of worker threads, each serving one
//! connection at a time until the client leaves or is sent a goodbye.
//!
//! Dropping the acceptor closes the queue; idle workers then exit, and
//! busy ones leave their connection at the next read timeout once a stop
//! has been requested.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use cubeworld_core::config::ServerConfig;
use cubeworld_core::{SimulationHandle, TickHooks, TickSummary};

use crate::codec::FrameReader;
use crate::error::ServerError;
use crate::handlers::Session;
use crate::login::LoginPolicy;

/// How often a blocked read wakes up to check for shutdown.
const READ_POLL: Duration = Duration::from_millis(250);

/// What every worker needs to serve a connection.
struct WorkerContext {
    handle: Arc<SimulationHandle>,
    policy: Arc<dyn LoginPolicy>,
    read_buffer_bytes: usize,
    max_message_bytes: usize,
}

/// A bound listener plus the worker pool serving it.
pub struct SessionServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    queue: Option<Sender<TcpStream>>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for SessionServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionServer")
            .field("local_addr", &self.local_addr)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl SessionServer {
    /// Bind the configured address and start `config.workers` workers.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the address is invalid, cannot be bound,
    /// or a worker thread cannot be spawned.
    pub fn start(
        config: &ServerConfig,
        handle: Arc<SimulationHandle>,
        policy: Arc<dyn LoginPolicy>,
    ) -> Result<Self, ServerError> {
        let addr_text = format!("{}:{}", config.host, config.port);
        let addr: SocketAddr = addr_text
            .parse()
            .map_err(|source| ServerError::Address { addr: addr_text, source })?;
        let listener = TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "session server bound");

        let (tx, rx) = crossbeam_channel::unbounded::<TcpStream>();
        let context = Arc::new(WorkerContext {
            handle,
            policy,
            read_buffer_bytes: config.read_buffer_bytes,
            max_message_bytes: config.max_message_bytes,
        });

        let count = config.workers.max(1);
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let rx = rx.clone();
            let context = Arc::clone(&context);
            let worker = thread::Builder::new()
                .name(format!("session-{index}"))
                .spawn(move || worker_loop(index, &rx, &context))
                .map_err(|source| ServerError::Spawn { index, source })?;
            workers.push(worker);
        }
        info!(workers = count, "worker pool started");

        Ok(Self {
            listener,
            local_addr,
            queue: Some(tx),
            workers,
        })
    }

    /// The address actually bound; differs from the configured one when
    /// the port is 0.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Move every pending connection to the workers. Returns how many were
    /// accepted.
    pub fn drain_accepts(&self) -> usize {
        let Some(queue) = self.queue.as_ref() else {
            return 0;
        };
        let mut accepted = 0_usize;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "connection accepted");
                    if queue.send(stream).is_err() {
                        warn!(%peer, "no workers left, connection dropped");
                        break;
                    }
                    accepted = accepted.saturating_add(1);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
        accepted
    }

    /// Close the accept queue and wait for every worker to finish.
    pub fn shutdown(mut self) {
        self.queue = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("session worker panicked");
            }
        }
        info!(addr = %self.local_addr, "session server stopped");
    }
}

impl TickHooks for SessionServer {
    fn after_tick(&mut self, _summary: &TickSummary) {
        self.drain_accepts();
    }
}

fn worker_loop(index: usize, queue: &Receiver<TcpStream>, context: &WorkerContext) {
    for stream in queue {
        let peer = stream.peer_addr().ok();
        debug!(worker = index, ?peer, "serving connection");
        match serve(&stream, context) {
            Ok(()) => debug!(worker = index, ?peer, "connection closed"),
            Err(e) => warn!(worker = index, ?peer, error = %e, "connection failed"),
        }
    }
    debug!(worker = index, "worker exiting");
}

/// Read, answer and write until the peer leaves, a goodbye is sent, or a
/// stop is requested.
fn serve(stream: &TcpStream, context: &WorkerContext) -> Result<(), ServerError> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_POLL))?;
    stream.set_nodelay(true)?;

    let mut reader = FrameReader::new(context.read_buffer_bytes, context.max_message_bytes);
    let mut session = Session::new(Arc::clone(&context.handle), Arc::clone(&context.policy));
    let mut socket = stream;

    loop {
        while let Some(inbound) = reader.next_message() {
            let reply = session.handle_inbound(&inbound)?;
            socket.write_all(&reply.body)?;
            if reply.close {
                return Ok(());
            }
        }
        if context.handle.control().is_stop_requested() {
            return Ok(());
        }
        match reader.fill(&mut socket) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
            Err(e) if matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::BrokenPipe) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
}
