//! Cubeworld server binary.
//!
//! Wires together configuration, scene loading, the session server and
//! the tick loop, then runs the simulation on the main thread, which also
//! owns the renderer.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line and load configuration
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation from configuration
//! 4. Apply the scene files named on the command line, in order
//! 5. Wrap the simulation in the shared render bridge
//! 6. Bind the session server and start its worker pool
//! 7. Run the tick loop until a stop is requested
//! 8. Stop the session server and log the result

mod cli;
mod error;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cubeworld_core::config::{CubeworldConfig, LoggingConfig};
use cubeworld_core::control::now_seconds;
use cubeworld_core::scene_loader;
use cubeworld_core::{RasterRenderer, Runner, Simulation, SimulationHandle};
use cubeworld_server::{AcceptAll, SessionServer};

use crate::cli::Args;
use crate::error::EngineError;

fn main() -> Result<(), EngineError> {
    // 1. Command line and configuration.
    let args = Args::parse();
    let mut config = CubeworldConfig::load_or_default(&args.config)?;
    args.apply(&mut config);

    // 2. Logging.
    init_logging(&config.logging);
    info!(
        config = %args.config.display(),
        port = config.server.port,
        workers = config.server.workers,
        capture_delay = config.render.capture_delay,
        "cubeworld starting"
    );

    // 3. Simulation.
    let now = now_seconds();
    let mut sim = Simulation::new(&config, now)?;

    // 4. Scene files.
    for path in &args.scenes {
        let scene = scene_loader::read_scene_file(path).map_err(|source| EngineError::Scene {
            path: path.clone(),
            source,
        })?;
        let summary = sim.apply_scene(&scene, now).map_err(|source| EngineError::Scene {
            path: path.clone(),
            source,
        })?;
        info!(
            path = %path.display(),
            grounds = summary.grounds,
            cubes = summary.cubes,
            textures = summary.textures,
            "scene applied"
        );
    }
    if let Some(width) = args.width {
        sim.world.window.width = width;
    }
    if let Some(height) = args.height {
        sim.world.window.height = height;
    }
    info!(live = sim.world.live_count(), "simulation assembled");

    // 5. Render bridge.
    let handle = Arc::new(SimulationHandle::new(sim, config.capacity.import_inbox));

    // 6. Session server.
    let mut server = SessionServer::start(&config.server, Arc::clone(&handle), Arc::new(AcceptAll))?;
    info!(addr = %server.local_addr(), "accepting sessions");

    // 7. Tick loop.
    let mut runner = Runner::new(handle, RasterRenderer::new());
    let result = runner.run(&mut server);

    // 8. Shutdown.
    server.shutdown();
    let result = result?;
    info!(
        total_ticks = result.total_ticks,
        live = result.final_summary.as_ref().map(|s| s.live),
        "cubeworld shutdown complete"
    );
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    }
}
