//! Error types for the Cubeworld server binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run loop so
//! `main` can propagate with `?`.

use std::path::PathBuf;

/// Top-level error for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cubeworld_core::config::ConfigError,
    },

    /// The simulation could not be built.
    #[error("simulation error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: cubeworld_core::TickError,
    },

    /// A scene file named on the command line could not be applied.
    #[error("scene {path}: {source}")]
    Scene {
        /// The scene file.
        path: PathBuf,
        /// The underlying scene error.
        source: cubeworld_core::scene_loader::SceneError,
    },

    /// The session server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: cubeworld_server::ServerError,
    },

    /// The tick loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: cubeworld_core::RunnerError,
    },
}
