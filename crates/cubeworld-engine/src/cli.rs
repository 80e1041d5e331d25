//! Command-line surface of the server binary.
//!
//! Every flag falls back to an environment variable and, when neither is
//! given, leaves the configuration file value alone.

use std::path::PathBuf;

use clap::Parser;

use cubeworld_core::config::{CubeworldConfig, DEFAULT_CONFIG_FILE};
use cubeworld_world::RotationAxes;

/// Cubeworld simulation server.
#[derive(Parser, Debug)]
#[command(name = "cubeworld", about = "Cubeworld simulation server", version)]
pub struct Args {
    /// Ticks a view waits before accepting a frame
    #[arg(short = 'a', long, env = "CUBEWORLD_CAPTURE_DELAY")]
    pub capture_delay: Option<u64>,

    /// Log verbosity: 0 for info, 1 for debug, 2 or more for trace
    #[arg(short = 'd', long, env = "CUBEWORLD_DEBUG")]
    pub debug: Option<u8>,

    /// Display rotation of cube models: 1 x, 2 y, 3 z, 4 all axes
    #[arg(short = 'r', long, env = "CUBEWORLD_ROTATION", value_parser = clap::value_parser!(u8).range(1..=4))]
    pub rotation: Option<u8>,

    /// Main window width
    #[arg(short = 'x', long, env = "CUBEWORLD_WIDTH")]
    pub width: Option<u32>,

    /// Main window height
    #[arg(short = 'y', long, env = "CUBEWORLD_HEIGHT")]
    pub height: Option<u32>,

    /// TCP port for client sessions
    #[arg(long, env = "CUBEWORLD_PORT")]
    pub port: Option<u16>,

    /// Number of session worker threads
    #[arg(long, env = "CUBEWORLD_WORKERS")]
    pub workers: Option<usize>,

    /// Configuration file
    #[arg(long, env = "CUBEWORLD_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Scene files applied in order at startup
    pub scenes: Vec<PathBuf>,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut CubeworldConfig) {
        if let Some(delay) = self.capture_delay {
            config.render.capture_delay = delay;
        }
        if let Some(flag) = self.rotation {
            config.render.rotation = RotationAxes::from_flag(flag);
        }
        if let Some(width) = self.width {
            config.render.window_width = width;
        }
        if let Some(height) = self.height {
            config.render.window_height = height;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }
        if let Some(debug) = self.debug {
            debug_level(debug).clone_into(&mut config.logging.level);
        }
    }
}

/// Filter directive for a `-d` value.
const fn debug_level(debug: u8) -> &'static str {
    match debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_file() {
        let args = Args::try_parse_from([
            "cubeworld", "-a", "2", "-d", "1", "-r", "4", "-x", "800", "-y", "600", "--port", "3030", "--workers", "8",
            "scene-a.json", "scene-b.json",
        ])
        .unwrap();
        let mut config = CubeworldConfig::default();
        args.apply(&mut config);

        assert_eq!(config.render.capture_delay, 2);
        assert_eq!(config.render.rotation, RotationAxes::All);
        assert_eq!((config.render.window_width, config.render.window_height), (800, 600));
        assert_eq!(config.server.port, 3030);
        assert_eq!(config.server.workers, 8);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(args.scenes, vec![PathBuf::from("scene-a.json"), PathBuf::from("scene-b.json")]);
    }

    #[test]
    fn absent_flags_keep_the_file_values() {
        let args = Args::try_parse_from(["cubeworld"]).unwrap();
        let mut config = CubeworldConfig::default();
        args.apply(&mut config);
        assert_eq!(config, CubeworldConfig::default());
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(args.scenes.is_empty());
    }

    #[test]
    fn rotation_must_be_one_to_four() {
        assert!(Args::try_parse_from(["cubeworld", "-r", "5"]).is_err());
    }

    #[test]
    fn debug_levels() {
        assert_eq!(debug_level(0), "info");
        assert_eq!(debug_level(1), "debug");
        assert_eq!(debug_level(7), "trace");
    }
}
