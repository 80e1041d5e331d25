//! Configuration loading and typed config structures for the Cubeworld server.
//!
//! The configuration lives in `cubeworld-config.yaml` in the working
//! directory (or wherever `--config` points). This module defines
//! strongly-typed structs that mirror the YAML structure. Every field has a
//! default, so a partial file, an empty file, or no file at all yields the
//! standard contract values.

use std::path::Path;

use serde::Deserialize;

use cubeworld_agents::AgentConfig;
use cubeworld_world::RotationAxes;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "cubeworld-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CubeworldConfig {
    /// Network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tick loop settings.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Table sizes.
    #[serde(default)]
    pub capacity: CapacityConfig,

    /// Energy economy.
    #[serde(default)]
    pub energy: EnergyConfig,

    /// Mating and growth intervals.
    #[serde(default)]
    pub life: LifeConfig,

    /// Fight odds.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Remote move limits and backups.
    #[serde(default)]
    pub motion: MotionConfig,

    /// Rendering and view capture.
    #[serde(default)]
    pub render: RenderConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CubeworldConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise return the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string. An empty document yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// The per-cube rule parameters drawn from the `energy`, `life`,
    /// `combat` and `motion` sections.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            energy_threshold: self.energy.threshold,
            max_transfer: self.energy.max_transfer,
            energy_limit: self.energy.limit,
            energy_cost: self.energy.cost,
            energy_factor: self.energy.factor,
            resource_retire: self.energy.resource_retire,
            exhausted: self.energy.exhausted,
            mate_hold_seconds: self.life.mate_hold_seconds,
            youth_hold_seconds: self.life.youth_hold_seconds,
            enby_superpower: self.combat.enby_superpower,
            size_advantage_span: self.combat.size_advantage_span,
            velocity_max: self.motion.velocity_max,
            backup_seconds: self.motion.backup_seconds,
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of session worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Size of one socket read.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,

    /// Largest request accepted before the connection is dropped.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            read_buffer_bytes: default_read_buffer_bytes(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

/// Tick loop configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationSettings {
    /// Rate assumed before and after the bootstrap measurement.
    #[serde(default = "default_fps")]
    pub default_fps: f32,

    /// Measured rate at or above which the bootstrap picks 60 fps.
    #[serde(default = "default_fps_bootstrap_threshold")]
    pub fps_bootstrap_threshold: f32,

    /// Length of the rolling rate window.
    #[serde(default = "default_fps_window_seconds")]
    pub fps_window_seconds: u64,

    /// Run strategies for cubes without a client.
    #[serde(default = "default_true")]
    pub strategy_enabled: bool,

    /// Run the resource strategy.
    #[serde(default = "default_true")]
    pub strategy_basic: bool,

    /// Run the male, female, enby and predator strategies.
    #[serde(default = "default_true")]
    pub strategy_extended: bool,

    /// Sleep one second per tick.
    #[serde(default)]
    pub clock_time: bool,

    /// Seed for the simulation RNG; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            default_fps: default_fps(),
            fps_bootstrap_threshold: default_fps_bootstrap_threshold(),
            fps_window_seconds: default_fps_window_seconds(),
            strategy_enabled: true,
            strategy_basic: true,
            strategy_extended: true,
            clock_time: false,
            seed: None,
        }
    }
}

/// Table sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CapacityConfig {
    /// Cube roster size.
    #[serde(default = "default_cubes")]
    pub cubes: usize,

    /// Ground slots.
    #[serde(default = "default_grounds")]
    pub grounds: usize,

    /// Light slots.
    #[serde(default = "default_small_table")]
    pub lights: usize,

    /// Material slots.
    #[serde(default = "default_small_table")]
    pub materials: usize,

    /// Texture slots.
    #[serde(default = "default_textures")]
    pub textures: usize,

    /// Wireframe slots.
    #[serde(default = "default_wires")]
    pub wires: usize,

    /// Pending scene imports.
    #[serde(default = "default_import_inbox")]
    pub import_inbox: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            cubes: default_cubes(),
            grounds: default_grounds(),
            lights: default_small_table(),
            materials: default_small_table(),
            textures: default_textures(),
            wires: default_wires(),
            import_inbox: default_import_inbox(),
        }
    }
}

/// Energy economy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnergyConfig {
    /// Hunting/foraging switch point.
    #[serde(default = "default_energy_threshold")]
    pub threshold: f32,

    /// Most energy drawn per feeding contact.
    #[serde(default = "default_max_transfer")]
    pub max_transfer: f32,

    /// Energy ceiling.
    #[serde(default = "default_energy_limit")]
    pub limit: f32,

    /// Idle burn per second per unit size.
    #[serde(default = "default_energy_cost")]
    pub cost: f32,

    /// Motion burn per unit speed per second.
    #[serde(default = "default_energy_factor")]
    pub factor: f32,

    /// Resource retirement level.
    #[serde(default = "default_resource_retire")]
    pub resource_retire: f32,

    /// Resource exhaustion level after feeding.
    #[serde(default = "default_exhausted")]
    pub exhausted: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            threshold: default_energy_threshold(),
            max_transfer: default_max_transfer(),
            limit: default_energy_limit(),
            cost: default_energy_cost(),
            factor: default_energy_factor(),
            resource_retire: default_resource_retire(),
            exhausted: default_exhausted(),
        }
    }
}

/// Mating and growth intervals, seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LifeConfig {
    /// Female refractory interval.
    #[serde(default = "default_mate_hold_seconds")]
    pub mate_hold_seconds: f64,

    /// Youth interval.
    #[serde(default = "default_youth_hold_seconds")]
    pub youth_hold_seconds: f64,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            mate_hold_seconds: default_mate_hold_seconds(),
            youth_hold_seconds: default_youth_hold_seconds(),
        }
    }
}

/// Fight odds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombatConfig {
    /// Threshold cap for enby prey.
    #[serde(default = "default_enby_superpower")]
    pub enby_superpower: f32,

    /// Size ratio span from sure win to sure loss.
    #[serde(default = "default_size_advantage_span")]
    pub size_advantage_span: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enby_superpower: default_enby_superpower(),
            size_advantage_span: default_size_advantage_span(),
        }
    }
}

/// Remote move limits and backups.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionConfig {
    /// Speed limit.
    #[serde(default = "default_velocity_max")]
    pub velocity_max: f32,

    /// Backup manoeuvre length, seconds.
    #[serde(default = "default_backup_seconds")]
    pub backup_seconds: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            velocity_max: default_velocity_max(),
            backup_seconds: default_backup_seconds(),
        }
    }
}

/// Rendering and view capture.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderConfig {
    /// Ticks a view waits before accepting a frame.
    #[serde(default)]
    pub capture_delay: u64,

    /// First-person view width.
    #[serde(default = "default_view_size")]
    pub view_width: u32,

    /// First-person view height.
    #[serde(default = "default_view_size")]
    pub view_height: u32,

    /// Main window (ground view) width.
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Main window (ground view) height.
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Channels read back per pixel.
    #[serde(default = "default_channels")]
    pub channels: u32,

    /// Vertical field of view, degrees.
    #[serde(default = "default_perspective_fov")]
    pub perspective_fov: f32,

    /// Longest a view request waits for its frame.
    #[serde(default = "default_view_timeout_ms")]
    pub view_timeout_ms: u64,

    /// Display-only rotation of cube models.
    #[serde(default)]
    pub rotation: RotationAxes,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            capture_delay: 0,
            view_width: default_view_size(),
            view_height: default_view_size(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            channels: default_channels(),
            perspective_fov: default_perspective_fov(),
            view_timeout_ms: default_view_timeout_ms(),
            rotation: RotationAxes::None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `"pretty"` or `"json"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    2020
}

const fn default_workers() -> usize {
    30
}

const fn default_read_buffer_bytes() -> usize {
    1500
}

const fn default_max_message_bytes() -> usize {
    1024 * 1024
}

const fn default_fps() -> f32 {
    6.5
}

const fn default_fps_bootstrap_threshold() -> f32 {
    60.0
}

const fn default_fps_window_seconds() -> u64 {
    60
}

const fn default_cubes() -> usize {
    50
}

const fn default_grounds() -> usize {
    5
}

const fn default_small_table() -> usize {
    5
}

const fn default_textures() -> usize {
    52
}

const fn default_wires() -> usize {
    20
}

const fn default_import_inbox() -> usize {
    8
}

const fn default_energy_threshold() -> f32 {
    50.0
}

const fn default_max_transfer() -> f32 {
    200.0
}

const fn default_energy_limit() -> f32 {
    1000.0
}

const fn default_energy_cost() -> f32 {
    0.01
}

const fn default_energy_factor() -> f32 {
    0.16
}

const fn default_resource_retire() -> f32 {
    10.0
}

const fn default_exhausted() -> f32 {
    0.001
}

const fn default_mate_hold_seconds() -> f64 {
    30.0
}

const fn default_youth_hold_seconds() -> f64 {
    60.0
}

const fn default_enby_superpower() -> f32 {
    0.2
}

const fn default_size_advantage_span() -> f32 {
    1.4
}

const fn default_velocity_max() -> f32 {
    5.0
}

const fn default_backup_seconds() -> f32 {
    0.5
}

const fn default_view_size() -> u32 {
    512
}

const fn default_window_width() -> u32 {
    1280
}

const fn default_window_height() -> u32 {
    720
}

const fn default_channels() -> u32 {
    4
}

const fn default_perspective_fov() -> f32 {
    60.0
}

const fn default_view_timeout_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

const fn default_true() -> bool {
    true
}
