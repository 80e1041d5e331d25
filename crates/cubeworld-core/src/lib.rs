//! World store, tick driver and render bridge for the Cubeworld simulation.
//!
//! This crate turns the per-cube rules of `cubeworld-agents` into a running
//! simulation: it owns the world tables, runs the tick phases in order,
//! applies scene records, and hands rendered views to session workers.
//!
//! # Modules
//!
//! - [`bridge`] -- [`SimulationHandle`], the state shared with session workers
//! - [`capture`] -- Per-view frame barriers and pixel conversion
//! - [`clock`] -- Frame counter and frames-per-second estimate
//! - [`config`] -- Configuration loading from `cubeworld-config.yaml`
//! - [`contact`] -- Pairwise contact events and the blocking pass
//! - [`control`] -- Stop flag and wall-clock helpers
//! - [`inbox`] -- Deferred scene imports
//! - [`render`] -- The [`Renderer`] interface and a CPU rasteriser
//! - [`runner`] -- The tick loop
//! - [`scene_loader`] -- Applying scene records to the world
//! - [`strategy`] -- Built-in policies for cubes without a client
//! - [`tick`] -- [`Simulation`] and the phases of one tick
//! - [`world`] -- The world tables
//!
//! [`SimulationHandle`]: bridge::SimulationHandle
//! [`Renderer`]: render::Renderer
//! [`Simulation`]: tick::Simulation

pub mod bridge;
pub mod capture;
pub mod clock;
pub mod config;
pub mod contact;
pub mod control;
pub mod inbox;
pub mod render;
pub mod runner;
pub mod scene_loader;
pub mod strategy;
pub mod tick;
pub mod world;

pub use bridge::SimulationHandle;
pub use capture::{CaptureError, ViewImage};
pub use config::CubeworldConfig;
pub use render::{RasterRenderer, Renderer};
pub use runner::{NoOpHooks, Runner, RunnerError, TickHooks};
pub use tick::{Simulation, TickError, TickSummary};
pub use world::World;
