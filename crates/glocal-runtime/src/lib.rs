//! `glocal-runtime` – startup wiring and the exploration loop.
//!
//! # Modules
//!
//! - [`config`] – TOML loading, [`ConfigSource`][config::ConfigSource]
//!   sections and `GLOCAL_*` environment overrides.
//! - [`factory`] – [`ComponentFactory`][factory::ComponentFactory]: selects
//!   map, planners, visualizer and region of interest by type name.
//! - [`runner`] – [`ExplorationRunner`][runner::ExplorationRunner]: local
//!   then global planning until nothing is left to explore.
//! - [`sim`] – [`Simulation`][sim::Simulation]: in-process backends and a
//!   teleporting robot for headless runs.
//! - [`telemetry`] – `tracing` subscriber initialisation.

pub mod config;
pub mod factory;
pub mod runner;
pub mod sim;
pub mod telemetry;

pub use config::{ConfigError, ConfigSource, ExplorationConfig, RuntimeConfig, TYPE_NOT_SET};
pub use factory::{ComponentFactory, FactoryError};
pub use runner::{
    ExecutionError, ExplorationRunner, FinishReason, GoalExecutor, RunSummary, RunnerError,
    StepOutcome,
};
pub use sim::{Simulation, SimulationConfig};
