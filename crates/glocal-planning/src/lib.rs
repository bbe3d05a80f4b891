//! `glocal-planning` – exploration planners built on the map query contract.
//!
//! Planners only talk to [`Map`][glocal_mapping::Map] and the
//! [`StateMachine`][glocal_state::StateMachine]; they never see which map
//! backend is running.
//!
//! # Modules
//!
//! - [`local_planner`] – [`LocalPlanner`][local_planner::LocalPlanner] and
//!   [`SamplingPlanner`][local_planner::SamplingPlanner]: samples viewpoints
//!   around the robot and picks the safe one that would reveal the most
//!   unknown space.
//! - [`global_planner`] – [`GlobalPlanner`][global_planner::GlobalPlanner]
//!   and [`SkeletonPlanner`][global_planner::SkeletonPlanner]: searches the
//!   voxel grid for the nearest reachable frontier once local planning runs
//!   dry.
//! - [`visualizer`] – [`LocalPlannerVisualizer`][visualizer::LocalPlannerVisualizer]
//!   with the no-op [`DefaultVisualizer`][visualizer::DefaultVisualizer] and
//!   the structured-log [`SamplingPlannerVisualizer`][visualizer::SamplingPlannerVisualizer].

pub mod error;
pub mod global_planner;
pub mod local_planner;
pub mod visualizer;

#[cfg(test)]
mod test_support;

pub use error::PlannerError;
pub use global_planner::{GlobalPlanner, SkeletonPlanner, SkeletonPlannerConfig};
pub use local_planner::{
    Candidate, LocalPlanResult, LocalPlanner, SamplingPlanner, SamplingPlannerConfig,
};
pub use visualizer::{
    DefaultVisualizer, LocalPlannerVisualizer, SamplingPlannerVisualizer,
    SamplingVisualizerConfig,
};
