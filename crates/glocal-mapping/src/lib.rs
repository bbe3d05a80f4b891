//! `glocal-mapping` – backend-agnostic map queries for exploration planners.
//!
//! Planners ask two questions of the map: "is this pose safe to drive to"
//! and "what is the occupancy state near this point".  This crate answers
//! both behind the [`Map`][map::Map] trait, whatever representation sits
//! underneath.
//!
//! # Modules
//!
//! - [`distance_field`] – [`DistanceField`][distance_field::DistanceField]
//!   service trait plus the in-process [`EsdfServer`][distance_field::EsdfServer],
//!   which publishes immutable [`EsdfLayer`][distance_field::EsdfLayer]
//!   snapshots so concurrent queries never observe a torn update.
//! - [`submap`] – [`SubmapCollection`][submap::SubmapCollection]: handle on
//!   the globally pose-graph-optimized multi-submap map.
//! - [`hub`] – [`BackendHub`][hub::BackendHub]: named registry from which
//!   maps resolve their backend services during setup.
//! - [`communicator`] – [`Communicator`][communicator::Communicator]: the
//!   context handle passed to every component at construction.
//! - [`map`] – the [`Map`][map::Map] trait, [`MapConfig`][map::MapConfig]
//!   and [`MapError`][map::MapError].
//! - [`single_backend`] – [`SingleBackendMap`][single_backend::SingleBackendMap]:
//!   one monolithic distance field.
//! - [`hybrid`] – [`HybridMap`][hybrid::HybridMap]: fast local distance field
//!   plus a global submap collection.
//! - [`sim`] – [`SimulatedWorld`][sim::SimulatedWorld]: sphere obstacles that
//!   fill an ESDF around a pose, for headless runs and tests.

pub mod communicator;
pub mod distance_field;
pub mod hub;
pub mod hybrid;
pub mod map;
pub mod sim;
pub mod single_backend;
pub mod submap;

#[cfg(test)]
mod test_support;

pub use communicator::Communicator;
pub use distance_field::{DistanceField, EsdfLayer, EsdfServer};
pub use hub::BackendHub;
pub use hybrid::{HybridMap, HybridMapConfig};
pub use map::{Map, MapConfig, MapError};
pub use sim::{SimulatedWorld, SphereObstacle};
pub use single_backend::{SingleBackendMap, SingleBackendMapConfig};
pub use submap::{Submap, SubmapCollection, SubmapServer};
