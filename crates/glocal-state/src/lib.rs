//! `glocal-state` – shared exploration state.
//!
//! # Modules
//!
//! - [`region_of_interest`] – [`RegionOfInterest`][region_of_interest::RegionOfInterest]:
//!   geometric membership predicate restricting which space is considered
//!   for exploration and safety checks, with the
//!   [`BoundingBox`][region_of_interest::BoundingBox] variant.
//! - [`state_machine`] – [`StateMachine`][state_machine::StateMachine]:
//!   process-wide holder of the current robot pose, the active region of
//!   interest and the exploration phase.  Map queries read it; the planning
//!   loop writes it.

pub mod region_of_interest;
pub mod state_machine;

pub use region_of_interest::{BoundingBox, BoundingBoxConfig, RegionOfInterest};
pub use state_machine::{ExplorationPhase, StateMachine};
