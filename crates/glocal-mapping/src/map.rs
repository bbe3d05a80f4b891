//! The [`Map`] trait – the query contract every backend variant implements.
//!
//! A map goes through two states.  After construction it is *unusable*:
//! every query returns [`MapError::NotInitialized`].  A successful
//! [`Map::setup_from_config`] resolves the backend services and caches the
//! voxel and block size in one step, after which the map is *ready* and the
//! cached constants never change.  A failed setup leaves the map unusable;
//! there is no partially initialized state.
//!
//! Unobserved space is never an error.  It is reported as
//! [`VoxelState::Unknown`] by [`Map::voxel_state_in_local_area`] and handled
//! by the clearing-radius fallback in
//! [`Map::is_traversable_in_active_submap`].

use std::sync::Arc;

use glocal_state::StateMachine;
use glocal_types::{Point, VoxelState};
use nalgebra::UnitQuaternion;
use thiserror::Error;

use crate::distance_field::DistanceField;
use crate::hybrid::HybridMapConfig;
use crate::single_backend::SingleBackendMapConfig;

/// Errors raised by map setup and by queries on an unusable map.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Config kind mismatch: expected '{expected}' config, got '{found}'")]
    ConfigKindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Map is not initialized; setup_from_config has not succeeded")]
    NotInitialized,

    #[error("Map is already initialized")]
    AlreadyInitialized,

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid map geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid map parameter: {0}")]
    InvalidParameter(String),
}

/// Typed configuration, one variant per backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MapConfig {
    SingleBackend(SingleBackendMapConfig),
    Hybrid(HybridMapConfig),
}

impl MapConfig {
    /// Type name of the backend this config belongs to.
    pub fn kind(&self) -> &'static str {
        match self {
            MapConfig::SingleBackend(_) => crate::single_backend::TYPE_NAME,
            MapConfig::Hybrid(_) => crate::hybrid::TYPE_NAME,
        }
    }
}

/// Backend-agnostic map queries used by the planners.
///
/// Setup takes `&mut self` and queries take `&self`, so setup can never run
/// concurrently with queries once the map is shared.
pub trait Map: Send + Sync {
    /// Backend type name, e.g. `"hybrid"`.
    fn name(&self) -> &str;

    /// Connect to the backends named in `config` and cache derived constants.
    ///
    /// # Errors
    ///
    /// - [`MapError::ConfigKindMismatch`] – `config` belongs to another backend.
    /// - [`MapError::AlreadyInitialized`] – setup already succeeded once.
    /// - [`MapError::BackendUnavailable`] – a named service is not registered.
    /// - [`MapError::InvalidParameter`] / [`MapError::InvalidGeometry`] –
    ///   radii or backend geometry are unusable.
    fn setup_from_config(&mut self, config: MapConfig) -> Result<(), MapError>;

    /// Cached voxel edge length (metres).
    fn voxel_size(&self) -> Result<f64, MapError>;

    /// Cached allocation block edge length (metres).
    fn block_size(&self) -> Result<f64, MapError>;

    /// The safety predicate: may the robot occupy `position`?
    ///
    /// `orientation` is part of the contract but not used by the current
    /// backends.
    fn is_traversable_in_active_submap(
        &self,
        position: &Point,
        orientation: &UnitQuaternion<f64>,
    ) -> Result<bool, MapError>;

    /// Occupancy of the voxel containing `point`.  Never consults the region
    /// of interest or the robot pose.
    fn voxel_state_in_local_area(&self, point: &Point) -> Result<VoxelState, MapError>;

    /// Centre of the voxel enclosing `point` on the active grid.
    fn voxel_center_in_local_area(&self, point: &Point) -> Result<Point, MapError>;
}

/// Reject negative or non-finite radii.
pub(crate) fn validate_radii(
    traversability_radius: f64,
    clearing_radius: f64,
) -> Result<(), MapError> {
    for (name, value) in [
        ("traversability_radius", traversability_radius),
        ("clearing_radius", clearing_radius),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(MapError::InvalidParameter(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// LocalQueries – ready-state core shared by both backends
// ────────────────────────────────────────────────────────────────────────────

/// Everything a ready map needs to answer queries from its local distance
/// field.  Only constructed once all cached constants are known.
pub(crate) struct LocalQueries {
    field: Arc<dyn DistanceField>,
    state_machine: Arc<StateMachine>,
    voxel_size: f64,
    block_size: f64,
    traversability_radius: f64,
    clearing_radius: f64,
}

impl LocalQueries {
    pub(crate) fn connect(
        field: Arc<dyn DistanceField>,
        state_machine: Arc<StateMachine>,
        traversability_radius: f64,
        clearing_radius: f64,
    ) -> Result<Self, MapError> {
        validate_radii(traversability_radius, clearing_radius)?;
        let voxel_size = field.voxel_size();
        let block_size = field.block_size();
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(MapError::InvalidGeometry(format!(
                "backend reports voxel_size {voxel_size}"
            )));
        }
        if !(block_size.is_finite() && block_size >= voxel_size) {
            return Err(MapError::InvalidGeometry(format!(
                "backend reports block_size {block_size} for voxel_size {voxel_size}"
            )));
        }
        Ok(Self {
            field,
            state_machine,
            voxel_size,
            block_size,
            traversability_radius,
            clearing_radius,
        })
    }

    pub(crate) fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub(crate) fn block_size(&self) -> f64 {
        self.block_size
    }

    /// ROI gate, then observed clearance, then the clearing-radius fallback
    /// for space the robot has just passed through.
    pub(crate) fn is_traversable(&self, position: &Point) -> bool {
        if !self.state_machine.point_in_roi(position) {
            return false;
        }
        match self.field.distance_at_position(position) {
            Some(distance) => distance > self.traversability_radius,
            None => {
                self.state_machine.current_pose().distance_to(position) < self.clearing_radius
            }
        }
    }

    pub(crate) fn voxel_state(&self, point: &Point) -> VoxelState {
        match self.field.distance_at_position(point) {
            Some(distance) if distance > self.voxel_size => VoxelState::Free,
            Some(_) => VoxelState::Occupied,
            None => VoxelState::Unknown,
        }
    }

    pub(crate) fn voxel_center(&self, point: &Point) -> Point {
        (point / self.voxel_size).map(f64::round) * self.voxel_size
    }
}
