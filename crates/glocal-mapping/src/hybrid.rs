//! [`HybridMap`] – fast local distance field plus a global submap collection.
//!
//! The local distance field is a sliding window around the robot, cheap to
//! query and always fresh.  The global collection stitches submaps together
//! through pose-graph optimization and stays consistent over the whole run.
//!
//! Safety and occupancy queries are answered from the local field alone.  The
//! global collection is resolved and held during setup but never consulted,
//! so overlapping submaps are not cross-checked for consistency.
//!
//! # Traversability
//!
//! 1. Outside the active region of interest → not traversable.
//! 2. Observed → traversable iff `distance > traversability_radius`.
//! 3. Unobserved → traversable iff the position lies within
//!    `clearing_radius` of the robot: space the robot just passed through is
//!    taken as clear even before it reaches the distance field.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use glocal_types::{Point, VoxelState};
use nalgebra::UnitQuaternion;

use crate::communicator::Communicator;
use crate::map::{LocalQueries, Map, MapConfig, MapError};
use crate::submap::SubmapCollection;

/// Factory type name of this backend.
pub const TYPE_NAME: &str = "hybrid";

/// Parameters of a [`HybridMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridMapConfig {
    /// Minimum observed clearance for a position to be safe (metres).
    pub traversability_radius: f64,
    /// Unobserved space closer than this to the robot is safe (metres).
    pub clearing_radius: f64,
    /// Hub name of the local distance-field service.
    pub local_service: String,
    /// Hub name of the global submap collection.
    pub global_service: String,
}

impl Default for HybridMapConfig {
    fn default() -> Self {
        Self {
            traversability_radius: 0.3,
            clearing_radius: 0.5,
            local_service: "local".to_string(),
            global_service: "global".to_string(),
        }
    }
}

struct Backends {
    local: LocalQueries,
    global: Arc<dyn SubmapCollection>,
}

/// Map combining a local distance field with a global submap collection.
pub struct HybridMap {
    communicator: Communicator,
    ready: Option<Backends>,
}

impl HybridMap {
    /// Create an unusable map; call [`Map::setup_from_config`] next.
    pub fn new(communicator: Communicator) -> Self {
        Self {
            communicator,
            ready: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_some()
    }

    /// The global submap collection, once set up.
    pub fn global_map(&self) -> Option<&Arc<dyn SubmapCollection>> {
        self.ready.as_ref().map(|b| &b.global)
    }

    fn local(&self) -> Result<&LocalQueries, MapError> {
        self.ready
            .as_ref()
            .map(|b| &b.local)
            .ok_or(MapError::NotInitialized)
    }
}

impl Map for HybridMap {
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn setup_from_config(&mut self, config: MapConfig) -> Result<(), MapError> {
        let cfg = match config {
            MapConfig::Hybrid(cfg) => cfg,
            other => {
                error!(
                    expected = TYPE_NAME,
                    found = other.kind(),
                    "failed to set up map: wrong config kind"
                );
                return Err(MapError::ConfigKindMismatch {
                    expected: TYPE_NAME,
                    found: other.kind(),
                });
            }
        };
        if self.ready.is_some() {
            return Err(MapError::AlreadyInitialized);
        }

        let backends = self.communicator.backends();
        let field = backends.distance_field(&cfg.local_service)?;
        let global = backends.submap_collection(&cfg.global_service)?;
        let local = LocalQueries::connect(
            field,
            self.communicator.state_machine().clone(),
            cfg.traversability_radius,
            cfg.clearing_radius,
        )?;
        info!(
            backend = TYPE_NAME,
            local = %cfg.local_service,
            global = %cfg.global_service,
            submaps = global.submap_count(),
            voxel_size = local.voxel_size(),
            block_size = local.block_size(),
            "map ready"
        );
        self.ready = Some(Backends { local, global });
        Ok(())
    }

    fn voxel_size(&self) -> Result<f64, MapError> {
        Ok(self.local()?.voxel_size())
    }

    fn block_size(&self) -> Result<f64, MapError> {
        Ok(self.local()?.block_size())
    }

    fn is_traversable_in_active_submap(
        &self,
        position: &Point,
        _orientation: &UnitQuaternion<f64>,
    ) -> Result<bool, MapError> {
        // TODO: check overlapping submaps of the global collection once the
        // submap query interface exists; only the local field is used today.
        Ok(self.local()?.is_traversable(position))
    }

    fn voxel_state_in_local_area(&self, point: &Point) -> Result<VoxelState, MapError> {
        Ok(self.local()?.voxel_state(point))
    }

    fn voxel_center_in_local_area(&self, point: &Point) -> Result<Point, MapError> {
        Ok(self.local()?.voxel_center(point))
    }
}
