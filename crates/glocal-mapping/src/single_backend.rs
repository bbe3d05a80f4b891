//! [`SingleBackendMap`] – one monolithic distance field answers every query.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use glocal_types::{Point, VoxelState};
use nalgebra::UnitQuaternion;

use crate::communicator::Communicator;
use crate::map::{LocalQueries, Map, MapConfig, MapError};

/// Factory type name of this backend.
pub const TYPE_NAME: &str = "single-backend";

/// Parameters of a [`SingleBackendMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleBackendMapConfig {
    /// Minimum observed clearance for a position to be safe (metres).
    pub traversability_radius: f64,
    /// Unobserved space closer than this to the robot is safe (metres).
    pub clearing_radius: f64,
    /// Hub name of the distance-field service.
    pub local_service: String,
}

impl Default for SingleBackendMapConfig {
    fn default() -> Self {
        Self {
            traversability_radius: 0.3,
            clearing_radius: 0.5,
            local_service: "local".to_string(),
        }
    }
}

/// Map backed by a single distance-field service.
pub struct SingleBackendMap {
    communicator: Communicator,
    ready: Option<LocalQueries>,
}

impl SingleBackendMap {
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

    fn ready(&self) -> Result<&LocalQueries, MapError> {
        self.ready.as_ref().ok_or(MapError::NotInitialized)
    }
}

impl Map for SingleBackendMap {
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn setup_from_config(&mut self, config: MapConfig) -> Result<(), MapError> {
        let cfg = match config {
            MapConfig::SingleBackend(cfg) => cfg,
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

        let field = self
            .communicator
            .backends()
            .distance_field(&cfg.local_service)?;
        let queries = LocalQueries::connect(
            field,
            self.communicator.state_machine().clone(),
            cfg.traversability_radius,
            cfg.clearing_radius,
        )?;
        info!(
            backend = TYPE_NAME,
            service = %cfg.local_service,
            voxel_size = queries.voxel_size(),
            block_size = queries.block_size(),
            "map ready"
        );
        self.ready = Some(queries);
        Ok(())
    }

    fn voxel_size(&self) -> Result<f64, MapError> {
        Ok(self.ready()?.voxel_size())
    }

    fn block_size(&self) -> Result<f64, MapError> {
        Ok(self.ready()?.block_size())
    }

    fn is_traversable_in_active_submap(
        &self,
        position: &Point,
        _orientation: &UnitQuaternion<f64>,
    ) -> Result<bool, MapError> {
        Ok(self.ready()?.is_traversable(position))
    }

    fn voxel_state_in_local_area(&self, point: &Point) -> Result<VoxelState, MapError> {
        Ok(self.ready()?.voxel_state(point))
    }

    fn voxel_center_in_local_area(&self, point: &Point) -> Result<Point, MapError> {
        Ok(self.ready()?.voxel_center(point))
    }
}
