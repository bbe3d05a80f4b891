//! [`GlobalPlanner`] – frontier search once local exploration runs dry.
//!
//! [`SkeletonPlanner`] walks the voxel grid in a cube around the robot and
//! returns the nearest *frontier*: a free voxel with at least one unknown
//! face neighbour that the map also reports as traversable.
//!
//! Construction is two-phase.  [`SkeletonPlanner::new`] only wires the map
//! and context; [`SkeletonPlanner::setup_from_config`] validates and stores
//! the search parameters.  Planning before a successful setup is an error.

use std::sync::Arc;

use glocal_mapping::{Communicator, Map};
use glocal_types::{Point, Pose, VoxelState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PlannerError, require_positive};

/// Factory type name of [`SkeletonPlanner`].
pub const TYPE_NAME: &str = "skeleton";

const FACE_NEIGHBOURS: [[f64; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];

/// A global planner picks a distant goal when nothing is left nearby.
pub trait GlobalPlanner: Send {
    fn name(&self) -> &str;

    /// Returns `Ok(None)` when no reachable frontier remains.
    ///
    /// # Errors
    ///
    /// [`PlannerError::NotConfigured`] before setup, [`PlannerError::Map`]
    /// when the map is unusable.
    fn plan(&mut self) -> Result<Option<Point>, PlannerError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonPlannerConfig {
    /// Half edge of the search cube, and maximum goal distance (metres).
    pub search_radius: f64,
    /// Frontiers closer than this are ignored; the local planner owns them.
    pub min_goal_distance: f64,
}

impl Default for SkeletonPlannerConfig {
    fn default() -> Self {
        Self {
            search_radius: 5.0,
            min_goal_distance: 0.5,
        }
    }
}

impl SkeletonPlannerConfig {
    pub fn validate(&self) -> Result<(), PlannerError> {
        require_positive("search_radius", self.search_radius)?;
        if !self.min_goal_distance.is_finite() || self.min_goal_distance < 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "min_goal_distance must be non-negative, got {}",
                self.min_goal_distance
            )));
        }
        if self.min_goal_distance >= self.search_radius {
            return Err(PlannerError::InvalidConfig(format!(
                "min_goal_distance {} must be below search_radius {}",
                self.min_goal_distance, self.search_radius
            )));
        }
        Ok(())
    }
}

/// Nearest-frontier global planner.
pub struct SkeletonPlanner {
    communicator: Communicator,
    map: Arc<dyn Map>,
    config: Option<SkeletonPlannerConfig>,
}

impl SkeletonPlanner {
    pub fn new(communicator: Communicator, map: Arc<dyn Map>) -> Self {
        Self {
            communicator,
            map,
            config: None,
        }
    }

    /// Second construction phase.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidConfig`] and leaves the planner
    /// unconfigured if `config` does not validate.
    pub fn setup_from_config(&mut self, config: &SkeletonPlannerConfig) -> Result<(), PlannerError> {
        config.validate()?;
        info!(
            search_radius = config.search_radius,
            min_goal_distance = config.min_goal_distance,
            "skeleton planner configured"
        );
        self.config = Some(config.clone());
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Every frontier voxel within the search shell around the robot,
    /// paired with its distance and sorted nearest first.  Traversability is
    /// not checked here.
    ///
    /// # Errors
    ///
    /// [`PlannerError::NotConfigured`] before setup, [`PlannerError::Map`]
    /// when the map cannot be queried.
    pub fn frontiers(&self) -> Result<Vec<(f64, Point)>, PlannerError> {
        let config = self.config.as_ref().ok_or(PlannerError::NotConfigured)?;
        let pose = self.communicator.state_machine().current_pose();
        self.frontiers_around(config, &pose)
    }

    fn frontiers_around(
        &self,
        config: &SkeletonPlannerConfig,
        pose: &Pose,
    ) -> Result<Vec<(f64, Point)>, PlannerError> {
        let size = self.map.voxel_size()?;
        let origin = self.map.voxel_center_in_local_area(&pose.position)?;
        let reach = (config.search_radius / size).ceil() as i64;

        let mut found = Vec::new();
        for dz in -reach..=reach {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let voxel = origin + Point::new(dx as f64, dy as f64, dz as f64) * size;
                    let distance = pose.distance_to(&voxel);
                    if distance < config.min_goal_distance || distance > config.search_radius {
                        continue;
                    }
                    if self.is_frontier(&voxel, size)? {
                        found.push((distance, voxel));
                    }
                }
            }
        }
        // Stable, so equal distances keep grid order.
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(found)
    }

    fn is_frontier(&self, voxel: &Point, size: f64) -> Result<bool, PlannerError> {
        if self.map.voxel_state_in_local_area(voxel)? != VoxelState::Free {
            return Ok(false);
        }
        for n in FACE_NEIGHBOURS {
            let neighbour = voxel + Point::from(n) * size;
            if self.map.voxel_state_in_local_area(&neighbour)?.is_unknown() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl GlobalPlanner for SkeletonPlanner {
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn plan(&mut self) -> Result<Option<Point>, PlannerError> {
        let config = self.config.as_ref().ok_or(PlannerError::NotConfigured)?;
        let pose = self.communicator.state_machine().current_pose();
        let frontiers = self.frontiers_around(config, &pose)?;

        let mut goal = None;
        for &(distance, voxel) in &frontiers {
            if self
                .map
                .is_traversable_in_active_submap(&voxel, &pose.orientation)?
            {
                goal = Some((distance, voxel));
                break;
            }
        }

        debug!(
            frontiers = frontiers.len(),
            goal_distance = goal.map(|(d, _)| d),
            "frontier search finished"
        );
        Ok(goal.map(|(_, voxel)| voxel))
    }
}
