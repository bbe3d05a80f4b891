//! Headless simulation backend.
//!
//! [`Simulation`] owns the in-process ESDF and submap services, fills the
//! ESDF from a [`SimulatedWorld`] around every pose the robot reaches, and
//! closes a submap every `submap_interval` moves.  It implements
//! [`GoalExecutor`] by teleporting the robot to the goal.
//!
//! ```toml
//! [simulation]
//! voxel_size = 0.2
//! sensor_range = 1.5
//! obstacles = [
//!     { center = [2.0, 0.0, 0.0], radius = 0.4 },
//! ]
//! ```

use std::sync::Arc;

use glocal_mapping::{
    BackendHub, EsdfLayer, EsdfServer, MapError, SimulatedWorld, SphereObstacle, Submap,
    SubmapCollection, SubmapServer,
};
use glocal_types::{Point, Pose};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::runner::{ExecutionError, GoalExecutor};

/// Hub name of the simulated distance field.
pub const LOCAL_SERVICE: &str = "local";
/// Hub name of the simulated submap collection.
pub const GLOBAL_SERVICE: &str = "global";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub voxel_size: f64,
    pub voxels_per_side: usize,
    pub sensor_range: f64,
    /// Distances are truncated at this value.
    pub max_distance: f64,
    /// Moves between two closed submaps; `0` disables submaps.
    pub submap_interval: usize,
    pub obstacles: Vec<SphereObstacle>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.2,
            voxels_per_side: 8,
            sensor_range: 1.5,
            max_distance: 2.0,
            submap_interval: 5,
            obstacles: Vec::new(),
        }
    }
}

pub struct Simulation {
    world: SimulatedWorld,
    esdf: Arc<EsdfServer>,
    submaps: Arc<SubmapServer>,
    submap_interval: usize,
    moves: usize,
    next_submap_id: u32,
}

impl Simulation {
    /// # Errors
    ///
    /// Returns [`MapError::InvalidGeometry`] for an unusable voxel grid.
    pub fn new(config: &SimulationConfig) -> Result<Self, MapError> {
        let layer = EsdfLayer::new(config.voxel_size, config.voxels_per_side)?;
        let world = config
            .obstacles
            .iter()
            .fold(
                SimulatedWorld::new(config.sensor_range, config.max_distance),
                |world, obstacle| world.with_obstacle(*obstacle),
            );
        Ok(Self {
            world,
            esdf: Arc::new(EsdfServer::new(layer)),
            submaps: Arc::new(SubmapServer::new()),
            submap_interval: config.submap_interval,
            moves: 0,
            next_submap_id: 0,
        })
    }

    /// Hub serving this simulation under [`LOCAL_SERVICE`] and
    /// [`GLOBAL_SERVICE`].
    pub fn backends(&self) -> BackendHub {
        let mut hub = BackendHub::new();
        hub.register_distance_field(LOCAL_SERVICE, self.esdf.clone());
        hub.register_submap_collection(GLOBAL_SERVICE, self.submaps.clone());
        hub
    }

    pub fn esdf(&self) -> &Arc<EsdfServer> {
        &self.esdf
    }

    pub fn submaps(&self) -> &Arc<SubmapServer> {
        &self.submaps
    }

    pub fn world(&self) -> &SimulatedWorld {
        &self.world
    }

    /// Integrate one sensor sweep at `pose`.  Returns the voxels written.
    pub fn observe(&self, pose: &Pose) -> usize {
        let mut written = 0;
        self.esdf.update(|layer| written = self.world.observe(pose, layer));
        written
    }

    fn close_submap(&mut self, pose: Pose) {
        let submap = Submap {
            id: self.next_submap_id,
            pose,
            layer: self.esdf.snapshot(),
        };
        self.next_submap_id += 1;
        self.submaps.insert_submap(submap);
    }
}

impl GoalExecutor for Simulation {
    fn execute(&mut self, goal: &Point) -> Result<Pose, ExecutionError> {
        if self.world.signed_distance(goal) <= 0.0 {
            return Err(ExecutionError::goal_in_obstacle(goal));
        }
        let pose = Pose::from_position(*goal);
        let written = self.observe(&pose);
        self.moves += 1;
        debug!(x = goal.x, y = goal.y, z = goal.z, written, "robot moved");
        if self.submap_interval > 0 && self.moves % self.submap_interval == 0 {
            self.close_submap(pose);
        }
        Ok(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glocal_mapping::DistanceField;

    #[test]
    fn obstacles_come_from_config() {
        let config = SimulationConfig {
            obstacles: vec![SphereObstacle::new(Point::new(1.0, 0.0, 0.0), 0.5)],
            ..SimulationConfig::default()
        };
        let sim = Simulation::new(&config).unwrap();
        assert_eq!(sim.world().obstacles().len(), 1);
    }

    #[test]
    fn invalid_grid_is_rejected() {
        let config = SimulationConfig {
            voxel_size: 0.0,
            ..SimulationConfig::default()
        };
        assert!(Simulation::new(&config).is_err());
    }

    #[test]
    fn execute_observes_around_goal() {
        let mut sim = Simulation::new(&SimulationConfig::default()).unwrap();
        let goal = Point::new(3.0, 0.0, 0.0);
        assert!(sim.esdf().distance_at_position(&goal).is_none());
        let pose = sim.execute(&goal).unwrap();
        assert_eq!(pose.position, goal);
        assert!(sim.esdf().distance_at_position(&goal).is_some());
    }

    #[test]
    fn goal_inside_obstacle_fails() {
        let config = SimulationConfig {
            obstacles: vec![SphereObstacle::new(Point::zeros(), 0.5)],
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(&config).unwrap();
        assert_eq!(
            sim.execute(&Point::new(0.1, 0.0, 0.0)),
            Err(ExecutionError::GoalInObstacle {
                x: 0.1,
                y: 0.0,
                z: 0.0,
            })
        );
    }

    #[test]
    fn submaps_close_at_interval() {
        let config = SimulationConfig {
            submap_interval: 2,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(&config).unwrap();
        for i in 0..5 {
            sim.execute(&Point::new(i as f64 * 0.5, 0.0, 0.0)).unwrap();
        }
        assert_eq!(sim.submaps().submap_ids(), vec![0, 1]);
    }

    #[test]
    fn backends_resolve_by_name() {
        let sim = Simulation::new(&SimulationConfig::default()).unwrap();
        let hub = sim.backends();
        assert!(hub.distance_field(LOCAL_SERVICE).is_ok());
        assert!(hub.submap_collection(GLOBAL_SERVICE).is_ok());
    }
}
