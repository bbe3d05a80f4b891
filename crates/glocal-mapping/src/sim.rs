//! In-process simulated world for headless runs and CI.
//!
//! [`SimulatedWorld`] holds a set of sphere obstacles and plays the role of
//! the sensor + distance-field pipeline: [`SimulatedWorld::observe`] writes
//! the exact signed distance of every voxel within sensor range of a pose
//! into an [`EsdfLayer`].  Combined with [`EsdfServer::update`] this lets the
//! whole exploration stack run without a robot.
//!
//! # Example
//!
//! ```rust
//! use glocal_mapping::distance_field::{DistanceField, EsdfLayer, EsdfServer};
//! use glocal_mapping::sim::{SimulatedWorld, SphereObstacle};
//! use glocal_types::{Point, Pose};
//!
//! let world = SimulatedWorld::new(2.0, 5.0)
//!     .with_obstacle(SphereObstacle::new(Point::new(1.0, 0.0, 0.0), 0.3));
//!
//! let server = EsdfServer::new(EsdfLayer::new(0.2, 8).unwrap());
//! server.update(|layer| { world.observe(&Pose::identity(), layer); });
//!
//! let d = server.distance_at_position(&Point::new(0.0, 0.0, 0.0)).unwrap();
//! assert!((d - 0.7).abs() < 1e-9);
//! ```
//!
//! [`EsdfServer::update`]: crate::distance_field::EsdfServer::update

use glocal_types::{Point, Pose};
use serde::{Deserialize, Serialize};

use crate::distance_field::EsdfLayer;

/// A solid sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereObstacle {
    pub center: Point,
    pub radius: f64,
}

impl SphereObstacle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Signed distance from `point` to the sphere surface (negative inside).
    pub fn signed_distance(&self, point: &Point) -> f64 {
        (point - self.center).norm() - self.radius
    }
}

/// Ground-truth world made of sphere obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedWorld {
    obstacles: Vec<SphereObstacle>,
    sensor_range: f64,
    max_distance: f64,
}

impl SimulatedWorld {
    /// Empty world observed up to `sensor_range` metres from the sensor.
    /// Distances are truncated at `max_distance`.
    pub fn new(sensor_range: f64, max_distance: f64) -> Self {
        Self {
            obstacles: Vec::new(),
            sensor_range: sensor_range.max(0.0),
            max_distance,
        }
    }

    pub fn with_obstacle(mut self, obstacle: SphereObstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn obstacles(&self) -> &[SphereObstacle] {
        &self.obstacles
    }

    pub fn sensor_range(&self) -> f64 {
        self.sensor_range
    }

    /// True signed distance at `point`, truncated at `max_distance`.
    pub fn signed_distance(&self, point: &Point) -> f64 {
        self.obstacles
            .iter()
            .map(|o| o.signed_distance(point))
            .fold(self.max_distance, f64::min)
    }

    /// Write the distance of every voxel within sensor range of `pose` into
    /// `layer`.  Returns the number of voxels written.
    pub fn observe(&self, pose: &Pose, layer: &mut EsdfLayer) -> usize {
        let Some(center) = layer.voxel_index(&pose.position) else {
            return 0;
        };
        let reach = (self.sensor_range / layer.voxel_size()).ceil() as i64;
        let mut written = 0;
        for dz in -reach..=reach {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let index = [center[0] + dx, center[1] + dy, center[2] + dz];
                    let voxel = layer.voxel_center(index);
                    if pose.distance_to(&voxel) > self.sensor_range {
                        continue;
                    }
                    layer.set_distance_at_index(index, self.signed_distance(&voxel));
                    written += 1;
                }
            }
        }
        written
    }
}
