use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point or translation in the map frame (metres).
pub type Point = Vector3<f64>;

/// Robot pose in the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Create a pose from its position and orientation.
    pub fn new(position: Point, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at `position` with identity orientation.
    pub fn from_position(position: Point) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }

    /// Pose at the map origin with identity orientation.
    pub fn identity() -> Self {
        Self::from_position(Point::zeros())
    }

    /// Validate that every component is finite.
    ///
    /// # Errors
    ///
    /// Returns [`GlocalError::InvalidPose`] if any coordinate or quaternion
    /// component is NaN or infinite.
    pub fn validate(&self) -> Result<(), GlocalError> {
        let q = self.orientation.quaternion();
        let finite = self.position.iter().all(|c| c.is_finite())
            && q.coords.iter().all(|c| c.is_finite());
        if finite {
            Ok(())
        } else {
            Err(GlocalError::InvalidPose(format!(
                "non-finite pose component in {:?}",
                self.position
            )))
        }
    }

    /// Euclidean distance between this pose's position and `point`.
    pub fn distance_to(&self, point: &Point) -> f64 {
        (point - self.position).norm()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Occupancy classification of a single voxel.
///
/// Every queryable point maps to exactly one variant; unobserved space is
/// [`VoxelState::Unknown`], not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoxelState {
    Unknown,
    Free,
    Occupied,
}

impl VoxelState {
    pub fn is_unknown(self) -> bool {
        matches!(self, VoxelState::Unknown)
    }
}

/// Errors shared across the workspace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlocalError {
    #[error("Invalid pose: {0}")]
    InvalidPose(String),

    #[error("Invalid region of interest: {0}")]
    InvalidRegion(String),
}
