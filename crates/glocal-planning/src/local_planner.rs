//! [`LocalPlanner`] – next-best-view selection around the robot.
//!
//! [`SamplingPlanner`] draws candidate viewpoints uniformly from a ball
//! around the current pose, discards every candidate the map does not
//! consider safe (including the straight segment leading to it), and scores
//! the rest by how many unknown voxels lie within sensor range.  The best
//! candidate becomes the goal if its gain reaches `min_gain`.
//!
//! The sampler is seeded from the configuration so a run is reproducible.

use std::sync::Arc;

use glocal_mapping::{Communicator, Map, MapError};
use glocal_types::{Point, VoxelState};
use nalgebra::UnitQuaternion;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlannerError, require_positive};

/// Factory type name of [`SamplingPlanner`].
pub const TYPE_NAME: &str = "sampling-based";

/// A local planner proposes the next viewpoint near the robot.
pub trait LocalPlanner: Send {
    fn name(&self) -> &str;

    /// Run one planning cycle from the current robot pose.
    ///
    /// # Errors
    ///
    /// Propagates [`PlannerError::Map`] when the map is unusable.
    fn plan(&mut self) -> Result<LocalPlanResult, PlannerError>;
}

/// A scored viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub position: Point,
    /// Unknown voxels within sensor range of `position`.
    pub gain: usize,
}

/// Outcome of one local planning cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalPlanResult {
    /// Robot position the cycle planned from.
    pub origin: Point,
    /// Safe, scored candidates.
    pub candidates: Vec<Candidate>,
    /// Samples rejected as not traversable.
    pub rejected: usize,
    /// Chosen viewpoint; `None` when nothing worthwhile is left nearby.
    pub goal: Option<Candidate>,
}

/// Parameters of a [`SamplingPlanner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPlannerConfig {
    /// Radius of the sampling ball around the robot (metres).
    pub sampling_radius: f64,
    /// Samples drawn per cycle.
    pub num_samples: usize,
    /// Range within which unknown voxels count towards a candidate's gain.
    pub sensor_radius: f64,
    /// Minimum gain for a candidate to become the goal.
    pub min_gain: usize,
    pub seed: u64,
}

impl Default for SamplingPlannerConfig {
    fn default() -> Self {
        Self {
            sampling_radius: 1.5,
            num_samples: 40,
            sensor_radius: 1.0,
            min_gain: 1,
            seed: 0,
        }
    }
}

impl SamplingPlannerConfig {
    pub fn validate(&self) -> Result<(), PlannerError> {
        require_positive("sampling_radius", self.sampling_radius)?;
        require_positive("sensor_radius", self.sensor_radius)?;
        if self.num_samples == 0 {
            return Err(PlannerError::InvalidConfig(
                "num_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sampling-based next-best-view planner.
pub struct SamplingPlanner {
    config: SamplingPlannerConfig,
    communicator: Communicator,
    map: Arc<dyn Map>,
    rng: ChaCha8Rng,
}

impl SamplingPlanner {
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidConfig`] for non-positive radii or a
    /// zero sample count.
    pub fn new(
        config: SamplingPlannerConfig,
        communicator: Communicator,
        map: Arc<dyn Map>,
    ) -> Result<Self, PlannerError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            communicator,
            map,
            rng,
        })
    }

    pub fn config(&self) -> &SamplingPlannerConfig {
        &self.config
    }

    // Uniform sample in the ball of radius `sampling_radius`.
    fn sample_offset(&mut self) -> Point {
        loop {
            let v = Point::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            );
            if v.norm_squared() <= 1.0 {
                return v * self.config.sampling_radius;
            }
        }
    }
}

impl LocalPlanner for SamplingPlanner {
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn plan(&mut self) -> Result<LocalPlanResult, PlannerError> {
        let pose = self.communicator.state_machine().current_pose();
        let mut candidates = Vec::new();
        let mut rejected = 0;

        for _ in 0..self.config.num_samples {
            let target = pose.position + self.sample_offset();
            if !self
                .map
                .is_traversable_in_active_submap(&target, &pose.orientation)?
                || !segment_is_traversable(
                    self.map.as_ref(),
                    &pose.position,
                    &target,
                    &pose.orientation,
                )?
            {
                rejected += 1;
                continue;
            }
            let gain = unknown_voxels_around(self.map.as_ref(), &target, self.config.sensor_radius)?;
            candidates.push(Candidate {
                position: target,
                gain,
            });
        }

        let goal = candidates
            .iter()
            .filter(|c| c.gain >= self.config.min_gain)
            .max_by_key(|c| c.gain)
            .copied();
        debug!(
            candidates = candidates.len(),
            rejected,
            best_gain = goal.map(|g| g.gain),
            "local planning cycle"
        );
        Ok(LocalPlanResult {
            origin: pose.position,
            candidates,
            rejected,
            goal,
        })
    }
}

/// True when every point sampled at half-voxel spacing along `from → to`
/// (excluding `from`) is traversable.
pub(crate) fn segment_is_traversable(
    map: &dyn Map,
    from: &Point,
    to: &Point,
    orientation: &UnitQuaternion<f64>,
) -> Result<bool, MapError> {
    let step = map.voxel_size()? / 2.0;
    let delta = to - from;
    let steps = (delta.norm() / step).ceil().max(1.0) as usize;
    for i in 1..=steps {
        let p = from + delta * (i as f64 / steps as f64);
        if !map.is_traversable_in_active_submap(&p, orientation)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Count unknown voxels whose centres lie within `radius` of `center`.
pub(crate) fn unknown_voxels_around(
    map: &dyn Map,
    center: &Point,
    radius: f64,
) -> Result<usize, MapError> {
    let voxel = map.voxel_size()?;
    let origin = map.voxel_center_in_local_area(center)?;
    let reach = (radius / voxel).ceil() as i64;
    let mut unknown = 0;
    for dz in -reach..=reach {
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let offset = Point::new(dx as f64, dy as f64, dz as f64) * voxel;
                if offset.norm() > radius {
                    continue;
                }
                if map.voxel_state_in_local_area(&(origin + offset))? == VoxelState::Unknown {
                    unknown += 1;
                }
            }
        }
    }
    Ok(unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, fixture};
    use glocal_mapping::{HybridMap, SingleBackendMap};

    fn planner(fix: &Fixture, config: SamplingPlannerConfig) -> SamplingPlanner {
        SamplingPlanner::new(config, fix.communicator.clone(), fix.map.clone()).unwrap()
    }

    // ------------------------------------------------------------------ config

    #[test]
    fn zero_samples_is_rejected() {
        let fix = fixture();
        let result = SamplingPlanner::new(
            SamplingPlannerConfig {
                num_samples: 0,
                ..SamplingPlannerConfig::default()
            },
            fix.communicator.clone(),
            fix.map.clone(),
        );
        assert!(matches!(result, Err(PlannerError::InvalidConfig(_))));
    }

    #[test]
    fn negative_radius_is_rejected() {
        let cfg = SamplingPlannerConfig {
            sensor_radius: -1.0,
            ..SamplingPlannerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    // ------------------------------------------------------------------ planning

    #[test]
    fn unusable_map_propagates_error() {
        let fix = fixture();
        let map: Arc<dyn Map> = Arc::new(HybridMap::new(fix.communicator.clone()));
        let mut p = SamplingPlanner::new(
            SamplingPlannerConfig::default(),
            fix.communicator.clone(),
            map,
        )
        .unwrap();
        assert_eq!(
            p.plan().unwrap_err(),
            PlannerError::Map(MapError::NotInitialized)
        );
    }

    #[test]
    fn unknown_world_only_accepts_clearing_radius_samples() {
        let fix = fixture();
        let mut p = planner(&fix, SamplingPlannerConfig::default());
        let result = p.plan().unwrap();
        assert_eq!(result.candidates.len() + result.rejected, 40);
        for c in &result.candidates {
            assert!(c.position.norm() < 0.5);
        }
    }

    #[test]
    fn fully_known_neighbourhood_yields_no_goal() {
        let fix = fixture();
        fix.fill_free(Point::new(-4.0, -4.0, -4.0), Point::new(4.0, 4.0, 4.0), 1.0);
        let mut p = planner(&fix, SamplingPlannerConfig::default());
        let result = p.plan().unwrap();
        assert!(!result.candidates.is_empty());
        assert!(result.candidates.iter().all(|c| c.gain == 0));
        assert!(result.goal.is_none());
    }

    #[test]
    fn goal_points_towards_unknown_space() {
        let fix = fixture();
        // Known free space ends at x = 1; everything beyond is unknown.
        fix.fill_free(Point::new(-3.0, -3.0, -3.0), Point::new(1.0, 3.0, 3.0), 1.0);
        let mut p = planner(&fix, SamplingPlannerConfig::default());
        let goal = p.plan().unwrap().goal.expect("goal near the unknown boundary");
        assert!(goal.position.x > 0.0);
        assert!(goal.gain > 0);
    }

    #[test]
    fn same_seed_reproduces_the_plan() {
        let fix = fixture();
        fix.fill_free(Point::new(-3.0, -3.0, -3.0), Point::new(1.0, 3.0, 3.0), 1.0);
        let a = planner(&fix, SamplingPlannerConfig::default()).plan().unwrap();
        let b = planner(&fix, SamplingPlannerConfig::default()).plan().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn works_with_single_backend_map() {
        let fix = fixture();
        let mut map = SingleBackendMap::new(fix.communicator.clone());
        map.setup_from_config(glocal_mapping::MapConfig::SingleBackend(
            Default::default(),
        ))
        .unwrap();
        let mut p = SamplingPlanner::new(
            SamplingPlannerConfig::default(),
            fix.communicator.clone(),
            Arc::new(map),
        )
        .unwrap();
        assert!(p.plan().is_ok());
    }

    // ------------------------------------------------------------------ helpers

    #[test]
    fn segment_through_obstacle_is_blocked() {
        let fix = fixture();
        fix.fill_free(Point::new(-2.0, -2.0, -2.0), Point::new(2.0, 2.0, 2.0), 1.0);
        fix.esdf
            .update(|layer| layer.set_distance(&Point::new(1.0, 0.0, 0.0), 0.0));
        let q = UnitQuaternion::identity();
        let map = fix.map.as_ref();
        assert!(!segment_is_traversable(map, &Point::zeros(), &Point::new(2.0, 0.0, 0.0), &q).unwrap());
        assert!(segment_is_traversable(map, &Point::zeros(), &Point::new(0.0, 2.0, 0.0), &q).unwrap());
    }

    #[test]
    fn unknown_count_in_empty_map_is_ball_volume() {
        let fix = fixture();
        // Radius of exactly one voxel: the centre plus its six face neighbours.
        let n = unknown_voxels_around(fix.map.as_ref(), &Point::zeros(), 0.2).unwrap();
        assert_eq!(n, 7);
    }
}
