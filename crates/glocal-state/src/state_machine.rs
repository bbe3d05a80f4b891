//! [`StateMachine`] – shared robot pose, region of interest and exploration
//! phase.
//!
//! The planning/execution loop writes the current pose and advances the
//! [`ExplorationPhase`]; map queries only read.  Pose and region live in
//! [`ArcSwap`] cells so readers never block on a writer and always observe a
//! complete value.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use glocal_state::{BoundingBox, BoundingBoxConfig, StateMachine};
//! use glocal_types::{Point, Pose};
//!
//! let roi = BoundingBox::new(BoundingBoxConfig {
//!     x_min: -5.0, x_max: 5.0,
//!     y_min: -5.0, y_max: 5.0,
//!     z_min: -1.0, z_max: 1.0,
//! }).unwrap();
//! let sm = StateMachine::new(Arc::new(roi));
//!
//! sm.set_current_pose(Pose::from_position(Point::new(1.0, 0.0, 0.0))).unwrap();
//! assert_eq!(sm.current_pose().position.x, 1.0);
//! assert!(sm.point_in_roi(&Point::new(4.0, 0.0, 0.0)));
//! ```

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use glocal_types::{GlocalError, Point, Pose};
use tracing::{info, warn};

use crate::region_of_interest::RegionOfInterest;

/// Coarse phase of the exploration mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplorationPhase {
    /// Components are being constructed and configured.
    Initializing,
    /// Startup finished; waiting for the first planning cycle.
    Ready,
    /// Choosing the next viewpoint near the robot.
    LocalPlanning,
    /// Local planning is exhausted; searching the whole map for frontiers.
    GlobalPlanning,
    /// Nothing left to explore, or the mission was stopped.  Terminal.
    Finished,
}

impl fmt::Display for ExplorationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExplorationPhase::Initializing => "initializing",
            ExplorationPhase::Ready => "ready",
            ExplorationPhase::LocalPlanning => "local_planning",
            ExplorationPhase::GlobalPlanning => "global_planning",
            ExplorationPhase::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Process-wide exploration state shared by the map, planners and
/// visualizers.
///
/// Wrap in an [`Arc`] and hand a clone to every component; all methods take
/// `&self`.
pub struct StateMachine {
    pose: ArcSwap<Pose>,
    roi: ArcSwap<Arc<dyn RegionOfInterest>>,
    phase: ArcSwap<ExplorationPhase>,
}

impl StateMachine {
    /// Create a state machine with the robot at the origin, in the
    /// [`ExplorationPhase::Initializing`] phase.
    pub fn new(roi: Arc<dyn RegionOfInterest>) -> Self {
        Self {
            pose: ArcSwap::from_pointee(Pose::identity()),
            roi: ArcSwap::from_pointee(roi),
            phase: ArcSwap::from_pointee(ExplorationPhase::Initializing),
        }
    }

    /// Latest robot pose.
    pub fn current_pose(&self) -> Pose {
        **self.pose.load()
    }

    /// Publish a new robot pose.
    ///
    /// # Errors
    ///
    /// Returns [`GlocalError::InvalidPose`] for non-finite poses; the stored
    /// pose is left unchanged.
    pub fn set_current_pose(&self, pose: Pose) -> Result<(), GlocalError> {
        pose.validate()?;
        self.pose.store(Arc::new(pose));
        Ok(())
    }

    /// True when `point` lies inside the active region of interest.
    pub fn point_in_roi(&self, point: &Point) -> bool {
        self.roi.load().contains(point)
    }

    /// Replace the active region of interest.
    pub fn set_region_of_interest(&self, roi: Arc<dyn RegionOfInterest>) {
        info!(region = roi.name(), "region of interest replaced");
        self.roi.store(Arc::new(roi));
    }

    pub fn phase(&self) -> ExplorationPhase {
        **self.phase.load()
    }

    /// Move to `next`.  Returns `false` (and leaves the phase untouched) when
    /// the mission is already [`ExplorationPhase::Finished`].
    ///
    /// The terminal check and the store happen in one `rcu` step, so
    /// concurrent writers can never leave `Finished`.
    pub fn transition_to(&self, next: ExplorationPhase) -> bool {
        let previous = self.phase.rcu(|current| match **current {
            ExplorationPhase::Finished => ExplorationPhase::Finished,
            _ => next,
        });
        let current = *previous;
        if current == ExplorationPhase::Finished && next != ExplorationPhase::Finished {
            warn!(from = %current, to = %next, "ignoring transition out of terminal phase");
            return false;
        }
        if current != next {
            info!(from = %current, to = %next, "exploration phase changed");
        }
        true
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == ExplorationPhase::Finished
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("pose", &self.current_pose())
            .field("roi", &self.roi.load().name())
            .field("phase", &self.phase())
            .finish()
    }
}
