//! [`RegionOfInterest`] – membership predicate over 3-D points.
//!
//! Every traversability query is gated by the active region: a point outside
//! it is never safe, whatever the map says about it.
//!
//! # Example
//!
//! ```
//! use glocal_state::region_of_interest::{BoundingBox, BoundingBoxConfig, RegionOfInterest};
//! use glocal_types::Point;
//!
//! let roi = BoundingBox::new(BoundingBoxConfig {
//!     x_min: -1.0, x_max: 1.0,
//!     y_min: -1.0, y_max: 1.0,
//!     z_min: 0.0, z_max: 2.0,
//! }).unwrap();
//!
//! assert!(roi.contains(&Point::new(0.0, 0.0, 1.0)));
//! assert!(!roi.contains(&Point::new(0.0, 0.0, 3.0)));
//! ```

use glocal_types::{GlocalError, Point};
use serde::{Deserialize, Serialize};

/// A geometric predicate restricting which space is explored.
///
/// Implementations must be cheap to evaluate; they sit on the hot path of
/// every traversability query.
pub trait RegionOfInterest: Send + Sync {
    /// Human-readable name used in log messages.
    fn name(&self) -> &str;

    /// True when `point` lies inside the region.
    fn contains(&self, point: &Point) -> bool;
}

// ────────────────────────────────────────────────────────────────────────────
// BoundingBox
// ────────────────────────────────────────────────────────────────────────────

/// Parameters of a [`BoundingBox`] region (metres, map frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

/// Axis-aligned box region; boundary points count as inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Point,
    max: Point,
}

impl BoundingBox {
    /// Build the region from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GlocalError::InvalidRegion`] when a minimum exceeds its
    /// maximum or a bound is not finite.
    pub fn new(config: BoundingBoxConfig) -> Result<Self, GlocalError> {
        let min = Point::new(config.x_min, config.y_min, config.z_min);
        let max = Point::new(config.x_max, config.y_max, config.z_max);
        if min.iter().chain(max.iter()).any(|c| !c.is_finite()) {
            return Err(GlocalError::InvalidRegion(
                "bounding box bounds must be finite".to_string(),
            ));
        }
        for (axis, (lo, hi)) in ["x", "y", "z"].iter().zip(min.iter().zip(max.iter())) {
            if lo > hi {
                return Err(GlocalError::InvalidRegion(format!(
                    "{axis}_min {lo} exceeds {axis}_max {hi}"
                )));
            }
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> &Point {
        &self.min
    }

    pub fn max(&self) -> &Point {
        &self.max
    }
}

impl RegionOfInterest for BoundingBox {
    fn name(&self) -> &str {
        "bounding-box"
    }

    fn contains(&self, point: &Point) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(BoundingBoxConfig {
            x_min: -1.0,
            x_max: 1.0,
            y_min: -1.0,
            y_max: 1.0,
            z_min: -1.0,
            z_max: 1.0,
        })
        .unwrap()
    }

    #[test]
    fn interior_point_is_contained() {
        assert!(unit_box().contains(&Point::new(0.5, -0.5, 0.0)));
    }

    #[test]
    fn boundary_point_is_contained() {
        assert!(unit_box().contains(&Point::new(1.0, 1.0, -1.0)));
    }

    #[test]
    fn exterior_point_on_any_axis_is_rejected() {
        let roi = unit_box();
        assert!(!roi.contains(&Point::new(1.01, 0.0, 0.0)));
        assert!(!roi.contains(&Point::new(0.0, -1.01, 0.0)));
        assert!(!roi.contains(&Point::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let result = BoundingBox::new(BoundingBoxConfig {
            x_min: 2.0,
            x_max: 1.0,
            ..BoundingBoxConfig::default()
        });
        assert!(matches!(result, Err(GlocalError::InvalidRegion(ref m)) if m.contains("x_min")));
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let result = BoundingBox::new(BoundingBoxConfig {
            z_max: f64::INFINITY,
            ..BoundingBoxConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_box_contains_only_its_point() {
        let roi = BoundingBox::new(BoundingBoxConfig::default()).unwrap();
        assert!(roi.contains(&Point::zeros()));
        assert!(!roi.contains(&Point::new(0.1, 0.0, 0.0)));
    }
}
