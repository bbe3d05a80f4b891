//! Local Euclidean signed distance field (ESDF) service.
//!
//! The distance field is computed by an external mapping process that runs
//! concurrently with planning.  Queries must never wait for the next map
//! update, and a single query must never observe half of one update and half
//! of the next.  [`EsdfServer`] satisfies both by holding the current
//! [`EsdfLayer`] behind an [`ArcSwap`]: the mapper builds a complete new
//! layer and swaps it in atomically; each query loads exactly one snapshot.
//!
//! # Voxel grid
//!
//! Voxel `i` along an axis is centred at `i * voxel_size` and covers
//! `[(i - 0.5) * voxel_size, (i + 0.5) * voxel_size)`.  Voxels are grouped in
//! cubic blocks of `voxels_per_side³`; only blocks containing at least one
//! written voxel are allocated.
//!
//! # Example
//!
//! ```
//! use glocal_mapping::distance_field::{DistanceField, EsdfLayer, EsdfServer};
//! use glocal_types::Point;
//!
//! let mut layer = EsdfLayer::new(0.2, 8).unwrap();
//! layer.set_distance(&Point::new(1.0, 0.0, 0.0), 0.4);
//!
//! let server = EsdfServer::new(layer);
//! assert_eq!(server.distance_at_position(&Point::new(1.0, 0.0, 0.0)), Some(0.4));
//! assert_eq!(server.distance_at_position(&Point::new(5.0, 0.0, 0.0)), None);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use glocal_types::Point;
use tracing::debug;

use crate::map::MapError;

/// Integer voxel coordinate on the global grid.
pub type VoxelIndex = [i64; 3];

/// A signed-distance service queried by the map layer.
pub trait DistanceField: Send + Sync {
    /// Signed distance to the nearest obstacle surface at `point`, or `None`
    /// when the voxel containing `point` has not been observed.
    fn distance_at_position(&self, point: &Point) -> Option<f64>;

    /// Edge length of one voxel (metres).
    fn voxel_size(&self) -> f64;

    /// Edge length of one allocation block (metres).
    fn block_size(&self) -> f64;
}

// ────────────────────────────────────────────────────────────────────────────
// EsdfLayer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct EsdfBlock {
    /// `None` marks an unobserved voxel.
    distances: Vec<Option<f64>>,
}

impl EsdfBlock {
    fn new(voxels_per_side: usize) -> Self {
        Self {
            distances: vec![None; voxels_per_side.pow(3)],
        }
    }
}

/// One immutable-once-published version of the distance field.
#[derive(Debug, Clone)]
pub struct EsdfLayer {
    voxel_size: f64,
    voxels_per_side: usize,
    blocks: HashMap<VoxelIndex, EsdfBlock>,
}

impl EsdfLayer {
    /// Create an empty layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidGeometry`] when `voxel_size` is not a
    /// positive finite number or `voxels_per_side` is zero.
    pub fn new(voxel_size: f64, voxels_per_side: usize) -> Result<Self, MapError> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(MapError::InvalidGeometry(format!(
                "voxel_size must be positive, got {voxel_size}"
            )));
        }
        if voxels_per_side == 0 {
            return Err(MapError::InvalidGeometry(
                "voxels_per_side must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            voxel_size,
            voxels_per_side,
            blocks: HashMap::new(),
        })
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub fn voxels_per_side(&self) -> usize {
        self.voxels_per_side
    }

    pub fn block_size(&self) -> f64 {
        self.voxel_size * self.voxels_per_side as f64
    }

    /// True when `other` shares this layer's voxel and block dimensions.
    pub fn same_geometry(&self, other: &EsdfLayer) -> bool {
        self.voxel_size == other.voxel_size && self.voxels_per_side == other.voxels_per_side
    }

    /// Index of the voxel containing `point`, or `None` for non-finite input.
    pub fn voxel_index(&self, point: &Point) -> Option<VoxelIndex> {
        if !point.iter().all(|c| c.is_finite()) {
            return None;
        }
        let scaled = point / self.voxel_size;
        Some([
            scaled.x.round() as i64,
            scaled.y.round() as i64,
            scaled.z.round() as i64,
        ])
    }

    /// Centre of voxel `index`.
    pub fn voxel_center(&self, index: VoxelIndex) -> Point {
        Point::new(index[0] as f64, index[1] as f64, index[2] as f64) * self.voxel_size
    }

    /// Record an observed signed distance for the voxel containing `point`.
    /// Non-finite points are ignored.
    pub fn set_distance(&mut self, point: &Point, distance: f64) {
        if let Some(index) = self.voxel_index(point) {
            self.set_distance_at_index(index, distance);
        }
    }

    pub fn set_distance_at_index(&mut self, index: VoxelIndex, distance: f64) {
        let (block, offset) = self.split(index);
        let n = self.voxels_per_side;
        self.blocks
            .entry(block)
            .or_insert_with(|| EsdfBlock::new(n))
            .distances[offset] = Some(distance);
    }

    /// Signed distance at `point`; `None` when unobserved.
    pub fn distance_at(&self, point: &Point) -> Option<f64> {
        self.distance_at_index(self.voxel_index(point)?)
    }

    pub fn distance_at_index(&self, index: VoxelIndex) -> Option<f64> {
        let (block, offset) = self.split(index);
        self.blocks.get(&block)?.distances[offset]
    }

    /// Number of voxels holding an observed distance.
    pub fn observed_voxel_count(&self) -> usize {
        self.blocks
            .values()
            .map(|b| b.distances.iter().filter(|d| d.is_some()).count())
            .sum()
    }

    pub fn allocated_block_count(&self) -> usize {
        self.blocks.len()
    }

    // Split a global voxel index into (block index, linear offset in block).
    fn split(&self, index: VoxelIndex) -> (VoxelIndex, usize) {
        let n = self.voxels_per_side as i64;
        let block = index.map(|c| c.div_euclid(n));
        let local = index.map(|c| c.rem_euclid(n) as usize);
        let n = self.voxels_per_side;
        (block, (local[2] * n + local[1]) * n + local[0])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// EsdfServer
// ────────────────────────────────────────────────────────────────────────────

/// Snapshot-publishing distance-field service.
///
/// Readers call [`DistanceField`] methods; the mapping process calls
/// [`EsdfServer::publish`] or [`EsdfServer::update`].  Neither side blocks the
/// other.
pub struct EsdfServer {
    layer: ArcSwap<EsdfLayer>,
    voxel_size: f64,
    block_size: f64,
}

impl EsdfServer {
    /// Serve `layer` as the initial snapshot.  Its geometry is fixed for the
    /// server's lifetime.
    pub fn new(layer: EsdfLayer) -> Self {
        let voxel_size = layer.voxel_size();
        let block_size = layer.block_size();
        Self {
            layer: ArcSwap::from_pointee(layer),
            voxel_size,
            block_size,
        }
    }

    /// The snapshot currently being served.
    pub fn snapshot(&self) -> Arc<EsdfLayer> {
        self.layer.load_full()
    }

    /// Atomically replace the served snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidGeometry`] if `layer` has a different voxel
    /// or block size than the layer the server was created with; the current
    /// snapshot stays in place.
    pub fn publish(&self, layer: EsdfLayer) -> Result<(), MapError> {
        if !self.layer.load().same_geometry(&layer) {
            return Err(MapError::InvalidGeometry(format!(
                "published layer voxel_size {} / block_size {} does not match served {} / {}",
                layer.voxel_size(),
                layer.block_size(),
                self.voxel_size,
                self.block_size
            )));
        }
        debug!(
            observed = layer.observed_voxel_count(),
            blocks = layer.allocated_block_count(),
            "publishing ESDF snapshot"
        );
        self.layer.store(Arc::new(layer));
        Ok(())
    }

    /// Copy the current snapshot, apply `edit`, and publish the result.
    ///
    /// Concurrent updates are retried against the newest snapshot, so `edit`
    /// may run more than once.
    pub fn update<F>(&self, mut edit: F)
    where
        F: FnMut(&mut EsdfLayer),
    {
        self.layer.rcu(|current| {
            let mut next = EsdfLayer::clone(current);
            edit(&mut next);
            next
        });
    }
}

impl DistanceField for EsdfServer {
    fn distance_at_position(&self, point: &Point) -> Option<f64> {
        self.layer.load().distance_at(point)
    }

    fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    fn block_size(&self) -> f64 {
        self.block_size
    }
}
