//! Global multi-submap map handle.
//!
//! Submaps are locally consistent distance-field fragments, each anchored at
//! a pose that a pose-graph optimizer keeps correcting as loop closures
//! arrive.  The map layer constructs and holds this handle but does not query
//! it for safety decisions; see [`HybridMap`][crate::hybrid::HybridMap].

use std::sync::Arc;

use arc_swap::ArcSwap;
use glocal_types::Pose;
use tracing::debug;

use crate::distance_field::EsdfLayer;

/// One registered submap.
#[derive(Debug, Clone)]
pub struct Submap {
    pub id: u32,
    /// Optimized pose of the submap origin in the map frame.
    pub pose: Pose,
    pub layer: Arc<EsdfLayer>,
}

/// Maintenance interface of the global submap collection.
pub trait SubmapCollection: Send + Sync {
    fn submap_count(&self) -> usize;

    /// Register a finished submap.  A submap with the same id is replaced.
    fn insert_submap(&self, submap: Submap);

    /// Apply an optimized pose to submap `id`.  Returns `false` when no such
    /// submap exists.
    fn update_submap_pose(&self, id: u32, pose: Pose) -> bool;

    /// Ids of all registered submaps, ascending.
    fn submap_ids(&self) -> Vec<u32>;
}

/// In-process [`SubmapCollection`] publishing copy-on-write snapshots.
#[derive(Default)]
pub struct SubmapServer {
    submaps: ArcSwap<Vec<Submap>>,
}

impl SubmapServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current submap list.
    pub fn snapshot(&self) -> Arc<Vec<Submap>> {
        self.submaps.load_full()
    }
}

impl SubmapCollection for SubmapServer {
    fn submap_count(&self) -> usize {
        self.submaps.load().len()
    }

    fn insert_submap(&self, submap: Submap) {
        debug!(id = submap.id, "registering submap");
        self.submaps.rcu(|current| {
            let mut next: Vec<Submap> = current
                .iter()
                .filter(|s| s.id != submap.id)
                .cloned()
                .collect();
            next.push(submap.clone());
            next.sort_by_key(|s| s.id);
            next
        });
    }

    fn update_submap_pose(&self, id: u32, pose: Pose) -> bool {
        let mut found = false;
        self.submaps.rcu(|current| {
            found = false;
            let mut next = Vec::clone(current);
            if let Some(s) = next.iter_mut().find(|s| s.id == id) {
                s.pose = pose;
                found = true;
            }
            next
        });
        found
    }

    fn submap_ids(&self) -> Vec<u32> {
        self.submaps.load().iter().map(|s| s.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glocal_types::Point;

    fn submap(id: u32) -> Submap {
        Submap {
            id,
            pose: Pose::identity(),
            layer: Arc::new(EsdfLayer::new(0.1, 8).unwrap()),
        }
    }

    #[test]
    fn empty_server_has_no_submaps() {
        let server = SubmapServer::new();
        assert_eq!(server.submap_count(), 0);
        assert!(server.submap_ids().is_empty());
    }

    #[test]
    fn inserted_submaps_are_sorted_by_id() {
        let server = SubmapServer::new();
        server.insert_submap(submap(3));
        server.insert_submap(submap(1));
        assert_eq!(server.submap_ids(), vec![1, 3]);
    }

    #[test]
    fn reinserting_replaces_submap() {
        let server = SubmapServer::new();
        server.insert_submap(submap(1));
        server.insert_submap(submap(1));
        assert_eq!(server.submap_count(), 1);
    }

    #[test]
    fn pose_update_applies_to_existing_submap() {
        let server = SubmapServer::new();
        server.insert_submap(submap(7));
        let corrected = Pose::from_position(Point::new(0.1, -0.2, 0.0));
        assert!(server.update_submap_pose(7, corrected));
        assert_eq!(server.snapshot()[0].pose, corrected);
    }

    #[test]
    fn pose_update_for_unknown_submap_reports_false() {
        let server = SubmapServer::new();
        assert!(!server.update_submap_pose(42, Pose::identity()));
    }
}
