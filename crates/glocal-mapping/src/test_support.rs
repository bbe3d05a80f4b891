//! Shared fixtures for the in-crate map tests.

use std::sync::Arc;

use glocal_state::{BoundingBox, BoundingBoxConfig, StateMachine};
use glocal_types::Point;

use crate::communicator::Communicator;
use crate::distance_field::{EsdfLayer, EsdfServer};
use crate::hub::BackendHub;
use crate::submap::SubmapServer;

pub(crate) struct Fixture {
    pub communicator: Communicator,
    pub esdf: Arc<EsdfServer>,
    pub submaps: Arc<SubmapServer>,
}

impl Fixture {
    pub fn observe(&self, point: &Point, distance: f64) {
        self.esdf.update(|layer| layer.set_distance(point, distance));
    }

    pub fn state_machine(&self) -> &Arc<StateMachine> {
        self.communicator.state_machine()
    }
}

fn state_machine() -> Arc<StateMachine> {
    let roi = BoundingBox::new(BoundingBoxConfig {
        x_min: -5.0,
        x_max: 5.0,
        y_min: -5.0,
        y_max: 5.0,
        z_min: -5.0,
        z_max: 5.0,
    })
    .unwrap();
    Arc::new(StateMachine::new(Arc::new(roi)))
}

/// Communicator whose hub serves `"local"` (0.2 m voxels, 8 per block side)
/// and `"global"`, with a ±5 m region of interest and the robot at the origin.
pub(crate) fn fixture() -> Fixture {
    fixture_with_voxel_size(0.2)
}

/// [`fixture`] with a local field of `voxel_size` metre voxels.
pub(crate) fn fixture_with_voxel_size(voxel_size: f64) -> Fixture {
    let esdf = Arc::new(EsdfServer::new(EsdfLayer::new(voxel_size, 8).unwrap()));
    let submaps = Arc::new(SubmapServer::new());
    let mut hub = BackendHub::new();
    hub.register_distance_field("local", esdf.clone());
    hub.register_submap_collection("global", submaps.clone());
    Fixture {
        communicator: Communicator::new(state_machine(), Arc::new(hub)),
        esdf,
        submaps,
    }
}

/// Communicator with an empty hub.
pub(crate) fn communicator() -> Communicator {
    Communicator::new(state_machine(), Arc::new(BackendHub::new()))
}
