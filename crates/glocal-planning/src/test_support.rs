//! Planner fixtures: a configured hybrid map over an in-process ESDF.

use std::sync::Arc;

use glocal_mapping::{
    BackendHub, Communicator, EsdfLayer, EsdfServer, HybridMap, Map, MapConfig, SubmapServer,
};
use glocal_state::{BoundingBox, BoundingBoxConfig, StateMachine};
use glocal_types::Point;

pub(crate) struct Fixture {
    pub communicator: Communicator,
    pub esdf: Arc<EsdfServer>,
    pub map: Arc<dyn Map>,
}

impl Fixture {
    /// Mark every voxel in the axis-aligned box `[min, max]` as observed
    /// with clearance `distance`.
    pub fn fill_free(&self, min: Point, max: Point, distance: f64) {
        self.esdf.update(|layer| {
            let (Some(lo), Some(hi)) = (layer.voxel_index(&min), layer.voxel_index(&max)) else {
                return;
            };
            for z in lo[2]..=hi[2] {
                for y in lo[1]..=hi[1] {
                    for x in lo[0]..=hi[0] {
                        layer.set_distance_at_index([x, y, z], distance);
                    }
                }
            }
        });
    }

    pub fn state_machine(&self) -> &Arc<StateMachine> {
        self.communicator.state_machine()
    }
}

/// Hybrid map with 0.2 m voxels, default radii, a ±5 m region of interest
/// and the robot at the origin.
pub(crate) fn fixture() -> Fixture {
    let roi = BoundingBox::new(BoundingBoxConfig {
        x_min: -5.0,
        x_max: 5.0,
        y_min: -5.0,
        y_max: 5.0,
        z_min: -5.0,
        z_max: 5.0,
    })
    .unwrap();
    let esdf = Arc::new(EsdfServer::new(EsdfLayer::new(0.2, 8).unwrap()));
    let mut hub = BackendHub::new();
    hub.register_distance_field("local", esdf.clone());
    hub.register_submap_collection("global", Arc::new(SubmapServer::new()));
    let communicator = Communicator::new(
        Arc::new(StateMachine::new(Arc::new(roi))),
        Arc::new(hub),
    );

    let mut map = HybridMap::new(communicator.clone());
    map.setup_from_config(MapConfig::Hybrid(Default::default()))
        .unwrap();
    Fixture {
        communicator,
        esdf,
        map: Arc::new(map),
    }
}
