//! [`ComponentFactory`] – builds components by the `type` of their config
//! section.
//!
//! | Extension point | Recognised types | Unknown type |
//! |---|---|---|
//! | map | `single-backend`, `hybrid` | error |
//! | local planner | `sampling-based` | error |
//! | local planner visualizer | `sampling-based` | warning, [`DefaultVisualizer`] |
//! | region of interest | `bounding-box` | error |
//! | global planner | `skeleton` | error |
//!
//! A section without `type` reports [`TYPE_NOT_SET`] and is rejected like
//! any other unknown name.  Every failure is logged before it is returned.
//!
//! The map's typed config is built from the same section that selected the
//! backend, so a config of the wrong kind can never reach
//! `setup_from_config`.  The skeleton planner's second construction phase
//! runs inside [`ComponentFactory::create_global_planner`]; its failure is
//! returned as [`FactoryError::Setup`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use glocal_mapping::{BackendHub, Communicator};
//! use glocal_planning::LocalPlannerVisualizer;
//! use glocal_runtime::config::RuntimeConfig;
//! use glocal_runtime::factory::ComponentFactory;
//! use glocal_state::StateMachine;
//!
//! let cfg = RuntimeConfig::parse(r#"
//! [region_of_interest]
//! type = "bounding-box"
//! x_min = -1.0
//! x_max = 1.0
//! y_min = -1.0
//! y_max = 1.0
//! z_min = 0.0
//! z_max = 1.0
//!
//! [local_planner]
//! type = "not-a-planner"
//! "#).unwrap();
//!
//! let factory = ComponentFactory;
//! let roi = factory.create_region_of_interest(&cfg.source("region_of_interest")).unwrap();
//! let comm = Communicator::new(Arc::new(StateMachine::new(roi)), Arc::new(BackendHub::new()));
//!
//! // An unknown visualizer is not fatal.
//! let vis = factory.create_local_planner_visualizer(&cfg.source("local_planner"), &comm);
//! assert_eq!(vis.name(), "default");
//! ```

use std::sync::Arc;

use glocal_mapping::{
    Communicator, HybridMap, Map, MapConfig, SingleBackendMap, hybrid, single_backend,
};
use glocal_planning::{
    DefaultVisualizer, GlobalPlanner, LocalPlanner, LocalPlannerVisualizer, SamplingPlanner,
    SamplingPlannerVisualizer, SkeletonPlanner, global_planner, local_planner,
};
use glocal_state::{BoundingBox, BoundingBoxConfig, RegionOfInterest};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigSource, TYPE_NOT_SET};

/// Factory type name of the bounding-box region of interest.
pub const BOUNDING_BOX: &str = "bounding-box";

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Unknown {component} type '{type_name}'")]
    UnknownType {
        component: &'static str,
        type_name: String,
    },

    #[error("Invalid {component} config: {message}")]
    InvalidConfig {
        component: &'static str,
        message: String,
    },

    #[error("{component} setup failed: {message}")]
    Setup {
        component: &'static str,
        message: String,
    },
}

impl FactoryError {
    pub fn component(&self) -> &'static str {
        match self {
            FactoryError::UnknownType { component, .. }
            | FactoryError::InvalidConfig { component, .. }
            | FactoryError::Setup { component, .. } => component,
        }
    }
}

/// Stateless selector; call each `create_*` once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentFactory;

impl ComponentFactory {
    /// Build and set up the map named by `source`.
    ///
    /// # Errors
    ///
    /// [`FactoryError::UnknownType`], [`FactoryError::InvalidConfig`] for a
    /// malformed section, or [`FactoryError::Setup`] when the backend cannot
    /// be connected.
    pub fn create_map(
        &self,
        source: &ConfigSource,
        communicator: &Communicator,
    ) -> Result<Arc<dyn Map>, FactoryError> {
        const COMPONENT: &str = "map";
        let (mut map, config): (Box<dyn Map>, MapConfig) = match source.type_name() {
            single_backend::TYPE_NAME => (
                Box::new(SingleBackendMap::new(communicator.clone())) as Box<dyn Map>,
                MapConfig::SingleBackend(typed(COMPONENT, source)?),
            ),
            hybrid::TYPE_NAME => (
                Box::new(HybridMap::new(communicator.clone())) as Box<dyn Map>,
                MapConfig::Hybrid(typed(COMPONENT, source)?),
            ),
            other => return Err(unknown(COMPONENT, other)),
        };
        map.setup_from_config(config)
            .map_err(|e| setup_failed(COMPONENT, e))?;
        info!(component = COMPONENT, type_name = map.name(), "component created");
        Ok(Arc::from(map))
    }

    /// # Errors
    ///
    /// [`FactoryError::UnknownType`] or [`FactoryError::InvalidConfig`].
    pub fn create_local_planner(
        &self,
        source: &ConfigSource,
        communicator: &Communicator,
        map: Arc<dyn Map>,
    ) -> Result<Box<dyn LocalPlanner>, FactoryError> {
        const COMPONENT: &str = "local planner";
        match source.type_name() {
            local_planner::TYPE_NAME => {
                let planner = SamplingPlanner::new(
                    typed(COMPONENT, source)?,
                    communicator.clone(),
                    map,
                )
                .map_err(|e| invalid(COMPONENT, e))?;
                info!(component = COMPONENT, type_name = planner.name(), "component created");
                Ok(Box::new(planner))
            }
            other => Err(unknown(COMPONENT, other)),
        }
    }

    /// Visualizer matching the local planner named by `source`, configured
    /// from its `visualization` subsection.  Never fails: an unknown type or
    /// a malformed subsection yields a [`DefaultVisualizer`].
    pub fn create_local_planner_visualizer(
        &self,
        source: &ConfigSource,
        communicator: &Communicator,
    ) -> Arc<dyn LocalPlannerVisualizer> {
        let type_name = source.type_name();
        match type_name {
            local_planner::TYPE_NAME => match source.section("visualization").typed() {
                Ok(config) => Arc::new(SamplingPlannerVisualizer::new(
                    config,
                    communicator.clone(),
                )),
                Err(e) => {
                    warn!(error = %e, "invalid visualizer config; using default visualizer");
                    Arc::new(DefaultVisualizer::new(communicator.clone()))
                }
            },
            other => {
                warn!(
                    type_name = other,
                    "no visualizer for local planner type; using default visualizer"
                );
                Arc::new(DefaultVisualizer::new(communicator.clone()))
            }
        }
    }

    /// # Errors
    ///
    /// [`FactoryError::UnknownType`] or [`FactoryError::InvalidConfig`] for
    /// missing or inverted bounds.
    pub fn create_region_of_interest(
        &self,
        source: &ConfigSource,
    ) -> Result<Arc<dyn RegionOfInterest>, FactoryError> {
        const COMPONENT: &str = "region of interest";
        match source.type_name() {
            BOUNDING_BOX => {
                let config: BoundingBoxConfig = typed(COMPONENT, source)?;
                let roi = BoundingBox::new(config).map_err(|e| invalid(COMPONENT, e))?;
                info!(component = COMPONENT, type_name = BOUNDING_BOX, "component created");
                Ok(Arc::new(roi))
            }
            other => Err(unknown(COMPONENT, other)),
        }
    }

    /// Build the global planner and run its second construction phase.
    ///
    /// # Errors
    ///
    /// [`FactoryError::UnknownType`], [`FactoryError::InvalidConfig`], or
    /// [`FactoryError::Setup`] when `setup_from_config` rejects the section.
    pub fn create_global_planner(
        &self,
        source: &ConfigSource,
        communicator: &Communicator,
        map: Arc<dyn Map>,
    ) -> Result<Box<dyn GlobalPlanner>, FactoryError> {
        const COMPONENT: &str = "global planner";
        match source.type_name() {
            global_planner::TYPE_NAME => {
                let config = typed(COMPONENT, source)?;
                let mut planner = SkeletonPlanner::new(communicator.clone(), map);
                planner
                    .setup_from_config(&config)
                    .map_err(|e| setup_failed(COMPONENT, e))?;
                info!(component = COMPONENT, type_name = planner.name(), "component created");
                Ok(Box::new(planner))
            }
            other => Err(unknown(COMPONENT, other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn typed<T: serde::de::DeserializeOwned>(
    component: &'static str,
    source: &ConfigSource,
) -> Result<T, FactoryError> {
    source.typed().map_err(|e| invalid(component, e))
}

fn unknown(component: &'static str, type_name: &str) -> FactoryError {
    if type_name == TYPE_NOT_SET {
        error!(component, "component section has no type");
    } else {
        error!(component, type_name, "unknown component type");
    }
    FactoryError::UnknownType {
        component,
        type_name: type_name.to_string(),
    }
}

fn invalid(component: &'static str, e: impl std::fmt::Display) -> FactoryError {
    error!(component, error = %e, "invalid component config");
    FactoryError::InvalidConfig {
        component,
        message: e.to_string(),
    }
}

fn setup_failed(component: &'static str, e: impl std::fmt::Display) -> FactoryError {
    error!(component, error = %e, "component setup failed");
    FactoryError::Setup {
        component,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use glocal_mapping::{BackendHub, EsdfLayer, EsdfServer, SubmapServer};
    use glocal_state::StateMachine;

    const CONFIG: &str = r#"
[map]
type = "hybrid"
clearing_radius = 0.6

[local_planner]
type = "sampling-based"
num_samples = 10

[local_planner.visualization]
log_candidates = true

[global_planner]
type = "skeleton"
search_radius = 3.0

[region_of_interest]
type = "bounding-box"
x_min = -5.0
x_max = 5.0
y_min = -5.0
y_max = 5.0
z_min = -1.0
z_max = 1.0
"#;

    fn communicator() -> Communicator {
        let cfg = RuntimeConfig::parse(CONFIG).unwrap();
        let roi = ComponentFactory
            .create_region_of_interest(&cfg.source("region_of_interest"))
            .unwrap();
        let mut hub = BackendHub::new();
        hub.register_distance_field(
            "local",
            Arc::new(EsdfServer::new(EsdfLayer::new(0.2, 8).unwrap())),
        );
        hub.register_submap_collection("global", Arc::new(SubmapServer::new()));
        Communicator::new(Arc::new(StateMachine::new(roi)), Arc::new(hub))
    }

    fn source(raw: &str, namespace: &str) -> ConfigSource {
        RuntimeConfig::parse(raw).unwrap().source(namespace)
    }

    // ------------------------------------------------------------------ map

    #[test]
    fn creates_ready_hybrid_map() {
        let cfg = RuntimeConfig::parse(CONFIG).unwrap();
        let map = ComponentFactory
            .create_map(&cfg.source("map"), &communicator())
            .unwrap();
        assert_eq!(map.name(), "hybrid");
        assert_eq!(map.voxel_size().unwrap(), 0.2);
    }

    #[test]
    fn creates_single_backend_map() {
        let map = ComponentFactory
            .create_map(&source("[map]\ntype = \"single-backend\"\n", "map"), &communicator())
            .unwrap();
        assert_eq!(map.name(), "single-backend");
    }

    #[test]
    fn unknown_map_type_is_absent() {
        let err = ComponentFactory
            .create_map(&source("[map]\ntype = \"octomap\"\n", "map"), &communicator())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            FactoryError::UnknownType { component: "map", ref type_name } if type_name == "octomap"
        ));
    }

    #[test]
    fn missing_map_type_uses_sentinel() {
        let err = ComponentFactory
            .create_map(&ConfigSource::empty("map"), &communicator())
            .err()
            .unwrap();
        match err {
            FactoryError::UnknownType { type_name, .. } => assert_eq!(type_name, TYPE_NOT_SET),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unregistered_backend_is_setup_error() {
        let raw = "[map]\ntype = \"hybrid\"\nlocal_service = \"elsewhere\"\n";
        let err = ComponentFactory
            .create_map(&source(raw, "map"), &communicator())
            .err()
            .unwrap();
        assert!(matches!(err, FactoryError::Setup { component: "map", .. }));
    }

    #[test]
    fn malformed_map_section_is_invalid_config() {
        let raw = "[map]\ntype = \"hybrid\"\nclearing_radius = \"wide\"\n";
        let err = ComponentFactory
            .create_map(&source(raw, "map"), &communicator())
            .err()
            .unwrap();
        assert!(matches!(err, FactoryError::InvalidConfig { .. }));
    }

    // ------------------------------------------------------------------ planners

    #[test]
    fn creates_planners_from_sections() {
        let cfg = RuntimeConfig::parse(CONFIG).unwrap();
        let comm = communicator();
        let map = ComponentFactory.create_map(&cfg.source("map"), &comm).unwrap();
        let local = ComponentFactory
            .create_local_planner(&cfg.source("local_planner"), &comm, map.clone())
            .unwrap();
        let global = ComponentFactory
            .create_global_planner(&cfg.source("global_planner"), &comm, map)
            .unwrap();
        assert_eq!(local.name(), "sampling-based");
        assert_eq!(global.name(), "skeleton");
    }

    #[test]
    fn unknown_planner_types_are_absent() {
        let comm = communicator();
        let cfg = RuntimeConfig::parse(CONFIG).unwrap();
        let map = ComponentFactory.create_map(&cfg.source("map"), &comm).unwrap();
        let raw = "[p]\ntype = \"rrt\"\n";
        assert!(
            ComponentFactory
                .create_local_planner(&source(raw, "p"), &comm, map.clone())
                .is_err()
        );
        assert!(
            ComponentFactory
                .create_global_planner(&source(raw, "p"), &comm, map)
                .is_err()
        );
    }

    #[test]
    fn global_planner_setup_failure_is_surfaced() {
        let comm = communicator();
        let cfg = RuntimeConfig::parse(CONFIG).unwrap();
        let map = ComponentFactory.create_map(&cfg.source("map"), &comm).unwrap();
        let raw = "[g]\ntype = \"skeleton\"\nsearch_radius = 1.0\nmin_goal_distance = 2.0\n";
        let err = ComponentFactory
            .create_global_planner(&source(raw, "g"), &comm, map)
            .err()
            .unwrap();
        assert!(matches!(err, FactoryError::Setup { component: "global planner", .. }));
    }

    #[test]
    fn invalid_local_planner_config_is_rejected() {
        let comm = communicator();
        let cfg = RuntimeConfig::parse(CONFIG).unwrap();
        let map = ComponentFactory.create_map(&cfg.source("map"), &comm).unwrap();
        let raw = "[l]\ntype = \"sampling-based\"\nnum_samples = 0\n";
        let err = ComponentFactory
            .create_local_planner(&source(raw, "l"), &comm, map)
            .err()
            .unwrap();
        assert_eq!(err.component(), "local planner");
    }

    // ------------------------------------------------------------------ visualizer

    #[test]
    fn sampling_visualizer_for_sampling_planner() {
        let cfg = RuntimeConfig::parse(CONFIG).unwrap();
        let vis = ComponentFactory
            .create_local_planner_visualizer(&cfg.source("local_planner"), &communicator());
        assert_eq!(vis.name(), "sampling-based");
    }

    #[test]
    fn unknown_visualizer_falls_back_to_default() {
        let vis = ComponentFactory.create_local_planner_visualizer(
            &source("[l]\ntype = \"rrt\"\n", "l"),
            &communicator(),
        );
        assert_eq!(vis.name(), "default");
    }

    #[test]
    fn missing_visualizer_type_falls_back_to_default() {
        let vis = ComponentFactory
            .create_local_planner_visualizer(&ConfigSource::empty("l"), &communicator());
        assert_eq!(vis.name(), "default");
    }

    // ------------------------------------------------------------------ region of interest

    #[test]
    fn inverted_bounding_box_is_invalid() {
        let raw = "[r]\ntype = \"bounding-box\"\nx_min = 1.0\nx_max = -1.0\ny_min = 0.0\ny_max = 1.0\nz_min = 0.0\nz_max = 1.0\n";
        let err = ComponentFactory
            .create_region_of_interest(&source(raw, "r"))
            .err()
            .unwrap();
        assert!(matches!(err, FactoryError::InvalidConfig { .. }));
    }

    #[test]
    fn bounding_box_with_missing_bound_is_invalid() {
        let raw = "[r]\ntype = \"bounding-box\"\nx_min = 1.0\n";
        assert!(
            ComponentFactory
                .create_region_of_interest(&source(raw, "r"))
                .is_err()
        );
    }

    #[test]
    fn unknown_roi_type_is_absent() {
        let err = ComponentFactory
            .create_region_of_interest(&source("[r]\ntype = \"sphere\"\n", "r"))
            .err()
            .unwrap();
        assert_eq!(err.component(), "region of interest");
    }
}
