//! [`BackendHub`] – named registry of map backend services.
//!
//! The startup sequence registers every running distance-field and submap
//! service under a name; maps resolve the names listed in their
//! configuration during `setup_from_config`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::distance_field::DistanceField;
use crate::map::MapError;
use crate::submap::SubmapCollection;

/// Registry of backend services, keyed by name.
///
/// Populate with the `register_*` methods before sharing it through a
/// [`Communicator`][crate::communicator::Communicator]; after that it is
/// read-only.
#[derive(Default)]
pub struct BackendHub {
    distance_fields: HashMap<String, Arc<dyn DistanceField>>,
    submap_collections: HashMap<String, Arc<dyn SubmapCollection>>,
}

impl BackendHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a distance-field service.  Any previously registered service
    /// with the same name is replaced.
    pub fn register_distance_field(
        &mut self,
        name: impl Into<String>,
        service: Arc<dyn DistanceField>,
    ) {
        self.distance_fields.insert(name.into(), service);
    }

    /// Register a submap collection.  Any previously registered collection
    /// with the same name is replaced.
    pub fn register_submap_collection(
        &mut self,
        name: impl Into<String>,
        service: Arc<dyn SubmapCollection>,
    ) {
        self.submap_collections.insert(name.into(), service);
    }

    /// Look up a distance-field service.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BackendUnavailable`] when nothing is registered
    /// under `name`.
    pub fn distance_field(&self, name: &str) -> Result<Arc<dyn DistanceField>, MapError> {
        self.distance_fields
            .get(name)
            .cloned()
            .ok_or_else(|| MapError::BackendUnavailable(format!("distance field '{name}'")))
    }

    /// Look up a submap collection.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BackendUnavailable`] when nothing is registered
    /// under `name`.
    pub fn submap_collection(&self, name: &str) -> Result<Arc<dyn SubmapCollection>, MapError> {
        self.submap_collections
            .get(name)
            .cloned()
            .ok_or_else(|| MapError::BackendUnavailable(format!("submap collection '{name}'")))
    }
}
