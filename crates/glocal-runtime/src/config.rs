//! Configuration – one TOML file, one [`ConfigSource`] per component.
//!
//! ```toml
//! [map]
//! type = "hybrid"
//! traversability_radius = 0.3
//! clearing_radius = 0.5
//!
//! [local_planner]
//! type = "sampling-based"
//! num_samples = 40
//!
//! [local_planner.visualization]
//! log_candidates = true
//!
//! [global_planner]
//! type = "skeleton"
//!
//! [region_of_interest]
//! type = "bounding-box"
//! x_min = -10.0
//! # ...
//!
//! [exploration]
//! max_iterations = 200
//! ```
//!
//! Each section becomes a [`ConfigSource`]: its `type` string selects the
//! implementation and the remaining keys are deserialized into that
//! implementation's typed config.
//!
//! # Example
//!
//! ```rust
//! use glocal_runtime::config::{RuntimeConfig, TYPE_NOT_SET};
//!
//! let cfg = RuntimeConfig::parse("[map]\ntype = \"hybrid\"\n").unwrap();
//! assert_eq!(cfg.source("map").type_name(), "hybrid");
//! assert_eq!(cfg.source("global_planner").type_name(), TYPE_NOT_SET);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type name reported for a section without a `type` key.  Never matches a
/// real implementation, so the factory rejects it like any unknown type.
pub const TYPE_NOT_SET: &str = "type param is not set";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid [{namespace}] section: {message}")]
    InvalidSection { namespace: String, message: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// ConfigSource
// ─────────────────────────────────────────────────────────────────────────────

/// A named configuration section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigSource {
    namespace: String,
    table: toml::Table,
}

impl ConfigSource {
    pub fn new(namespace: impl Into<String>, table: toml::Table) -> Self {
        Self {
            namespace: namespace.into(),
            table,
        }
    }

    /// An empty section; every typed config falls back to its defaults and
    /// [`type_name`](Self::type_name) reports [`TYPE_NOT_SET`].
    pub fn empty(namespace: impl Into<String>) -> Self {
        Self::new(namespace, toml::Table::new())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The `type` key, or [`TYPE_NOT_SET`] when it is missing or not a string.
    pub fn type_name(&self) -> &str {
        self.table
            .get("type")
            .and_then(toml::Value::as_str)
            .unwrap_or(TYPE_NOT_SET)
    }

    /// Deserialize the section into `T`.  Keys `T` does not know (including
    /// `type` and nested sections) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSection`] when a known key has the wrong
    /// shape or a required key is missing.
    pub fn typed<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        toml::Value::Table(self.table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::InvalidSection {
                namespace: self.namespace.clone(),
                message: e.to_string(),
            })
    }

    /// Nested section `name`, e.g. `local_planner.visualization`.  Missing
    /// or non-table entries yield an empty section.
    pub fn section(&self, name: &str) -> ConfigSource {
        let table = self
            .table
            .get(name)
            .and_then(toml::Value::as_table)
            .cloned()
            .unwrap_or_default();
        ConfigSource::new(format!("{}.{}", self.namespace, name), table)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exploration loop settings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Planning cycles before the mission is stopped.
    pub max_iterations: usize,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
        }
    }
}

/// Apply `GLOCAL_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `GLOCAL_MAX_ITERATIONS` | `max_iterations` |
pub fn apply_env_overrides(cfg: &mut ExplorationConfig) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`] with an explicit lookup.
/// Unparseable values are ignored.
pub(crate) fn apply_overrides_from<F>(cfg: &mut ExplorationConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("GLOCAL_MAX_ITERATIONS")
        && let Ok(n) = v.trim().parse::<usize>()
    {
        cfg.max_iterations = n;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RuntimeConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuntimeConfig {
    root: toml::Table,
}

impl RuntimeConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let root: toml::Table = toml::from_str(raw)?;
        Ok(Self { root })
    }

    /// Read and parse the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Top-level section `namespace`; empty when absent.
    pub fn source(&self, namespace: &str) -> ConfigSource {
        let table = self
            .root
            .get(namespace)
            .and_then(toml::Value::as_table)
            .cloned()
            .unwrap_or_default();
        ConfigSource::new(namespace, table)
    }

    /// `[exploration]` with environment overrides applied.
    pub fn exploration(&self) -> Result<ExplorationConfig, ConfigError> {
        let mut cfg: ExplorationConfig = self.source("exploration").typed()?;
        apply_env_overrides(&mut cfg);
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[map]
type = "single-backend"
traversability_radius = 0.4

[local_planner]
type = "sampling-based"
num_samples = 12

[local_planner.visualization]
log_candidates = true

[exploration]
max_iterations = 7
"#;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Radii {
        #[serde(default)]
        traversability_radius: f64,
        #[serde(default)]
        clearing_radius: f64,
    }

    // ------------------------------------------------------------------ ConfigSource

    #[test]
    fn type_name_reads_type_key() {
        let cfg = RuntimeConfig::parse(SAMPLE).unwrap();
        assert_eq!(cfg.source("map").type_name(), "single-backend");
        assert_eq!(cfg.source("local_planner").type_name(), "sampling-based");
    }

    #[test]
    fn missing_type_reports_sentinel() {
        let cfg = RuntimeConfig::parse("[map]\nclearing_radius = 1.0\n").unwrap();
        assert_eq!(cfg.source("map").type_name(), TYPE_NOT_SET);
        assert_eq!(cfg.source("absent").type_name(), TYPE_NOT_SET);
    }

    #[test]
    fn non_string_type_reports_sentinel() {
        let cfg = RuntimeConfig::parse("[map]\ntype = 3\n").unwrap();
        assert_eq!(cfg.source("map").type_name(), TYPE_NOT_SET);
    }

    #[test]
    fn typed_ignores_type_and_applies_defaults() {
        let cfg = RuntimeConfig::parse(SAMPLE).unwrap();
        let radii: Radii = cfg.source("map").typed().unwrap();
        assert_eq!(
            radii,
            Radii {
                traversability_radius: 0.4,
                clearing_radius: 0.0
            }
        );
    }

    #[test]
    fn typed_reports_namespace_on_shape_error() {
        let cfg = RuntimeConfig::parse("[map]\ntraversability_radius = \"far\"\n").unwrap();
        let err = cfg.source("map").typed::<Radii>().unwrap_err();
        match err {
            ConfigError::InvalidSection { namespace, .. } => assert_eq!(namespace, "map"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_section_is_namespaced() {
        let cfg = RuntimeConfig::parse(SAMPLE).unwrap();
        let vis = cfg.source("local_planner").section("visualization");
        assert_eq!(vis.namespace(), "local_planner.visualization");
        let absent = cfg.source("map").section("visualization");
        assert_eq!(absent, ConfigSource::empty("map.visualization"));
    }

    // ------------------------------------------------------------------ RuntimeConfig

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            RuntimeConfig::parse("[map\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let cfg = RuntimeConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.source("map").type_name(), "single-backend");
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuntimeConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    // ------------------------------------------------------------------ overrides

    #[test]
    fn override_replaces_max_iterations() {
        let mut cfg = ExplorationConfig::default();
        apply_overrides_from(&mut cfg, |key| {
            (key == "GLOCAL_MAX_ITERATIONS").then(|| "15".to_string())
        });
        assert_eq!(cfg.max_iterations, 15);
    }

    #[test]
    fn unparseable_override_is_ignored() {
        let mut cfg = ExplorationConfig { max_iterations: 3 };
        apply_overrides_from(&mut cfg, |_| Some("many".to_string()));
        assert_eq!(cfg.max_iterations, 3);
    }

    #[test]
    fn exploration_section_is_parsed() {
        let cfg = RuntimeConfig::parse(SAMPLE).unwrap();
        let mut exploration: ExplorationConfig = cfg.source("exploration").typed().unwrap();
        apply_overrides_from(&mut exploration, |_| None);
        assert_eq!(exploration.max_iterations, 7);
    }
}
