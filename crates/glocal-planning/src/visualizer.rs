//! Local planner visualisation hooks.
//!
//! Rendering is somebody else's job; a visualizer here turns each
//! [`LocalPlanResult`] into a structured `tracing` event that a log
//! collector or bridge can pick up.  [`DefaultVisualizer`] does nothing and
//! is what the factory hands out when no visualizer matches.

use std::sync::atomic::{AtomicU64, Ordering};

use glocal_mapping::Communicator;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::local_planner::LocalPlanResult;

pub trait LocalPlannerVisualizer: Send + Sync {
    fn name(&self) -> &str;

    /// Publish one planning result.  The default implementation discards it.
    fn visualize(&self, _result: &LocalPlanResult) {}
}

/// No-op visualizer bound to a context.
#[derive(Debug, Clone)]
pub struct DefaultVisualizer {
    communicator: Communicator,
}

impl DefaultVisualizer {
    pub fn new(communicator: Communicator) -> Self {
        Self { communicator }
    }

    pub fn communicator(&self) -> &Communicator {
        &self.communicator
    }
}

impl LocalPlannerVisualizer for DefaultVisualizer {
    fn name(&self) -> &str {
        "default"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingVisualizerConfig {
    /// Include the candidate list in the emitted event.
    pub log_candidates: bool,
    /// Cap on candidates included when `log_candidates` is set.
    pub max_candidates: usize,
}

impl Default for SamplingVisualizerConfig {
    fn default() -> Self {
        Self {
            log_candidates: false,
            max_candidates: 20,
        }
    }
}

/// Emits every sampling result as an `info` event; candidate lists go to
/// `debug` when enabled.
pub struct SamplingPlannerVisualizer {
    config: SamplingVisualizerConfig,
    communicator: Communicator,
    published: AtomicU64,
}

impl SamplingPlannerVisualizer {
    pub fn new(config: SamplingVisualizerConfig, communicator: Communicator) -> Self {
        Self {
            config,
            communicator,
            published: AtomicU64::new(0),
        }
    }

    /// Number of results published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Structured payload for `result`, as it appears in the log event.
    pub fn render(&self, result: &LocalPlanResult) -> Value {
        let mut payload = json!({
            "origin": [result.origin.x, result.origin.y, result.origin.z],
            "candidates": result.candidates.len(),
            "rejected": result.rejected,
            "goal": result.goal.map(|g| json!({
                "position": [g.position.x, g.position.y, g.position.z],
                "gain": g.gain,
            })),
        });
        if self.config.log_candidates {
            let listed: Vec<Value> = result
                .candidates
                .iter()
                .take(self.config.max_candidates)
                .map(|c| json!([c.position.x, c.position.y, c.position.z, c.gain]))
                .collect();
            payload["candidate_list"] = Value::Array(listed);
        }
        payload
    }
}

impl LocalPlannerVisualizer for SamplingPlannerVisualizer {
    fn name(&self) -> &str {
        crate::local_planner::TYPE_NAME
    }

    fn visualize(&self, result: &LocalPlanResult) {
        let seq = self.published.fetch_add(1, Ordering::Relaxed) + 1;
        let phase = self.communicator.state_machine().phase();
        info!(
            seq,
            %phase,
            candidates = result.candidates.len(),
            rejected = result.rejected,
            goal_gain = result.goal.map(|g| g.gain),
            "local plan"
        );
        if self.config.log_candidates {
            debug!(seq, payload = %self.render(result), "local plan candidates");
        }
    }
}
