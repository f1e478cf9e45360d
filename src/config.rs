//! Pipeline configuration.
//!
//! Every tunable of the build pipeline lives in one explicit [`PipelineConfig`]
//! value handed to the components at construction time. There are no global
//! settings registries; tests construct whatever configuration they need.

use serde::{Deserialize, Serialize};

/// Tunables for the chunk-mesh build pipeline.
///
/// The defaults are sized for a desktop machine; `workers = 0` means "use the
/// available hardware parallelism, minus one core left for the render thread".
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of mesh-building worker threads. `0` selects automatically.
    pub workers: usize,
    /// Capacity of the scheduler → workers task channel.
    pub task_queue_capacity: usize,
    /// Capacity of the workers → render thread result channel.
    pub result_queue_capacity: usize,
    /// Maximum number of entries held in the priority queue before the oldest,
    /// least-urgent entries are evicted.
    pub scheduler_capacity: usize,
    /// Non-urgent builds started per scheduling pass. Urgent builds ignore it.
    pub max_builds_per_pass: usize,
    /// Non-urgent mesh uploads applied per frame. Urgent uploads ignore it.
    pub uploads_per_frame: usize,
    /// Radius (world units) inside which a visible region counts as urgent.
    pub close_radius: f32,
    /// Minimum dot product between the camera forward vector and the direction
    /// to a region center for the region to count as "in view direction".
    pub urgency_dot: f32,
    /// Deferrals a build tolerates while neighbor regions are missing before it
    /// is forced through with best-available data.
    pub defer_limit: u32,
    /// Whether coplanar faces may be merged into larger quads. Only honored
    /// when the texture atlas addressing supports per-tile wrap.
    pub greedy_merging: bool,
    /// Brightness emitted for stored light level 0; level 15 maps to 1.0.
    pub light_floor: f32,
    /// Maximum difference in stored light between faces merged into one quad.
    pub light_merge_tolerance: u8,
    /// Multiplier applied to the ambient scalar in the water pass.
    pub water_ambient_boost: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            task_queue_capacity: 256,
            result_queue_capacity: 256,
            scheduler_capacity: 2048,
            max_builds_per_pass: 16,
            uploads_per_frame: 8,
            close_radius: 48.0,
            urgency_dot: 0.35,
            defer_limit: 3,
            greedy_merging: true,
            light_floor: 0.12,
            light_merge_tolerance: 1,
            water_ambient_boost: 1.15,
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from a JSON document. Missing fields fall back
    /// to their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolves the worker-thread count, consulting the hardware parallelism
    /// when `workers` is 0. At least one worker is always created.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = PipelineConfig::default();
        assert!(config.worker_count() >= 1);
        assert!(config.task_queue_capacity > 0);
        assert!(config.light_floor > 0.0 && config.light_floor < 1.0);
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = PipelineConfig::from_json(r#"{ "workers": 2, "greedy_merging": false }"#)
            .expect("valid json");
        assert_eq!(config.workers, 2);
        assert_eq!(config.worker_count(), 2);
        assert!(!config.greedy_merging);
        assert_eq!(
            config.uploads_per_frame,
            PipelineConfig::default().uploads_per_frame
        );
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(PipelineConfig::from_json("not json").is_err());
    }
}
