// Worker configuration
// Decision: Environment variables only (optionally seeded from .env by main)

use std::env;

use kubedeploy_activities::kubectl::DEFAULT_KUBECTL;

/// Default Temporal server address
pub const DEFAULT_TEMPORAL_HOST: &str = "localhost:7233";

/// Default Temporal namespace
pub const DEFAULT_TEMPORAL_NAMESPACE: &str = "default";

/// Task queue the worker polls unless overridden
pub const TASK_QUEUE: &str = "cicd-task-queue-python";

/// Default bound on concurrently executing activities
pub const DEFAULT_MAX_CONCURRENT_ACTIVITIES: usize = 10;

/// Configuration for the activity worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Temporal server address (host:port)
    pub temporal_host: String,
    /// Temporal namespace
    pub temporal_namespace: String,
    /// Task queue to poll
    pub task_queue: String,
    /// Fixed Kubernetes namespace for every activity, if set
    pub k8s_namespace: Option<String>,
    /// kubectl binary
    pub kubectl_path: String,
    /// Maximum activities executing at once
    pub max_concurrent_activities: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            temporal_host: DEFAULT_TEMPORAL_HOST.to_string(),
            temporal_namespace: DEFAULT_TEMPORAL_NAMESPACE.to_string(),
            task_queue: TASK_QUEUE.to_string(),
            k8s_namespace: None,
            kubectl_path: DEFAULT_KUBECTL.to_string(),
            max_concurrent_activities: DEFAULT_MAX_CONCURRENT_ACTIVITIES,
        }
    }
}

impl WorkerConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `TEMPORAL_HOST`: server address (default: "localhost:7233")
    /// - `TEMPORAL_NAMESPACE`: Temporal namespace (default: "default")
    /// - `TEMPORAL_TASK_QUEUE`: task queue (default: "cicd-task-queue-python")
    /// - `K8S_NAMESPACE`: fixed Kubernetes namespace override
    /// - `KUBECTL_PATH`: kubectl binary (default: "kubectl")
    /// - `MAX_CONCURRENT_ACTIVITIES`: concurrency bound (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            temporal_host: get("TEMPORAL_HOST").unwrap_or(defaults.temporal_host),
            temporal_namespace: get("TEMPORAL_NAMESPACE").unwrap_or(defaults.temporal_namespace),
            task_queue: get("TEMPORAL_TASK_QUEUE").unwrap_or(defaults.task_queue),
            k8s_namespace: get("K8S_NAMESPACE"),
            kubectl_path: get("KUBECTL_PATH").unwrap_or(defaults.kubectl_path),
            max_concurrent_activities: get("MAX_CONCURRENT_ACTIVITIES")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_activities),
        }
    }

    /// Server URL in the form the Temporal gateway expects
    pub fn temporal_url(&self) -> String {
        if self.temporal_host.contains("://") {
            self.temporal_host.clone()
        } else {
            format!("http://{}", self.temporal_host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[]));

        assert_eq!(config.temporal_host, "localhost:7233");
        assert_eq!(config.temporal_namespace, "default");
        assert_eq!(config.task_queue, TASK_QUEUE);
        assert_eq!(config.k8s_namespace, None);
        assert_eq!(config.kubectl_path, "kubectl");
        assert_eq!(config.max_concurrent_activities, 10);
        assert_eq!(config.temporal_url(), "http://localhost:7233");
    }

    #[test]
    fn test_overrides() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("TEMPORAL_HOST", "temporal.internal:7233"),
            ("TEMPORAL_TASK_QUEUE", "deploys"),
            ("K8S_NAMESPACE", "team-a"),
            ("KUBECTL_PATH", "/usr/local/bin/kubectl"),
            ("MAX_CONCURRENT_ACTIVITIES", "4"),
        ]));

        assert_eq!(config.temporal_url(), "http://temporal.internal:7233");
        assert_eq!(config.task_queue, "deploys");
        assert_eq!(config.k8s_namespace.as_deref(), Some("team-a"));
        assert_eq!(config.kubectl_path, "/usr/local/bin/kubectl");
        assert_eq!(config.max_concurrent_activities, 4);
    }

    #[test]
    fn test_empty_and_invalid_values_fall_back() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("K8S_NAMESPACE", "  "),
            ("MAX_CONCURRENT_ACTIVITIES", "0"),
            ("TEMPORAL_HOST", "https://cloud.example:7233"),
        ]));

        assert_eq!(config.k8s_namespace, None);
        assert_eq!(config.max_concurrent_activities, 10);
        assert_eq!(config.temporal_url(), "https://cloud.example:7233");
    }
}
