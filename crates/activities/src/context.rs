//! Activity execution context

use std::fmt;

/// Context handed to an activity for the duration of one attempt
///
/// The hosting worker installs a heartbeat function that forwards progress
/// details to the orchestration server. Without one, heartbeats are dropped,
/// which is what tests and local runs want.
pub struct ActivityContext {
    /// Activity ID assigned by the orchestrator
    pub activity_id: String,

    /// Current attempt number (1-based)
    pub attempt: u32,

    /// Function to report heartbeat progress
    heartbeat_fn: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl ActivityContext {
    pub fn new(activity_id: impl Into<String>, attempt: u32) -> Self {
        Self {
            activity_id: activity_id.into(),
            attempt,
            heartbeat_fn: None,
        }
    }

    /// Set the heartbeat function
    pub fn with_heartbeat<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.heartbeat_fn = Some(Box::new(f));
        self
    }

    /// Report progress (heartbeat)
    pub fn heartbeat(&self, details: &str) {
        tracing::debug!(activity_id = %self.activity_id, details, "Heartbeat");
        if let Some(f) = &self.heartbeat_fn {
            f(details);
        }
    }
}

impl Default for ActivityContext {
    fn default() -> Self {
        Self::new("local", 1)
    }
}

impl fmt::Debug for ActivityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityContext")
            .field("activity_id", &self.activity_id)
            .field("attempt", &self.attempt)
            .field("heartbeat", &self.heartbeat_fn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_heartbeat_forwards_details() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ctx = ActivityContext::new("act-1", 2)
            .with_heartbeat(move |d| sink.lock().unwrap().push(d.to_string()));

        ctx.heartbeat("Deployment updated");
        ctx.heartbeat("Rollout completed");

        assert_eq!(ctx.attempt, 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["Deployment updated", "Rollout completed"]
        );
    }

    #[test]
    fn test_heartbeat_without_sink_is_noop() {
        let ctx = ActivityContext::default();
        ctx.heartbeat("ignored");
        assert_eq!(ctx.activity_id, "local");
    }
}
