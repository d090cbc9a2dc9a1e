// Logging setup
// Decision: tracing-subscriber fmt output filtered by RUST_LOG, with LOG_LEVEL as a shorthand

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when neither RUST_LOG nor LOG_LEVEL is set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration for log output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Log filter (e.g., "info", "kubedeploy_activities=debug")
    pub log_filter: Option<String>,
    /// Include span and event targets in output
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "kubedeploy-worker".to_string(),
            log_filter: None,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `RUST_LOG`: full filter directive, takes precedence
    /// - `LOG_LEVEL`: a bare level applied to the worker and activity crates
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_filter = get("RUST_LOG").or_else(|| {
            get("LOG_LEVEL").map(|level| {
                let level = level.trim().to_lowercase();
                format!("{DEFAULT_LOG_FILTER},kubedeploy_worker={level},kubedeploy_activities={level}")
            })
        });

        Self {
            log_filter,
            ..Self::default()
        }
    }

    /// Filter directive that will actually be installed
    pub fn effective_filter(&self) -> EnvFilter {
        self.log_filter
            .as_ref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install the global subscriber. Call once, early in main.
pub fn init_telemetry(config: TelemetryConfig) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_filter(config.effective_filter());

    tracing_subscriber::registry().with(console_layer).init();

    tracing::debug!(
        service = %config.service_name,
        filter = ?config.log_filter,
        "Logging initialized"
    );
}
