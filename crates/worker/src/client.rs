// Temporal core wrapper
// Decision: Wrap the temporal-sdk-core APIs behind a small interface for the worker
//
// Connection failures are returned to the caller; there is no reconnect loop.

use std::time::Duration;

use anyhow::{Context, Result};
use temporal_sdk_core::protos::coresdk::{common::Payload, ActivityHeartbeat};
use temporal_sdk_core::{Core, CoreInitOptions, ServerGatewayOptions, Url};
use tracing::info;

use crate::config::WorkerConfig;

/// Worker-side Temporal core for polling and completing activity tasks
pub struct TemporalWorkerCore {
    core: Box<dyn Core>,
}

impl TemporalWorkerCore {
    /// Connect to the Temporal server and initialize the core
    pub async fn connect(config: &WorkerConfig) -> Result<Self> {
        let target_url = Url::parse(&config.temporal_url()).context("Invalid Temporal address")?;

        let gateway_opts = ServerGatewayOptions {
            target_url,
            namespace: config.temporal_namespace.clone(),
            task_queue: config.task_queue.clone(),
            identity: format!("kubedeploy-worker-{}", uuid::Uuid::now_v7()),
            worker_binary_id: env!("CARGO_PKG_VERSION").to_string(),
            long_poll_timeout: Duration::from_secs(60),
        };

        info!(
            address = %config.temporal_host,
            namespace = %config.temporal_namespace,
            task_queue = %config.task_queue,
            "Connecting to Temporal server"
        );

        let init_opts = CoreInitOptions {
            gateway_opts,
            evict_after_pending_cleared: true,
            max_outstanding_workflow_tasks: 1,
            max_outstanding_activities: config.max_concurrent_activities,
        };

        let core = temporal_sdk_core::init(init_opts)
            .await
            .context("Failed to connect to Temporal server")?;

        info!("Temporal worker core initialized");

        Ok(Self {
            core: Box::new(core),
        })
    }

    /// Get a reference to the core for polling
    pub fn core(&self) -> &dyn Core {
        self.core.as_ref()
    }

    /// Forward an activity heartbeat for the task identified by `task_token`
    pub fn record_heartbeat(&self, task_token: Vec<u8>, details: &str) {
        let payload = Payload {
            data: serde_json::to_vec(details).unwrap_or_default(),
            metadata: Default::default(),
        };
        let _ = self.core.record_activity_heartbeat(ActivityHeartbeat {
            task_token,
            details: vec![payload],
        });
    }

    /// Shutdown the worker gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down Temporal worker core");
        self.core.shutdown().await;
    }
}
