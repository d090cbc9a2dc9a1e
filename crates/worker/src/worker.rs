// Temporal activity worker
// Decision: Use the temporal-sdk-core's Core trait for polling and completion
// Decision: One tokio task per activity, bounded by a semaphore
//
// This worker:
// 1. Polls the task queue for activity tasks
// 2. Dispatches each task to the Kubernetes activity set
// 3. Forwards activity heartbeats to Temporal
// 4. Handles graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use kubedeploy_activities::{activity_names, ActivityContext, KubernetesActivities};
use temporal_sdk_core::protos::coresdk::{
    activity_result::{self, ActivityResult},
    activity_task::{activity_task, ActivityTask},
    common::{Payload, UserCodeFailure},
    ActivityTaskCompletion,
};
use temporal_sdk_core::PollActivityError;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

use crate::activities::{build_activities, execute_activity};
use crate::client::TemporalWorkerCore;
use crate::config::WorkerConfig;

/// Temporal worker that executes the Kubernetes activities
pub struct ActivityWorker {
    core: Arc<TemporalWorkerCore>,
    activities: Arc<KubernetesActivities>,
    config: WorkerConfig,
    /// Permits for concurrently executing activities
    limiter: Arc<Semaphore>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ActivityWorker {
    /// Connect to Temporal and build the activity set from `config`
    pub async fn connect(config: WorkerConfig) -> Result<Self> {
        let core = TemporalWorkerCore::connect(&config)
            .await
            .context("Failed to create Temporal worker core")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            core: Arc::new(core),
            activities: Arc::new(build_activities(&config)),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_activities)),
            config,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Run the worker, processing tasks until shutdown
    pub async fn run(&self) -> Result<()> {
        info!(
            task_queue = %self.config.task_queue,
            activities = %activity_names::ALL.join(", "),
            max_concurrent = self.config.max_concurrent_activities,
            "Starting activity worker"
        );

        let mut shutdown_rx = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Activity poller shutting down");
                    break;
                }
                result = self.poll_and_dispatch() => {
                    if let Err(e) = result {
                        match e.downcast_ref::<PollActivityError>() {
                            Some(PollActivityError::ShutDown) => {
                                info!("Activity poller received shutdown");
                                break;
                            }
                            _ => {
                                error!(error = %e, "Activity task processing error");
                                // Brief pause before retry
                                tokio::time::sleep(Duration::from_secs(1)).await;
                            }
                        }
                    }
                }
            }
        }

        // Let in-flight activities finish before the core goes away
        let _drained = self
            .limiter
            .acquire_many(self.config.max_concurrent_activities as u32)
            .await;

        self.core.shutdown().await;
        info!("Activity worker stopped");
        Ok(())
    }

    /// Signal the worker to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for a free slot, poll one activity task and spawn its execution
    async fn poll_and_dispatch(&self) -> Result<()> {
        let permit = self
            .limiter
            .clone()
            .acquire_owned()
            .await
            .context("Activity limiter closed")?;

        let task = self.core.core().poll_activity_task().await?;

        // Check for empty task token (invalid task)
        if task.task_token.is_empty() {
            warn!("Received activity task with empty task token, skipping");
            return Ok(());
        }

        debug!(
            activity_id = %task.activity_id,
            variant = ?task.variant.as_ref().map(|v| match v {
                activity_task::Variant::Start(s) => format!("Start({})", s.activity_type),
                activity_task::Variant::Cancel(_) => "Cancel".to_string(),
            }),
            "Received activity task"
        );

        let core = self.core.clone();
        let activities = self.activities.clone();
        tokio::spawn(async move {
            let task_token = task.task_token.clone();
            let result = process_activity(&core, &activities, task).await;

            let completion = ActivityTaskCompletion {
                task_token,
                result: Some(result),
            };
            if let Err(e) = core.core().complete_activity_task(completion).await {
                error!(error = %e, "Failed to complete activity task");
            }
            drop(permit);
        });

        Ok(())
    }
}

/// Process an activity task and return the result
async fn process_activity(
    core: &Arc<TemporalWorkerCore>,
    activities: &KubernetesActivities,
    task: ActivityTask,
) -> ActivityResult {
    match task.variant {
        Some(activity_task::Variant::Start(start)) => {
            info!(
                activity_id = %task.activity_id,
                activity_type = %start.activity_type,
                workflow_type = %start.workflow_type,
                "Executing activity"
            );

            let heartbeat_core = core.clone();
            let heartbeat_token = task.task_token.clone();
            let ctx = ActivityContext::new(
                task.activity_id.clone(),
                u32::try_from(start.attempt).unwrap_or(1),
            )
            .with_heartbeat(move |details| {
                heartbeat_core.record_heartbeat(heartbeat_token.clone(), details)
            });

            let input_data = start
                .input
                .first()
                .map(|p| p.data.clone())
                .unwrap_or_default();

            match execute_activity(activities, &ctx, &start.activity_type, &input_data).await {
                Ok(output) => ActivityResult::ok(Payload {
                    data: serde_json::to_vec(&output).unwrap_or_default(),
                    metadata: Default::default(),
                }),
                Err(e) => {
                    let error_chain: Vec<String> = e.chain().map(|err| err.to_string()).collect();
                    error!(
                        error = %e,
                        error_chain = ?error_chain,
                        activity_type = %start.activity_type,
                        "Activity failed"
                    );
                    // Full chain is what shows up in the Temporal UI
                    failure(format!("{e:#}"))
                }
            }
        }
        Some(activity_task::Variant::Cancel(_)) => {
            warn!(activity_id = %task.activity_id, "Activity cancellation requested");
            ActivityResult {
                status: Some(activity_result::activity_result::Status::Canceled(
                    activity_result::Cancelation { details: None },
                )),
            }
        }
        None => {
            error!("Activity task has no variant");
            failure("Activity task has no variant".to_string())
        }
    }
}

fn failure(message: String) -> ActivityResult {
    ActivityResult {
        status: Some(activity_result::activity_result::Status::Failed(
            activity_result::Failure {
                failure: Some(UserCodeFailure {
                    message,
                    ..Default::default()
                }),
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_message() {
        let result = failure("Failed to update deployment: Unauthorized".to_string());

        match result.status {
            Some(activity_result::activity_result::Status::Failed(f)) => {
                assert_eq!(
                    f.failure.map(|f| f.message).as_deref(),
                    Some("Failed to update deployment: Unauthorized")
                );
            }
            other => panic!("expected failure status, got {other:?}"),
        }
    }
}
