use anyhow::{Context, Result};
use kubedeploy_activities::activity_names;
use kubedeploy_worker::{init_telemetry, ActivityWorker, TelemetryConfig, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // A local .env is optional
    dotenvy::dotenv().ok();

    // Configure via environment variables:
    // - RUST_LOG or LOG_LEVEL: Log filter (default: "info")
    init_telemetry(TelemetryConfig::from_env());

    tracing::info!("kubedeploy-worker starting...");

    let config = WorkerConfig::from_env();

    tracing::info!(
        temporal_host = %config.temporal_host,
        task_queue = %config.task_queue,
        k8s_namespace = ?config.k8s_namespace,
        activities = %activity_names::ALL.join(", "),
        "Loaded worker configuration"
    );

    let worker = ActivityWorker::connect(config)
        .await
        .context("Failed to create activity worker")?;

    // Run the worker (blocks until shutdown)
    let run = worker.run();
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
            worker.shutdown();
            run.await?;
        }
    }

    tracing::info!("Worker shutdown complete");
    Ok(())
}
