// Activity dispatch
//
// Maps a Temporal activity type name plus its JSON payload onto the
// Kubernetes activity set, and serializes the typed response back to JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use kubedeploy_activities::{
    activity_names, ActivityContext, Kubectl, KubernetesActivities, TokioProcessRunner,
};
use serde::de::DeserializeOwned;

use crate::config::WorkerConfig;

/// Build the activity set the worker registers
pub fn build_activities(config: &WorkerConfig) -> KubernetesActivities {
    let kubectl = Kubectl::with_binary(Arc::new(TokioProcessRunner), &config.kubectl_path);
    let activities = KubernetesActivities::new(kubectl);
    match &config.k8s_namespace {
        Some(namespace) => activities.with_namespace(namespace),
        None => activities,
    }
}

/// Execute an activity by type
pub async fn execute_activity(
    activities: &KubernetesActivities,
    ctx: &ActivityContext,
    activity_type: &str,
    input_data: &[u8],
) -> Result<serde_json::Value> {
    let output = match activity_type {
        activity_names::DEPLOY_TO_KUBERNETES => {
            let input = decode(activity_type, input_data)?;
            serde_json::to_value(activities.deploy(ctx, input).await?)?
        }
        activity_names::CHECK_DEPLOYMENT_STATUS => {
            let input = decode(activity_type, input_data)?;
            serde_json::to_value(activities.check_status(ctx, input).await?)?
        }
        activity_names::ROLLBACK_DEPLOYMENT => {
            let input = decode(activity_type, input_data)?;
            serde_json::to_value(activities.rollback(ctx, input).await?)?
        }
        activity_names::GET_SERVICE_URL => {
            let input = decode(activity_type, input_data)?;
            serde_json::to_value(activities.get_service_url(ctx, input).await?)?
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown activity type: '{}'. Known activities: {}. \
                This may indicate a workflow bug or a task queue shared with another worker.",
                activity_type,
                activity_names::ALL.join(", ")
            ))
        }
    };
    Ok(output)
}

fn decode<T: DeserializeOwned>(activity_type: &str, input_data: &[u8]) -> Result<T> {
    serde_json::from_slice(input_data)
        .with_context(|| format!("Failed to parse {activity_type} input"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubedeploy_activities::memory::MockProcessRunner;
    use kubedeploy_activities::CommandOutput;
    use serde_json::json;

    fn mock_activities(runner: &MockProcessRunner) -> KubernetesActivities {
        KubernetesActivities::new(Kubectl::new(Arc::new(runner.clone())))
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_get_service_url() {
        let activities = mock_activities(&MockProcessRunner::new());
        let input = json!({"Environment": "staging", "ServiceName": "svc"});

        let output = execute_activity(
            &activities,
            &ActivityContext::default(),
            activity_names::GET_SERVICE_URL,
            &serde_json::to_vec(&input).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(output["url"], "http://staging.svc.local:8080");
        assert_eq!(output["ready"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_check_status() {
        let activities = mock_activities(&MockProcessRunner::new());

        let output = execute_activity(
            &activities,
            &ActivityContext::default(),
            activity_names::CHECK_DEPLOYMENT_STATUS,
            br#"{"Environment": "production"}"#,
        )
        .await
        .unwrap();

        assert_eq!(output["replicas"], 3);
        assert_eq!(output["ready_replicas"], 3);
    }

    #[tokio::test]
    async fn test_dispatch_rollback_returns_snake_case_response() {
        let runner = MockProcessRunner::new();
        runner
            .on(&["get", "deployment"], CommandOutput::failed("not found"))
            .await;

        let output = execute_activity(
            &mock_activities(&runner),
            &ActivityContext::default(),
            activity_names::ROLLBACK_DEPLOYMENT,
            br#"{"Environment": "staging", "Reason": "bad build"}"#,
        )
        .await
        .unwrap();

        assert_eq!(output["success"], true);
        assert!(output["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_activity_error_is_propagated() {
        let runner = MockProcessRunner::new();
        runner
            .on(&["set", "image"], CommandOutput::failed("Unauthorized"))
            .await;

        let err = execute_activity(
            &mock_activities(&runner),
            &ActivityContext::default(),
            activity_names::DEPLOY_TO_KUBERNETES,
            br#"{"ImageTag": "myapp:v2", "Environment": "staging"}"#,
        )
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("Failed to update deployment: Unauthorized"));
    }

    #[tokio::test]
    async fn test_unknown_activity_type() {
        let activities = mock_activities(&MockProcessRunner::new());

        let err = execute_activity(&activities, &ActivityContext::default(), "BuildDockerImage", b"{}")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Unknown activity type: 'BuildDockerImage'"));
        assert!(message.contains("DeployToKubernetes"));
        assert!(message.contains("GetServiceURL"));
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let activities = mock_activities(&MockProcessRunner::new());

        let err = execute_activity(
            &activities,
            &ActivityContext::default(),
            activity_names::DEPLOY_TO_KUBERNETES,
            br#"{"Environment": "staging"}"#,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Failed to parse DeployToKubernetes input"));
    }

    #[test]
    fn test_build_activities_applies_namespace_override() {
        let config = WorkerConfig {
            k8s_namespace: Some("team-a".to_string()),
            ..Default::default()
        };

        let activities = build_activities(&config);
        assert_eq!(activities.namespace_for("production"), "team-a");
        assert_eq!(
            build_activities(&WorkerConfig::default()).namespace_for("production"),
            "production"
        );
    }
}
