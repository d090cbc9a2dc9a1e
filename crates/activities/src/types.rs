// Activity input/output records
// Decision: Requests use PascalCase keys and responses snake_case keys, matching
// the payloads produced by the existing workflow starters on the task queue
//
// All records are flat and built once per call; nothing here is persisted.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Input for the DeployToKubernetes activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployRequest {
    pub image_tag: String,
    /// "staging", "production", or anything else (maps to "default")
    pub environment: String,
}

/// Output from DeployToKubernetes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResponse {
    pub success: bool,
    pub deployment_url: String,
    pub message: String,
    pub timestamp: String,
}

/// Input for the CheckDeploymentStatus activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusRequest {
    pub environment: String,
}

/// Output from CheckDeploymentStatus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ready: bool,
    pub replicas: u32,
    pub ready_replicas: u32,
    pub message: String,
}

/// Input for the RollbackDeployment activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RollbackRequest {
    pub environment: String,
    #[serde(default)]
    pub image_tag: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Output from RollbackDeployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RollbackResponse {
    pub(crate) fn now(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            timestamp: Some(timestamp_now()),
        }
    }
}

/// Input for the GetServiceURL activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceUrlRequest {
    pub environment: String,
    pub service_name: String,
}

/// Output from GetServiceURL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUrlResponse {
    pub url: String,
    pub ready: bool,
    pub message: String,
}

/// Constants for activity names (used for registration and dispatch)
pub mod activity_names {
    pub const DEPLOY_TO_KUBERNETES: &str = "DeployToKubernetes";
    pub const CHECK_DEPLOYMENT_STATUS: &str = "CheckDeploymentStatus";
    pub const ROLLBACK_DEPLOYMENT: &str = "RollbackDeployment";
    pub const GET_SERVICE_URL: &str = "GetServiceURL";

    /// Every activity the worker registers, in registration order
    pub const ALL: [&str; 4] = [
        DEPLOY_TO_KUBERNETES,
        CHECK_DEPLOYMENT_STATUS,
        ROLLBACK_DEPLOYMENT,
        GET_SERVICE_URL,
    ];
}

/// Current UTC time as ISO-8601 with microseconds and a trailing `Z`
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deploy_request_uses_pascal_case_keys() {
        let request: DeployRequest =
            serde_json::from_value(json!({"ImageTag": "myapp:v2", "Environment": "staging"}))
                .unwrap();

        assert_eq!(request.image_tag, "myapp:v2");
        assert_eq!(request.environment, "staging");
    }

    #[test]
    fn test_rollback_request_optional_fields_default() {
        let request: RollbackRequest =
            serde_json::from_value(json!({"Environment": "production"})).unwrap();

        assert_eq!(request.environment, "production");
        assert!(request.image_tag.is_none());
        assert!(request.timestamp.is_none());
        assert_eq!(request.reason, "");
    }

    #[test]
    fn test_response_keys_are_snake_case() {
        let response = StatusResponse {
            ready: true,
            replicas: 3,
            ready_replicas: 3,
            message: "ok".to_string(),
        };

        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["ready_replicas"], 3);
        assert!(value.get("ReadyReplicas").is_none());
    }

    #[test]
    fn test_timestamp_has_trailing_z() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
