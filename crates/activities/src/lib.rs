// Kubedeploy activities
//
// Kubernetes deployment activities driven through the kubectl CLI:
// - process: ProcessRunner trait and the tokio-backed runner
// - kubectl: kubectl handle, "not found" classification, manifests
// - namespace: environment -> namespace mapping
// - context: per-attempt ActivityContext with heartbeats
// - kubernetes: the activity set (deploy, status, rollback, service URL)
// - memory: scripted runner for tests

pub mod context;
pub mod error;
pub mod kubectl;
pub mod kubernetes;
pub mod memory;
pub mod namespace;
pub mod process;
pub mod types;

pub use context::ActivityContext;
pub use error::{ActivityError, Result};
pub use kubectl::{is_not_found, Kubectl};
pub use kubernetes::{KubernetesActivities, DEPLOYMENT_NAME};
pub use namespace::resolve_namespace;
pub use process::{CommandOutput, ProcessRunner, TokioProcessRunner};
pub use types::{
    activity_names, DeployRequest, DeployResponse, RollbackRequest, RollbackResponse,
    ServiceUrlRequest, ServiceUrlResponse, StatusRequest, StatusResponse,
};
