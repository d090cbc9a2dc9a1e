// kubectl wrapper and manifest rendering
// Decision: Missing-resource detection lives in one function (is_not_found) so the
// stderr substring contract can later be swapped for a structured API error check
// Decision: Manifests are piped to `kubectl apply -f -` over stdin

use std::sync::Arc;

use serde_json::json;

use crate::error::Result;
use crate::process::{CommandOutput, ProcessRunner};

/// Default kubectl binary, resolved through PATH
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Replica count for newly created deployments
pub const DEFAULT_REPLICAS: u32 = 3;

/// Port the application container listens on
pub const CONTAINER_PORT: u16 = 8080;

/// Port the LoadBalancer service exposes
pub const SERVICE_PORT: u16 = 80;

/// Returns true when kubectl's stderr reports a missing resource
pub fn is_not_found(stderr: &str) -> bool {
    stderr.contains("not found")
}

/// Thin handle over a [`ProcessRunner`] that always invokes kubectl
#[derive(Clone)]
pub struct Kubectl {
    runner: Arc<dyn ProcessRunner>,
    binary: String,
}

impl Kubectl {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self::with_binary(runner, DEFAULT_KUBECTL)
    }

    pub fn with_binary(runner: Arc<dyn ProcessRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run kubectl with the given arguments
    pub async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run(&self.binary, &args, None).await
    }

    /// `kubectl apply -f -` with the manifest on stdin
    pub async fn apply(&self, manifest: &str) -> Result<CommandOutput> {
        let args = ["apply", "-f", "-"].map(String::from);
        self.runner
            .run(&self.binary, &args, Some(manifest.as_bytes()))
            .await
    }
}

impl std::fmt::Debug for Kubectl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kubectl")
            .field("binary", &self.binary)
            .finish_non_exhaustive()
    }
}

/// Deployment manifest: 3 replicas of `image`, labelled `app=<name>`
pub fn deployment_manifest(name: &str, image: &str, namespace: &str) -> Result<String> {
    let manifest = json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
        },
        "spec": {
            "replicas": DEFAULT_REPLICAS,
            "selector": {
                "matchLabels": { "app": name }
            },
            "template": {
                "metadata": {
                    "labels": { "app": name }
                },
                "spec": {
                    "containers": [{
                        "name": name,
                        "image": image,
                        "imagePullPolicy": "Always",
                        "ports": [{ "containerPort": CONTAINER_PORT }]
                    }]
                }
            }
        }
    });
    Ok(serde_yaml::to_string(&manifest)?)
}

/// LoadBalancer service manifest routing port 80 to the container port
pub fn service_manifest(name: &str, namespace: &str) -> Result<String> {
    let manifest = json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": namespace,
        },
        "spec": {
            "selector": { "app": name },
            "ports": [{
                "port": SERVICE_PORT,
                "targetPort": CONTAINER_PORT
            }],
            "type": "LoadBalancer"
        }
    });
    Ok(serde_yaml::to_string(&manifest)?)
}
