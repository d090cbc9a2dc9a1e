// Kubernetes activity set
// Decision: Each activity is a linear script of kubectl calls; no retries of our own,
// the orchestrator owns retry policy
// Decision: Per step, a kubectl failure is either fatal (returned as ActivityError)
// or logged and ignored; the split is part of the observable contract
//
// Activities:
// - deploy: set image (or create), wait for rollout, ensure service, resolve URL
// - check_status: stubbed readiness report
// - rollback: rollout undo, falling back to deleting the deployment
// - get_service_url: synthesized placeholder URL

use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::context::ActivityContext;
use crate::error::{ActivityError, Result};
use crate::kubectl::{deployment_manifest, is_not_found, service_manifest, Kubectl};
use crate::namespace::resolve_namespace;
use crate::types::{
    timestamp_now, DeployRequest, DeployResponse, RollbackRequest, RollbackResponse,
    ServiceUrlRequest, ServiceUrlResponse, StatusRequest, StatusResponse,
};

/// Name of the deployment, service, container and `app` label
pub const DEPLOYMENT_NAME: &str = "demo-app";

/// Rollout wait during deploy
const DEPLOY_ROLLOUT_TIMEOUT: &str = "--timeout=30s";

/// Rollout wait during rollback
const ROLLBACK_ROLLOUT_TIMEOUT: &str = "--timeout=60s";

/// Pause after the URL is known, giving pods time to settle
pub const STABILIZATION_DELAY: Duration = Duration::from_secs(2);

/// Simulated latency of the status check
pub const STATUS_CHECK_DELAY: Duration = Duration::from_secs(1);

/// Simulated latency of the service URL lookup
pub const SERVICE_LOOKUP_DELAY: Duration = Duration::from_millis(500);

/// Replica counts reported by the status stub
const REPORTED_REPLICAS: u32 = 3;

const LOAD_BALANCER_ADDRESS: &str =
    "jsonpath={.status.loadBalancer.ingress[0].hostname}{.status.loadBalancer.ingress[0].ip}";
const NODE_INTERNAL_IP: &str =
    "jsonpath={.items[0].status.addresses[?(@.type=='InternalIP')].address}";
const SERVICE_NODE_PORT: &str = "jsonpath={.spec.ports[0].nodePort}";

/// Deploy, inspect and roll back the demo application through kubectl
#[derive(Debug, Clone)]
pub struct KubernetesActivities {
    kubectl: Kubectl,
    /// Fixed namespace overriding the environment mapping
    namespace: Option<String>,
}

impl KubernetesActivities {
    pub fn new(kubectl: Kubectl) -> Self {
        Self {
            kubectl,
            namespace: None,
        }
    }

    /// Pin every activity to one namespace regardless of environment
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn namespace_for(&self, environment: &str) -> String {
        resolve_namespace(self.namespace.as_deref(), environment)
    }

    /// Deploy `image_tag` to the environment's namespace and report its URL.
    ///
    /// Fails when the image update fails for any reason other than a missing
    /// deployment, or when creating the deployment or service fails. A
    /// rollout that does not finish within 30s is logged with pod
    /// diagnostics and the deploy still reports success.
    #[instrument(name = "DeployToKubernetes", skip(self, ctx), fields(activity_id = %ctx.activity_id, attempt = ctx.attempt))]
    pub async fn deploy(
        &self,
        ctx: &ActivityContext,
        request: DeployRequest,
    ) -> Result<DeployResponse> {
        let namespace = self.namespace_for(&request.environment);
        info!(
            image = %request.image_tag,
            environment = %request.environment,
            namespace = %namespace,
            "Starting Kubernetes deployment"
        );

        info!("[1/5] Updating deployment with new image");
        self.update_image(&request.image_tag, &namespace).await?;
        ctx.heartbeat("Deployment updated");

        info!("[2/5] Waiting for rollout to complete");
        self.wait_for_rollout(&namespace).await?;
        ctx.heartbeat("Rollout completed");

        info!("[3/5] Ensuring service exists");
        self.ensure_service(&namespace).await?;
        ctx.heartbeat("Service configured");

        info!("[4/5] Getting service URL");
        let service_url = self.resolve_service_url(&namespace).await?;
        info!(url = %service_url, "Service URL retrieved");
        ctx.heartbeat("Service URL retrieved");

        // No probe is made; the delay only lets pods settle
        info!("[5/5] Verifying deployment health");
        tokio::time::sleep(STABILIZATION_DELAY).await;

        info!(
            environment = %request.environment,
            url = %service_url,
            "Kubernetes deployment completed successfully"
        );

        Ok(DeployResponse {
            success: true,
            deployment_url: service_url,
            message: format!(
                "Successfully deployed {} to {}",
                request.image_tag, request.environment
            ),
            timestamp: timestamp_now(),
        })
    }

    /// Report deployment readiness. The cluster is not queried; the answer
    /// is always 3/3 ready replicas.
    #[instrument(name = "CheckDeploymentStatus", skip(self, _ctx))]
    pub async fn check_status(
        &self,
        _ctx: &ActivityContext,
        request: StatusRequest,
    ) -> Result<StatusResponse> {
        info!(
            environment = %request.environment,
            namespace = %self.namespace_for(&request.environment),
            "Checking deployment status"
        );

        tokio::time::sleep(STATUS_CHECK_DELAY).await;

        Ok(StatusResponse {
            ready: true,
            replicas: REPORTED_REPLICAS,
            ready_replicas: REPORTED_REPLICAS,
            message: "All pods are running and ready".to_string(),
        })
    }

    /// Roll the deployment back one revision.
    ///
    /// An absent deployment is a successful no-op. When `rollout undo`
    /// fails the deployment is deleted instead, and the deletion outcome
    /// decides `success`. After a successful undo, only a failed final
    /// `get deployment` yields `success = false`.
    #[instrument(name = "RollbackDeployment", skip(self, ctx), fields(activity_id = %ctx.activity_id, attempt = ctx.attempt))]
    pub async fn rollback(
        &self,
        ctx: &ActivityContext,
        request: RollbackRequest,
    ) -> Result<RollbackResponse> {
        let environment = &request.environment;
        let namespace = self.namespace_for(environment);
        info!(
            environment = %environment,
            namespace = %namespace,
            reason = %request.reason,
            "Rolling back deployment"
        );

        info!("[Rollback 1/4] Checking if deployment exists");
        let probe = self
            .kubectl
            .run(&["get", "deployment", DEPLOYMENT_NAME, "-n", &namespace])
            .await?;
        if !probe.success() {
            warn!(stderr = %probe.stderr, "Deployment not found, nothing to rollback");
            return Ok(RollbackResponse::now(
                true,
                format!("No deployment found in {environment} environment to rollback"),
            ));
        }
        ctx.heartbeat("Deployment found");

        info!("[Rollback 2/4] Performing rollback to previous revision");
        let deployment = format!("deployment/{DEPLOYMENT_NAME}");
        let undo = self
            .kubectl
            .run(&["rollout", "undo", &deployment, "-n", &namespace])
            .await?;
        if !undo.success() {
            warn!(stderr = %undo.stderr, "Rollback failed, deleting deployment instead");
            return self.delete_deployment(&namespace, environment).await;
        }
        info!(output = %undo.stdout, "Rollback initiated");
        ctx.heartbeat("Rollback initiated");

        info!("[Rollback 3/4] Waiting for rollback to complete");
        let status = self
            .kubectl
            .run(&[
                "rollout",
                "status",
                &deployment,
                "-n",
                &namespace,
                ROLLBACK_ROLLOUT_TIMEOUT,
            ])
            .await?;
        if status.success() {
            info!(output = %status.stdout, "Rollback status");
        } else {
            warn!(stderr = %status.stderr, "Rollback status check failed");
        }
        ctx.heartbeat("Rollback status checked");

        info!("[Rollback 4/4] Verifying rollback success");
        let verify = self
            .kubectl
            .run(&["get", "deployment", DEPLOYMENT_NAME, "-n", &namespace, "-o", "wide"])
            .await?;
        if !verify.success() {
            error!(stderr = %verify.stderr, "Failed to verify rollback");
            return Ok(RollbackResponse::now(
                false,
                format!(
                    "Rollback verification failed for {environment} deployment: {}",
                    verify.stderr
                ),
            ));
        }

        info!(output = %verify.stdout, "Deployment rollback completed successfully");
        Ok(RollbackResponse::now(
            true,
            format!("Successfully rolled back {environment} deployment to previous revision"),
        ))
    }

    /// Synthesize the URL a service would be reachable at. No cluster call.
    #[instrument(name = "GetServiceURL", skip(self, _ctx))]
    pub async fn get_service_url(
        &self,
        _ctx: &ActivityContext,
        request: ServiceUrlRequest,
    ) -> Result<ServiceUrlResponse> {
        info!(
            environment = %request.environment,
            service = %request.service_name,
            "Getting service URL"
        );

        tokio::time::sleep(SERVICE_LOOKUP_DELAY).await;

        Ok(ServiceUrlResponse {
            url: placeholder_service_url(&request.environment, &request.service_name),
            ready: true,
            message: "Service is accessible".to_string(),
        })
    }

    async fn update_image(&self, image: &str, namespace: &str) -> Result<()> {
        let output = self
            .kubectl
            .run(&[
                "set",
                "image",
                &format!("deployment/{DEPLOYMENT_NAME}"),
                &format!("{DEPLOYMENT_NAME}={image}"),
                "-n",
                namespace,
            ])
            .await?;

        if output.success() {
            info!(output = %output.stdout, "Deployment updated");
            return Ok(());
        }

        if is_not_found(&output.stderr) {
            info!("Deployment not found, creating new deployment");
            return self.create_deployment(image, namespace).await;
        }

        error!(stderr = %output.stderr, "Failed to update deployment");
        Err(ActivityError::UpdateDeployment(output.stderr))
    }

    async fn create_deployment(&self, image: &str, namespace: &str) -> Result<()> {
        info!(name = DEPLOYMENT_NAME, namespace, "Creating deployment");

        let manifest = deployment_manifest(DEPLOYMENT_NAME, image, namespace)?;
        let output = self.kubectl.apply(&manifest).await?;
        if !output.success() {
            error!(stderr = %output.stderr, "Failed to create deployment");
            return Err(ActivityError::CreateDeployment(output.stderr));
        }

        info!(output = %output.stdout, "Deployment created");
        Ok(())
    }

    /// Wait for the rollout. A failed or timed-out rollout is logged with
    /// pod diagnostics and otherwise ignored; only a kubectl spawn failure
    /// is returned.
    async fn wait_for_rollout(&self, namespace: &str) -> Result<()> {
        let output = self
            .kubectl
            .run(&[
                "rollout",
                "status",
                &format!("deployment/{DEPLOYMENT_NAME}"),
                "-n",
                namespace,
                DEPLOY_ROLLOUT_TIMEOUT,
            ])
            .await?;

        if output.success() {
            info!(output = %output.stdout, "Rollout completed");
        } else {
            warn!(stderr = %output.stderr, "Rollout timed out or failed");
            self.log_pod_diagnostics(namespace).await;
            warn!("Continuing deployment without a completed rollout");
        }
        Ok(())
    }

    /// Best-effort pod status and log tail; every failure here is swallowed
    async fn log_pod_diagnostics(&self, namespace: &str) {
        let selector = format!("app={DEPLOYMENT_NAME}");

        match self
            .kubectl
            .run(&["get", "pods", "-n", namespace, "-l", &selector, "-o", "wide"])
            .await
        {
            Ok(pods) if pods.success() => info!(pods = %pods.stdout, "Pod status"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not fetch pod status"),
        }

        match self
            .kubectl
            .run(&["logs", "-n", namespace, "-l", &selector, "--tail=10"])
            .await
        {
            Ok(logs) if logs.success() => info!(logs = %logs.stdout, "Pod logs"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not fetch pod logs"),
        }
    }

    async fn ensure_service(&self, namespace: &str) -> Result<()> {
        let probe = self
            .kubectl
            .run(&["get", "service", DEPLOYMENT_NAME, "-n", namespace])
            .await?;
        if probe.success() {
            info!("Service already exists");
            return Ok(());
        }

        let manifest = service_manifest(DEPLOYMENT_NAME, namespace)?;
        let output = self.kubectl.apply(&manifest).await?;
        if !output.success() {
            error!(stderr = %output.stderr, "Failed to create service");
            return Err(ActivityError::CreateService(output.stderr));
        }

        info!(output = %output.stdout, "Service created");
        Ok(())
    }

    /// LoadBalancer ingress address, else node IP + NodePort, else a placeholder
    async fn resolve_service_url(&self, namespace: &str) -> Result<String> {
        let output = self
            .kubectl
            .run(&[
                "get",
                "service",
                DEPLOYMENT_NAME,
                "-n",
                namespace,
                "-o",
                LOAD_BALANCER_ADDRESS,
            ])
            .await?;

        if !output.success() {
            warn!(stderr = %output.stderr, "Failed to get LoadBalancer address");
            return self.node_port_url(namespace).await;
        }

        let address = output.stdout.trim();
        if address.is_empty() {
            warn!("No external address found, trying NodePort");
            return self.node_port_url(namespace).await;
        }

        let protocol = if namespace == "production" {
            "https"
        } else {
            "http"
        };
        Ok(format!("{protocol}://{address}"))
    }

    async fn node_port_url(&self, namespace: &str) -> Result<String> {
        let node = self
            .kubectl
            .run(&["get", "nodes", "-o", NODE_INTERNAL_IP])
            .await?;
        if !node.success() {
            error!(stderr = %node.stderr, "Failed to get node IP");
            return Ok(fallback_deployment_url(namespace).to_string());
        }

        let port = self
            .kubectl
            .run(&[
                "get",
                "service",
                DEPLOYMENT_NAME,
                "-n",
                namespace,
                "-o",
                SERVICE_NODE_PORT,
            ])
            .await?;
        if !port.success() {
            error!(stderr = %port.stderr, "Failed to get NodePort");
            return Ok(fallback_deployment_url(namespace).to_string());
        }

        Ok(format!(
            "http://{}:{}",
            node.stdout.trim(),
            port.stdout.trim()
        ))
    }

    async fn delete_deployment(
        &self,
        namespace: &str,
        environment: &str,
    ) -> Result<RollbackResponse> {
        info!("Deleting deployment as fallback rollback method");

        let output = self
            .kubectl
            .run(&["delete", "deployment", DEPLOYMENT_NAME, "-n", namespace])
            .await?;
        if !output.success() {
            error!(stderr = %output.stderr, "Failed to delete deployment");
            return Ok(RollbackResponse::now(
                false,
                format!("Failed to delete {environment} deployment: {}", output.stderr),
            ));
        }

        info!(output = %output.stdout, "Deployment deleted");
        Ok(RollbackResponse::now(
            true,
            format!("Successfully deleted {environment} deployment (rollback via deletion)"),
        ))
    }
}

/// URL reported when neither the LoadBalancer nor the NodePort lookup works
pub fn fallback_deployment_url(namespace: &str) -> &'static str {
    if namespace == "staging" {
        "http://staging.demo-app.local:8080"
    } else {
        "https://demo-app.production.local"
    }
}

/// URL synthesized by GetServiceURL
pub fn placeholder_service_url(environment: &str, service_name: &str) -> String {
    if environment == "staging" {
        format!("http://staging.{service_name}.local:8080")
    } else {
        format!("https://{service_name}.production.com")
    }
}
