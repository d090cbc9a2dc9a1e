// Error types for the Kubernetes activity set

use thiserror::Error;

/// Result type alias for activity operations
pub type Result<T> = std::result::Result<T, ActivityError>;

/// Errors that fail an activity outright
///
/// A non-zero kubectl exit is not an error on its own; activities decide per
/// step whether it is fatal (one of these) or logged and ignored.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// The external program could not be started or its pipes failed
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Updating the live deployment image failed for a reason other than absence
    #[error("Failed to update deployment: {0}")]
    UpdateDeployment(String),

    /// Applying the generated deployment manifest failed
    #[error("Failed to create deployment: {0}")]
    CreateDeployment(String),

    /// Applying the generated service manifest failed
    #[error("Failed to create service: {0}")]
    CreateService(String),

    /// Manifest could not be rendered to YAML
    #[error("Manifest rendering error: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// Activity payload could not be decoded or encoded
    #[error("Invalid activity payload: {0}")]
    Payload(#[from] serde_json::Error),
}
