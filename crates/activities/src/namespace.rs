// Namespace resolution

/// Namespace used for environments other than staging and production
pub const DEFAULT_NAMESPACE: &str = "default";

/// Map an environment name to the Kubernetes namespace it deploys into.
///
/// A configured, non-empty override always wins. Otherwise "staging" and "production"
/// map to namespaces of the same name and everything else to "default".
/// Matching is exact; no other validation is done.
pub fn resolve_namespace(override_namespace: Option<&str>, environment: &str) -> String {
    if let Some(namespace) = override_namespace.filter(|ns| !ns.is_empty()) {
        return namespace.to_string();
    }

    match environment {
        "staging" => "staging",
        "production" => "production",
        _ => DEFAULT_NAMESPACE,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_environments() {
        assert_eq!(resolve_namespace(None, "staging"), "staging");
        assert_eq!(resolve_namespace(None, "production"), "production");
    }

    #[test]
    fn test_unknown_environments_fall_back_to_default() {
        for env in ["", "dev", "prod", "Staging", "PRODUCTION", "qa-1"] {
            assert_eq!(resolve_namespace(None, env), DEFAULT_NAMESPACE, "env {env:?}");
        }
    }

    #[test]
    fn test_override_wins() {
        for env in ["staging", "production", "anything"] {
            assert_eq!(resolve_namespace(Some("team-a"), env), "team-a");
        }
        assert_eq!(resolve_namespace(Some(""), "production"), "production");
        assert_eq!(resolve_namespace(Some(""), "qa"), DEFAULT_NAMESPACE);
    }
}
