// In-memory implementations for testing
// Decision: Scripted by argument prefix so tests describe cluster behaviour, not call order
//
// MockProcessRunner answers each command with the output of the first rule
// whose argument prefix matches, and records every call it receives.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ActivityError, Result};
use crate::process::{CommandOutput, ProcessRunner};

/// A call observed by [`MockProcessRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl RecordedCall {
    /// True when the arguments start with `prefix`
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

#[derive(Debug, Clone)]
enum Response {
    Output(CommandOutput),
    /// Fail as if the program could not be started
    SpawnError(std::io::ErrorKind),
}

#[derive(Debug, Clone)]
struct Rule {
    prefix: Vec<String>,
    response: Response,
}

/// Scripted process runner
#[derive(Debug, Clone)]
pub struct MockProcessRunner {
    rules: Arc<RwLock<Vec<Rule>>>,
    fallback: CommandOutput,
    call_log: Arc<RwLock<Vec<RecordedCall>>>,
}

impl MockProcessRunner {
    /// Create a runner where every command succeeds with empty output
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            fallback: CommandOutput::ok(""),
            call_log: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Output for commands no rule matches
    pub fn with_fallback(mut self, output: CommandOutput) -> Self {
        self.fallback = output;
        self
    }

    /// Answer commands whose arguments start with `prefix`.
    /// Earlier rules take precedence.
    pub async fn on(&self, prefix: &[&str], output: CommandOutput) -> &Self {
        self.push_rule(prefix, Response::Output(output)).await
    }

    /// Fail commands whose arguments start with `prefix` with a spawn error
    pub async fn on_spawn_error(&self, prefix: &[&str], kind: std::io::ErrorKind) -> &Self {
        self.push_rule(prefix, Response::SpawnError(kind)).await
    }

    async fn push_rule(&self, prefix: &[&str], response: Response) -> &Self {
        self.rules.write().await.push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
        });
        self
    }

    /// Get the call log
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.call_log.read().await.clone()
    }

    /// Number of calls whose arguments start with `prefix`
    pub async fn count(&self, prefix: &[&str]) -> usize {
        self.call_log
            .read()
            .await
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<CommandOutput> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            stdin: stdin.map(|s| String::from_utf8_lossy(s).into_owned()),
        };

        let response = self
            .rules
            .read()
            .await
            .iter()
            .find(|rule| {
                let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
                call.starts_with(&prefix)
            })
            .map(|rule| rule.response.clone())
            .unwrap_or_else(|| Response::Output(self.fallback.clone()));

        self.call_log.write().await.push(call);
        match response {
            Response::Output(output) => Ok(output),
            Response::SpawnError(kind) => Err(ActivityError::Spawn {
                program: program.to_string(),
                source: std::io::Error::from(kind),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let runner = MockProcessRunner::new();
        runner
            .on(&["get", "service"], CommandOutput::failed("not found"))
            .await
            .on(&["get"], CommandOutput::ok("generic"))
            .await;

        let svc = runner
            .run("kubectl", &args(&["get", "service", "demo-app"]), None)
            .await
            .unwrap();
        let pods = runner
            .run("kubectl", &args(&["get", "pods"]), None)
            .await
            .unwrap();
        let other = runner
            .run("kubectl", &args(&["delete", "pod"]), None)
            .await
            .unwrap();

        assert_eq!(svc.exit_code, 1);
        assert_eq!(pods.stdout, "generic");
        assert!(other.success());
        assert_eq!(runner.count(&["get"]).await, 2);
    }

    #[tokio::test]
    async fn test_spawn_error_rule() {
        let runner = MockProcessRunner::new();
        runner
            .on_spawn_error(&["rollout"], std::io::ErrorKind::PermissionDenied)
            .await;

        let result = runner
            .run("kubectl", &args(&["rollout", "status", "deployment/demo-app"]), None)
            .await;

        assert!(matches!(
            result,
            Err(ActivityError::Spawn { ref program, ref source })
                if program == "kubectl" && source.kind() == std::io::ErrorKind::PermissionDenied
        ));
        assert_eq!(runner.count(&["rollout"]).await, 1);
    }

    #[tokio::test]
    async fn test_records_stdin() {
        let runner = MockProcessRunner::new();
        runner
            .run("kubectl", &args(&["apply", "-f", "-"]), Some(b"kind: Service".as_slice()))
            .await
            .unwrap();

        let calls = runner.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].stdin.as_deref(), Some("kind: Service"));
    }
}
