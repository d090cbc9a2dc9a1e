// Process runner
// Decision: Trait-based so activities can be driven by a scripted runner in tests
// Decision: A non-zero exit is data, not an error; only spawn/pipe failures are errors
// Decision: No timeout here; callers pass kubectl's own --timeout flags where needed

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{ActivityError, Result};

/// Captured result of one external command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; -1 when the process was terminated by a signal
    pub exit_code: i32,
}

impl CommandOutput {
    /// Build a successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Build a failed output with the given stderr and exit code 1
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: 1,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external programs and captures their output
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, feeding `stdin` if given.
    ///
    /// Returns the captured output for any exit code, including a child that
    /// exits without reading all of `stdin`. Fails only when the process
    /// cannot be started or its output cannot be collected.
    async fn run(&self, program: &str, args: &[String], stdin: Option<&[u8]>)
        -> Result<CommandOutput>;
}

/// Production runner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<CommandOutput> {
        info!(command = %format_command(program, args), "Running command");

        let spawn_error = |source: std::io::Error| ActivityError::Spawn {
            program: program.to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let pipe = child.stdin.take();
        let feed = async move {
            if let (Some(mut pipe), Some(data)) = (pipe, stdin) {
                pipe.write_all(data).await?;
                pipe.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        // Feed stdin while draining stdout/stderr so neither side can block the other
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(spawn_error)?;
        match fed {
            Ok(()) => {}
            // The child exited before reading all of stdin; its exit code and stderr say why
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                debug!(program, "Process closed stdin before it was fully written");
            }
            Err(e) => return Err(spawn_error(e)),
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Render a command line for logs
pub fn format_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
