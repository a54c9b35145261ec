// ABOUTME: Subprocess runner for the deploy CLI with timeouts and capped output.
// ABOUTME: Captures stdout, stderr, or both, and decodes JSON responses.

use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::error::{
    BridgeError, NonZeroExitSnafu, NotFoundSnafu, ParseSnafu, SpawnSnafu, TimeoutSnafu,
};

/// Maximum bytes kept from each output stream (1 MiB). The rest is drained and dropped.
pub const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Captured output of a finished invocation.
#[derive(Debug, Clone, Default)]
struct Captured {
    stdout: String,
    stderr: String,
}

impl Captured {
    fn combined(self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout,
            (true, false) => self.stderr,
            (false, false) => {
                let mut text = self.stdout;
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&self.stderr);
                text
            }
        }
    }
}

/// Runs the deploy CLI binary as a child process.
#[derive(Debug, Clone)]
pub struct CliRunner {
    binary: String,
    default_timeout: Duration,
}

impl CliRunner {
    pub fn new(binary: impl Into<String>, default_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            default_timeout,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run with `args` and return stdout.
    ///
    /// # Errors
    ///
    /// Fails when the binary is missing, exits non-zero, or outlives `timeout`.
    pub async fn run_capturing_stdout(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, BridgeError> {
        self.execute(args, timeout).await.map(|c| c.stdout)
    }

    /// Run with `args` and return stdout followed by stderr.
    ///
    /// Some subcommands print their user-facing text on stderr.
    pub async fn run_capturing_combined(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, BridgeError> {
        self.execute(args, timeout).await.map(Captured::combined)
    }

    /// Run with `args --json` under the default timeout and decode stdout.
    pub async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, BridgeError> {
        let mut full_args = args.to_vec();
        full_args.push("--json");

        let stdout = self
            .run_capturing_stdout(&full_args, self.default_timeout)
            .await?;

        serde_json::from_str(stdout.trim()).context(ParseSnafu {
            command: self.describe(&full_args),
        })
    }

    async fn execute(&self, args: &[&str], timeout: Duration) -> Result<Captured, BridgeError> {
        let command = self.describe(args);
        tracing::debug!(%command, ?timeout, "Running deploy CLI");

        let mut child = match Command::new(&self.binary)
            .args(args)
            .env("NO_COLOR", "1")
            .env("FORCE_COLOR", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return NotFoundSnafu {
                    binary: self.binary.clone(),
                }
                .fail();
            }
            Err(e) => {
                return Err(e).context(SpawnSnafu {
                    binary: self.binary.clone(),
                });
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = tokio::time::timeout(timeout, async {
            tokio::join!(read_capped(stdout), read_capped(stderr), child.wait())
        })
        .await;

        let (stdout, stderr, status) = match finished {
            Ok(parts) => parts,
            Err(_) => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!("Failed to kill timed out process: {}", e);
                }
                tracing::warn!(%command, "Deploy CLI timed out");
                return TimeoutSnafu { command, timeout }.fail();
            }
        };

        let binary = || SpawnSnafu {
            binary: self.binary.clone(),
        };
        let status = status.context(binary())?;
        let captured = Captured {
            stdout: stdout.context(binary())?,
            stderr: stderr.context(binary())?,
        };

        if !status.success() {
            let message = failure_message(&captured);
            tracing::debug!(%command, code = ?status.code(), "Deploy CLI failed: {}", message);
            return NonZeroExitSnafu {
                command,
                code: status.code(),
                message,
            }
            .fail();
        }

        Ok(captured)
    }

    fn describe(&self, args: &[&str]) -> String {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read a stream up to the output cap, then drain the remainder so the child never blocks.
async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<String> {
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };

    let mut buf = Vec::new();
    (&mut reader).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await?;
    let dropped = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    if dropped > 0 {
        tracing::debug!("Dropped {} bytes of CLI output over the cap", dropped);
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn failure_message(captured: &Captured) -> String {
    let stderr = captured.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = captured.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    "no output".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_joins_both_streams() {
        let captured = Captured {
            stdout: "out".to_string(),
            stderr: "err\n".to_string(),
        };
        assert_eq!(captured.combined(), "out\nerr\n");
    }

    #[test]
    fn combined_uses_whichever_stream_has_text() {
        let only_err = Captured {
            stdout: String::new(),
            stderr: "Not logged in".to_string(),
        };
        assert_eq!(only_err.combined(), "Not logged in");
    }

    #[test]
    fn failure_message_prefers_stderr() {
        let captured = Captured {
            stdout: "partial".to_string(),
            stderr: "  fatal: no project  ".to_string(),
        };
        assert_eq!(failure_message(&captured), "fatal: no project");
        assert_eq!(failure_message(&Captured::default()), "no output");
    }

    #[test]
    fn describe_renders_command_line() {
        let runner = CliRunner::new("ship", Duration::from_secs(1));
        assert_eq!(runner.describe(&["status", "app", "--json"]), "ship status app --json");
    }
}
