//! Timed invocation of external tools.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use mf_core::ConversionError;
use tokio::process::Command;

use crate::tools::{ToolConfig, DEFAULT_TIMEOUT};

/// What a successful tool run printed.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// One invocation of an external program, built up argument by argument.
///
/// Arguments are kept as [`OsString`]s so non-UTF-8 file names reach the
/// tool unchanged.
///
/// ```no_run
/// use mf_av::ToolCommand;
///
/// # async fn example() -> Result<(), mf_core::ConversionError> {
/// ToolCommand::new("ffmpeg")
///     .args(["-y", "-i", "in.flac", "out.ogg"])
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a command for `program` with no arguments and the default
    /// timeout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Start from a discovered tool, using its path and timeout.
    pub fn for_tool(tool: &ToolConfig) -> Self {
        Self::new(tool.path.clone()).with_timeout(tool.timeout)
    }

    /// Override how long the program may run before it is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Append one argument.
    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append a file path argument.
    pub fn path_arg(&mut self, path: &Path) -> &mut Self {
        self.arg(path)
    }

    /// Append several arguments in order.
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Arguments added so far.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Short name used in error messages (`ffmpeg`, not `/usr/bin/ffmpeg`).
    fn display_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn failure(&self, message: String) -> ConversionError {
        ConversionError::tool(self.display_name(), message)
    }

    /// Run the program to completion with stdin closed.
    ///
    /// A spawn failure, a non-zero exit (the tail of stderr is included), or
    /// an expired timeout all become [`ConversionError::Tool`]. On timeout
    /// the child is killed.
    pub async fn execute(&self) -> Result<ToolOutput, ConversionError> {
        tracing::debug!("{} {:?}", self.program.display(), self.args);

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(format!("failed to spawn: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| self.failure(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| self.failure(format!("failed while waiting: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(self.failure(format!(
                "exited with {}: {}",
                output.status,
                tail(&stderr, 5)
            )));
        }

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// Last `n` non-empty lines of `text`; ffmpeg's reason for failing is at the
/// end, after the banner and stream listing.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("banner\n\nInput #0\nbad codec\n", 2), "Input #0\nbad codec");
        assert_eq!(tail("one line", 5), "one line");
        assert_eq!(tail("", 3), "");
    }

    #[test]
    fn for_tool_uses_tool_settings() {
        let tool = ToolConfig {
            name: "ffmpeg".into(),
            path: PathBuf::from("/usr/bin/ffmpeg"),
            timeout: Duration::from_secs(7),
        };
        let mut cmd = ToolCommand::for_tool(&tool);
        cmd.arg("-y").path_arg(Path::new("/tmp/in.wav"));
        assert_eq!(cmd.timeout(), Duration::from_secs(7));
        assert_eq!(cmd.get_args(), [OsString::from("-y"), OsString::from("/tmp/in.wav")]);
        assert_eq!(cmd.display_name(), "ffmpeg");
    }

    #[tokio::test]
    async fn missing_program_is_tool_error() {
        let err = ToolCommand::new("mediaforge-no-such-tool")
            .execute()
            .await
            .unwrap_err();
        match err {
            ConversionError::Tool { tool, message } => {
                assert_eq!(tool, "mediaforge-no-such-tool");
                assert!(message.contains("failed to spawn"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let out = ToolCommand::new("sh")
            .args(["-c", "echo converted"])
            .execute()
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "converted");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_reports_stderr_tail() {
        let err = ToolCommand::new("sh")
            .args(["-c", "echo header >&2; echo 'Unknown encoder' >&2; exit 3"])
            .execute()
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("Unknown encoder"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = ToolCommand::new("sleep")
            .with_timeout(Duration::from_millis(100))
            .arg("10")
            .execute()
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("timed out"), "{err}");
    }
}
