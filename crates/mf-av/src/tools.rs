//! Locating the external CLI tools (ffmpeg, ffprobe).
//!
//! Discovery happens once, up front. Converters then ask the
//! [`ToolRegistry`] for a tool by name and get a [`ConversionError::Tool`]
//! when it is missing, so a missing ffmpeg fails individual jobs instead of
//! the whole program.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mf_core::config::ToolsConfig;
use mf_core::ConversionError;

/// Per-invocation limit used unless configured otherwise. Long video
/// transcodes are expected.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// A resolved external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub name: String,
    pub path: PathBuf,
    /// The process is killed once this elapses.
    pub timeout: Duration,
}

/// Availability report for one tool, as shown by `check-tools`.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of `<tool> -version`.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Discovered tools, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// The tools mediaforge knows how to use.
    pub const KNOWN: [&'static str; 2] = ["ffmpeg", "ffprobe"];

    /// Resolve every known tool.
    ///
    /// A configured override wins when it points at an existing file; a
    /// stale override is logged and `PATH` is searched instead. Tools that
    /// cannot be found are left out.
    pub fn discover(config: &ToolsConfig) -> Self {
        let overrides = [
            ("ffmpeg", config.ffmpeg_path.as_deref()),
            ("ffprobe", config.ffprobe_path.as_deref()),
        ];

        let mut registry = Self::default();
        for (name, configured) in overrides {
            let path = match configured {
                Some(path) if path.is_file() => Some(path.to_path_buf()),
                Some(path) => {
                    tracing::warn!(
                        "Configured {name} at {} not found, searching PATH",
                        path.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match path {
                Some(path) => {
                    tracing::debug!("Using {name} at {}", path.display());
                    registry.insert(name, path);
                }
                None => tracing::debug!("{name} not found"),
            }
        }
        registry
    }

    /// Apply one timeout to every tool.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tools.values_mut().for_each(|tool| tool.timeout = timeout);
        self
    }

    /// Register a tool at an explicit path, replacing any earlier entry.
    pub fn insert(&mut self, name: &str, path: impl Into<PathBuf>) {
        let tool = ToolConfig {
            name: name.to_owned(),
            path: path.into(),
            timeout: DEFAULT_TIMEOUT,
        };
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Look up a discovered tool.
    pub fn get(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.get(name)
    }

    /// Like [`get`](Self::get), but a missing tool is a conversion error.
    pub fn require(&self, name: &str) -> Result<&ToolConfig, ConversionError> {
        self.get(name)
            .ok_or_else(|| ConversionError::tool(name, "not installed or not on PATH"))
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Report on every known tool, probing versions of the ones present.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        Self::KNOWN
            .iter()
            .map(|&name| {
                let tool = self.get(name);
                ToolInfo {
                    name: name.to_owned(),
                    available: tool.is_some(),
                    version: tool.and_then(|t| version_line(&t.path)),
                    path: tool.map(|t| t.path.clone()),
                }
            })
            .collect()
    }
}

/// First line of `<path> -version`, if the tool runs and succeeds.
fn version_line(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path).arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().next().map(str::to_owned)
}
