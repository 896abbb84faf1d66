//! Application configuration types.
//!
//! Every section defaults sensibly so an empty config file is valid. Loading
//! from disk is left to the caller (the binary reads TOML).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub conversion: ConversionConfig,
}

impl Config {
    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.conversion.max_concurrency == Some(0) {
            warnings.push("conversion.max_concurrency is 0; using 1".into());
        }

        if self.conversion.tool_timeout_secs == 0 {
            warnings.push(
                "conversion.tool_timeout_secs is 0; every tool call will time out".into(),
            );
        }

        if !(1..=100).contains(&self.conversion.jpeg_quality) {
            warnings.push(format!(
                "conversion.jpeg_quality {} is outside 1-100; it will be clamped",
                self.conversion.jpeg_quality
            ));
        }

        for (name, path) in [
            ("ffmpeg_path", &self.tools.ffmpeg_path),
            ("ffprobe_path", &self.tools.ffprobe_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "tools.{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Batch conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Maximum number of jobs converting at once. `None` uses the CPU count.
    pub max_concurrency: Option<usize>,
    /// Maximum run time of a single external tool invocation.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Quality (1-100) used for JPEG output.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_tool_timeout_secs() -> u64 {
    3600
}
fn default_jpeg_quality() -> u8 {
    90
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            tool_timeout_secs: default_tool_timeout_secs(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl ConversionConfig {
    /// Worker pool size: the configured limit, or the number of CPUs.
    /// Never less than 1.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }

    /// Tool timeout as a [`std::time::Duration`].
    pub fn tool_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tool_timeout_secs)
    }
}
