//! Error taxonomy for mediaforge.
//!
//! Three families, each recovered at a different level:
//!
//! - [`ClassificationMismatch`] is returned as a value when the worklist
//!   rejects a file; it never aborts anything.
//! - [`ConfigurationError`] aborts a whole batch before any job runs.
//! - [`ConversionError`] belongs to a single job and is collected into the
//!   batch result.
//!
//! [`Error`] unifies them for callers (such as the CLI) that just want to
//! propagate with `?`.

use std::path::PathBuf;

use crate::media::{MediaKind, OutputFormat};

/// A file was rejected by the worklist because of its kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationMismatch {
    /// The extension does not belong to any known media kind.
    #[error("unsupported file type: {}", path.display())]
    UnknownExtension {
        /// The rejected path.
        path: PathBuf,
    },

    /// The file is valid media but not of the worklist's active kind.
    #[error("{} is {found} media but the worklist expects {expected}", path.display())]
    KindMismatch {
        /// The rejected path.
        path: PathBuf,
        /// Active kind of the worklist.
        expected: MediaKind,
        /// Kind the file was classified as.
        found: MediaKind,
    },
}

impl ClassificationMismatch {
    /// The path that was rejected.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::UnknownExtension { path } | Self::KindMismatch { path, .. } => path,
        }
    }
}

/// The batch as a whole cannot run. Raised before any job starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The target format is not in the catalog of the jobs' kind.
    #[error("cannot convert {kind} files to {format}")]
    FormatKindMismatch {
        /// Requested target.
        format: OutputFormat,
        /// Shared kind of the jobs.
        kind: MediaKind,
    },

    /// The jobs do not share a single media kind.
    #[error("batch mixes {expected} and {found} files")]
    MixedKinds {
        /// Kind of the first job.
        expected: MediaKind,
        /// First differing kind encountered.
        found: MediaKind,
    },

    /// No converter is registered for the jobs' kind.
    #[error("no converter registered for {0} media")]
    MissingConverter(MediaKind),

    /// The output folder does not exist or is not a directory.
    #[error("output folder does not exist: {}", path.display())]
    OutputFolderMissing {
        /// The configured output folder.
        path: PathBuf,
    },

    /// The output folder exists but cannot be written to.
    #[error("output folder is not writable: {}: {source}", path.display())]
    OutputFolderNotWritable {
        /// The configured output folder.
        path: PathBuf,
        /// The I/O error raised by the test write.
        #[source]
        source: std::io::Error,
    },
}

/// A single job failed. Captured into the batch result, never raised past
/// the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The converter cannot produce this format.
    #[error("unsupported conversion: {kind} to {format}")]
    Unsupported {
        /// Kind handled by the converter.
        kind: MediaKind,
        /// Requested target.
        format: OutputFormat,
    },

    /// An external tool (ffmpeg, etc.) is missing or failed.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Reading the source or writing the output failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The source could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The output could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The destination is the source file itself.
    #[error("output would overwrite its source: {}", path.display())]
    OverwritesSource {
        /// The shared path.
        path: PathBuf,
    },

    /// The batch was cancelled before this job started.
    #[error("cancelled before start")]
    Cancelled,

    /// Catch-all for unexpected failures (e.g. a panicking worker).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConversionError {
    /// Convenience constructor for [`ConversionError::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`ConversionError::Decode`].
    pub fn decode(message: impl std::fmt::Display) -> Self {
        Self::Decode(message.to_string())
    }

    /// Convenience constructor for [`ConversionError::Encode`].
    pub fn encode(message: impl std::fmt::Display) -> Self {
        Self::Encode(message.to_string())
    }
}

/// Unified error type covering all failure modes in mediaforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file was rejected by the worklist.
    #[error(transparent)]
    Classification(#[from] ClassificationMismatch),

    /// A batch could not start.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A conversion failed.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Input data failed validation (bad config value, unknown format name).
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
