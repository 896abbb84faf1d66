//! mf-core: shared media kinds, output formats, errors and configuration.
//!
//! This crate is the foundational dependency for the other mf-* crates. It
//! owns the closed set of media kinds, the extension table used to classify
//! input files, the per-kind output format catalog and the error taxonomy
//! shared by the worklist and the conversion dispatcher.

pub mod config;
pub mod error;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{ClassificationMismatch, ConfigurationError, ConversionError, Error, Result};
pub use media::*;
