//! Converter implementations backed by mf-av, and the factory that binds
//! them to their media kinds.

mod audio;
mod images;
mod video;

use std::sync::Arc;

use mf_av::{ImageOptions, ToolRegistry};
use mf_core::ConversionError;
use tokio::task::JoinError;

use crate::converter::ConverterRegistry;

pub use audio::AudioConverter;
pub use images::ImageConverter;
pub use video::VideoConverter;

/// Build a registry with one converter for every media kind.
///
/// Missing external tools are not an error here: the image converter and the
/// in-process WAV path work without them, and conversions that do need
/// ffmpeg fail per job with a tool error.
pub fn default_registry(
    tools: Arc<ToolRegistry>,
    image_options: ImageOptions,
) -> ConverterRegistry {
    if !tools.has("ffmpeg") {
        tracing::warn!("ffmpeg not found; video and most audio conversions will fail");
    }

    ConverterRegistry::new()
        .with(ImageConverter::new(image_options))
        .with(AudioConverter::new(Arc::clone(&tools)))
        .with(VideoConverter::new(tools))
}

fn join_error(err: JoinError) -> ConversionError {
    ConversionError::Internal(format!("conversion task failed: {err}"))
}
