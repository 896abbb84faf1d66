use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mf_av::ToolRegistry;
use mf_core::{ConversionError, MediaKind, OutputFormat};

use crate::converter::Converter;

/// Audio converter.
///
/// WAV output is decoded and written in process. If that fails (for example
/// on a codec symphonia does not handle) and ffmpeg is available, the file is
/// retried through ffmpeg. Every other target goes straight to ffmpeg.
#[derive(Debug, Clone)]
pub struct AudioConverter {
    tools: Arc<ToolRegistry>,
}

impl AudioConverter {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Converter for AudioConverter {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: OutputFormat,
    ) -> Result<(), ConversionError> {
        if format == OutputFormat::Wav {
            let (src, dst) = (input.to_path_buf(), output.to_path_buf());
            let result = tokio::task::spawn_blocking(move || mf_av::transcode_to_wav(&src, &dst))
                .await
                .map_err(super::join_error)?;

            match result {
                Ok(()) => return Ok(()),
                Err(e) if self.tools.has("ffmpeg") => {
                    tracing::warn!(
                        "In-process decode of {:?} failed ({e}); retrying with ffmpeg",
                        input
                    );
                }
                Err(e) => return Err(e),
            }
        }

        mf_av::transcode_audio(&self.tools, input, output, format).await
    }
}
