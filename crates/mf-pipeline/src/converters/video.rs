use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mf_av::ToolRegistry;
use mf_core::{ConversionError, MediaKind, OutputFormat};

use crate::converter::Converter;

/// Re-encodes video through ffmpeg.
#[derive(Debug, Clone)]
pub struct VideoConverter {
    tools: Arc<ToolRegistry>,
}

impl VideoConverter {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Converter for VideoConverter {
    fn name(&self) -> &'static str {
        "video"
    }

    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: OutputFormat,
    ) -> Result<(), ConversionError> {
        mf_av::transcode_video(&self.tools, input, output, format).await
    }
}
