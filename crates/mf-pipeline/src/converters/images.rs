use std::path::Path;

use async_trait::async_trait;
use mf_av::ImageOptions;
use mf_core::{ConversionError, MediaKind, OutputFormat};

use crate::converter::Converter;

/// Re-encodes still images in process.
#[derive(Debug, Clone, Default)]
pub struct ImageConverter {
    options: ImageOptions,
}

impl ImageConverter {
    pub fn new(options: ImageOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Converter for ImageConverter {
    fn name(&self) -> &'static str {
        "image"
    }

    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: OutputFormat,
    ) -> Result<(), ConversionError> {
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        let options = self.options;

        tokio::task::spawn_blocking(move || mf_av::convert_image(&input, &output, format, &options))
            .await
            .map_err(super::join_error)?
    }
}
