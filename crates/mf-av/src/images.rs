//! In-process image re-encoding with the `image` crate.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageError, ImageFormat};
use mf_core::{ConversionError, MediaKind, OutputFormat};

/// Encoder settings for image output.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

/// Map an output format to the `image` crate's format, if it is an image
/// format.
fn image_format(format: OutputFormat) -> Option<ImageFormat> {
    match format {
        OutputFormat::Png => Some(ImageFormat::Png),
        OutputFormat::Jpeg => Some(ImageFormat::Jpeg),
        OutputFormat::Bmp => Some(ImageFormat::Bmp),
        OutputFormat::Gif => Some(ImageFormat::Gif),
        OutputFormat::Webp => Some(ImageFormat::WebP),
        OutputFormat::Tiff => Some(ImageFormat::Tiff),
        _ => None,
    }
}

/// Reduce the pixel layout to one the target encoder accepts.
///
/// JPEG has no alpha channel; GIF, BMP and WebP only take 8-bit samples.
/// PNG and TIFF keep 8/16-bit data but not floating point.
fn prepare_for(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::Gif | ImageFormat::Bmp | ImageFormat::WebP => {
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        _ => match img.color() {
            ColorType::Rgb32F | ColorType::Rgba32F => DynamicImage::ImageRgba16(img.to_rgba16()),
            _ => img,
        },
    }
}

fn map_write_error(err: ImageError) -> ConversionError {
    match err {
        ImageError::IoError(source) => ConversionError::Io { source },
        other => ConversionError::encode(other),
    }
}

/// Decode `input` and re-encode it as `format` at `output`.
///
/// Blocking and CPU-bound; async callers should run it on a blocking thread.
/// An existing file at `output` is overwritten.
pub fn convert_image(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    options: &ImageOptions,
) -> Result<(), ConversionError> {
    let target = image_format(format).ok_or(ConversionError::Unsupported {
        kind: MediaKind::Image,
        format,
    })?;

    let img = image::open(input).map_err(|e| match e {
        ImageError::IoError(source) => ConversionError::Io { source },
        other => ConversionError::decode(format!("{}: {other}", input.display())),
    })?;

    tracing::debug!(
        "Encoding {}x{} {:?} image as {format}",
        img.width(),
        img.height(),
        img.color()
    );

    let img = prepare_for(img, target);

    if target == ImageFormat::Jpeg {
        let file = File::create(output)?;
        let encoder = JpegEncoder::new_with_quality(
            BufWriter::new(file),
            options.jpeg_quality.clamp(1, 100),
        );
        img.write_with_encoder(encoder).map_err(map_write_error)?;
    } else {
        img.save_with_format(output, target).map_err(map_write_error)?;
    }

    Ok(())
}
