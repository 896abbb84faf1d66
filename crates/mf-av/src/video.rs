//! Video re-encoding into a target container with ffmpeg.

use std::path::Path;

use mf_core::{ConversionError, MediaKind, OutputFormat};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Codec arguments for each target container.
///
/// Every container gets an explicit video and audio encoder that it is known
/// to carry, rather than relying on ffmpeg's per-build defaults.
pub fn video_codec_args(format: OutputFormat) -> Option<&'static [&'static str]> {
    let args: &'static [&'static str] = match format {
        OutputFormat::Mp4 => &[
            "-c:v", "libx264", "-c:a", "aac", "-movflags", "+faststart",
        ],
        OutputFormat::Mov => &["-c:v", "libx264", "-c:a", "aac"],
        OutputFormat::Mkv => &["-c:v", "libx264", "-c:a", "aac"],
        OutputFormat::Flv => &["-c:v", "libx264", "-c:a", "aac"],
        OutputFormat::WebM => &["-c:v", "libvpx-vp9", "-c:a", "libopus"],
        OutputFormat::Avi => &["-c:v", "mpeg4", "-c:a", "libmp3lame"],
        OutputFormat::Wmv => &["-c:v", "wmv2", "-c:a", "wmav2"],
        _ => return None,
    };
    Some(args)
}

/// Transcode `input` into the `format` container at `output`.
///
/// Subtitle and data streams are not carried over. An existing file at
/// `output` is overwritten.
pub async fn transcode_video(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    format: OutputFormat,
) -> Result<(), ConversionError> {
    let codec_args = video_codec_args(format).ok_or(ConversionError::Unsupported {
        kind: MediaKind::Video,
        format,
    })?;
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!("ffmpeg video {:?} -> {format}", input);

    let mut cmd = ToolCommand::for_tool(ffmpeg);
    cmd.args(["-hide_banner", "-nostdin", "-y", "-i"])
        .path_arg(input)
        .args(["-map", "0:v:0", "-map", "0:a?"])
        .args(codec_args.iter().copied())
        .path_arg(output);
    cmd.execute().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_video_format_has_codec_args() {
        for &format in MediaKind::Video.formats() {
            let args = video_codec_args(format).unwrap();
            assert!(args.contains(&"-c:v"), "{format}");
            assert!(args.contains(&"-c:a"), "{format}");
        }
    }

    #[test]
    fn non_video_formats_have_no_args() {
        assert!(video_codec_args(OutputFormat::Mp3).is_none());
        assert!(video_codec_args(OutputFormat::Png).is_none());
    }

    #[test]
    fn mp4_gets_faststart() {
        let args = video_codec_args(OutputFormat::Mp4).unwrap();
        assert!(args.contains(&"+faststart"));
    }

    #[tokio::test]
    async fn requires_ffmpeg() {
        let err = transcode_video(
            &ToolRegistry::default(),
            Path::new("in.avi"),
            Path::new("out.mp4"),
            OutputFormat::Mp4,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConversionError::Tool { .. }));
    }
}
