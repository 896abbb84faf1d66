//! Audio conversion backends.
//!
//! Two paths share one contract:
//!
//! - [`transcode_to_wav`] decodes in process with `symphonia` and writes
//!   16-bit PCM with `hound`. No external tools required.
//! - [`transcode_audio`] shells out to ffmpeg for encoders Rust has no
//!   first-class crate for (MP3, AAC, FLAC, Vorbis, WMA).

use std::fs::File;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use mf_core::{ConversionError, MediaKind, OutputFormat};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// ffmpeg encoder name for an audio output format.
pub fn ffmpeg_audio_codec(format: OutputFormat) -> Option<&'static str> {
    match format {
        OutputFormat::Mp3 => Some("libmp3lame"),
        OutputFormat::Wav => Some("pcm_s16le"),
        OutputFormat::Aac => Some("aac"),
        OutputFormat::Flac => Some("flac"),
        OutputFormat::Ogg => Some("libvorbis"),
        OutputFormat::Wma => Some("wmav2"),
        _ => None,
    }
}

/// Transcode `input` to `format` at `output` with ffmpeg.
///
/// Video streams (e.g. embedded cover art) are dropped. An existing file at
/// `output` is overwritten.
pub async fn transcode_audio(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    format: OutputFormat,
) -> Result<(), ConversionError> {
    let codec = ffmpeg_audio_codec(format).ok_or(ConversionError::Unsupported {
        kind: MediaKind::Audio,
        format,
    })?;
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!("ffmpeg audio {:?} -> {format}", input);

    let mut cmd = ToolCommand::for_tool(ffmpeg);
    cmd.args(["-hide_banner", "-nostdin", "-y", "-i"])
        .path_arg(input)
        .args(["-vn", "-c:a", codec])
        .path_arg(output);
    cmd.execute().await?;

    Ok(())
}

fn map_symphonia(err: SymphoniaError) -> ConversionError {
    match err {
        SymphoniaError::IoError(source) => ConversionError::Io { source },
        other => ConversionError::decode(other),
    }
}

/// Decode any supported audio file and write it as 16-bit PCM WAV.
///
/// Blocking; async callers should run it on a blocking thread. Sample rate
/// and channel count are taken from the first audio track.
///
/// Samples go to a temporary file next to `output`, which replaces `output`
/// only once the whole input has been decoded. A failed conversion leaves
/// any existing file at `output` untouched, and an `output` equal to
/// `input` is never truncated while it is still being read.
pub fn transcode_to_wav(input: &Path, output: &Path) -> Result<(), ConversionError> {
    let file = File::open(input)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = input.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(map_symphonia)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ConversionError::decode("no audio track found"))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(map_symphonia)?;

    let out_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".mediaforge-")
        .suffix(".wav")
        .tempfile_in(out_dir)?;

    let mut writer: Option<WavWriter<std::io::BufWriter<File>>> = None;
    let mut frames: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(map_symphonia(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is skipped rather than failing the file.
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::warn!("Skipping undecodable packet in {:?}: {msg}", input);
                continue;
            }
            Err(e) => return Err(map_symphonia(e)),
        };

        let spec = *decoded.spec();
        let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        samples.copy_interleaved_ref(decoded);

        if writer.is_none() {
            let wav_spec = WavSpec {
                channels: spec.channels.count() as u16,
                sample_rate: spec.rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            writer = Some(WavWriter::create(staging.path(), wav_spec).map_err(map_hound)?);
        }

        if let Some(wav) = writer.as_mut() {
            for &sample in samples.samples() {
                wav.write_sample(sample).map_err(map_hound)?;
            }
        }
        frames += (samples.samples().len() / spec.channels.count().max(1)) as u64;
    }

    let writer = writer.ok_or_else(|| ConversionError::decode("no audio frames decoded"))?;
    writer.finalize().map_err(map_hound)?;
    staging
        .persist(output)
        .map_err(|e| ConversionError::Io { source: e.error })?;

    tracing::debug!("Wrote {frames} frames to {:?}", output);

    Ok(())
}

fn map_hound(err: hound::Error) -> ConversionError {
    match err {
        hound::Error::IoError(source) => ConversionError::Io { source },
        other => ConversionError::encode(other),
    }
}
