//! # mf-av
//!
//! Codec backends and external tool management for mediaforge.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Image conversion** ([`convert_image`]) -- in-process re-encoding with
//!   the `image` crate.
//! - **Audio conversion** ([`transcode_to_wav`], [`transcode_audio`]) --
//!   in-process PCM decoding with `symphonia`/`hound`, or ffmpeg.
//! - **Video conversion** ([`transcode_video`]) -- ffmpeg re-encoding into a
//!   target container.

pub mod audio;
pub mod command;
pub mod images;
pub mod tools;
pub mod video;

// ---- Re-exports for convenience ----

pub use audio::{ffmpeg_audio_codec, transcode_audio, transcode_to_wav};
pub use command::{ToolCommand, ToolOutput};
pub use images::{convert_image, ImageOptions};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use video::{transcode_video, video_codec_args};
