//! Media kinds, input extension table and output format catalog.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// The kind of media a file holds. Fixed, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".bmp", ".gif", ".webp", ".tiff"];
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".aac", ".flac", ".ogg", ".wma"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mkv", ".webm", ".mov", ".flv", ".wmv"];

const IMAGE_FORMATS: &[OutputFormat] = &[
    OutputFormat::Png,
    OutputFormat::Jpeg,
    OutputFormat::Bmp,
    OutputFormat::Gif,
    OutputFormat::Webp,
    OutputFormat::Tiff,
];
const AUDIO_FORMATS: &[OutputFormat] = &[
    OutputFormat::Mp3,
    OutputFormat::Wav,
    OutputFormat::Aac,
    OutputFormat::Flac,
    OutputFormat::Ogg,
    OutputFormat::Wma,
];
const VIDEO_FORMATS: &[OutputFormat] = &[
    OutputFormat::Mp4,
    OutputFormat::Avi,
    OutputFormat::Mkv,
    OutputFormat::WebM,
    OutputFormat::Mov,
    OutputFormat::Flv,
    OutputFormat::Wmv,
];

impl MediaKind {
    /// Every media kind, in presentation order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Image, MediaKind::Audio, MediaKind::Video];

    /// Recognized input extensions for this kind (lowercase, leading dot).
    ///
    /// The extension sets of different kinds are pairwise disjoint.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Image => IMAGE_EXTENSIONS,
            Self::Audio => AUDIO_EXTENSIONS,
            Self::Video => VIDEO_EXTENSIONS,
        }
    }

    /// Output formats a file of this kind can be converted to.
    pub fn formats(self) -> &'static [OutputFormat] {
        match self {
            Self::Image => IMAGE_FORMATS,
            Self::Audio => AUDIO_FORMATS,
            Self::Video => VIDEO_FORMATS,
        }
    }

    /// Whether `format` belongs to this kind's catalog.
    pub fn supports(self, format: OutputFormat) -> bool {
        self.formats().contains(&format)
    }

    /// Look up the kind owning a lowercase, dotted extension such as `".png"`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext))
    }

    /// Glob filter for file pickers, e.g. `*.png;*.jpg;...`.
    pub fn file_filter(self) -> String {
        self.extensions()
            .iter()
            .map(|ext| format!("*{ext}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(Error::Validation(format!("unknown media kind: {other}"))),
        }
    }
}

/// Classify a path by its extension.
///
/// The extension is compared case-insensitively, so `IMG.PNG` and `img.png`
/// classify identically. Returns `None` when the extension is missing or not
/// in any kind's table.
pub fn classify(path: impl AsRef<Path>) -> Option<MediaKind> {
    let ext = path.as_ref().extension()?.to_str()?;
    MediaKind::from_extension(&format!(".{}", ext.to_lowercase()))
}

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// A conversion target. Every format belongs to exactly one [`MediaKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    // Image
    Png,
    Jpeg,
    Bmp,
    Gif,
    Webp,
    Tiff,
    // Audio
    Mp3,
    Wav,
    Aac,
    Flac,
    Ogg,
    Wma,
    // Video
    Mp4,
    Avi,
    Mkv,
    WebM,
    Mov,
    Flv,
    Wmv,
}

impl OutputFormat {
    /// The media kind whose catalog contains this format.
    pub fn kind(self) -> MediaKind {
        match self {
            Self::Png | Self::Jpeg | Self::Bmp | Self::Gif | Self::Webp | Self::Tiff => {
                MediaKind::Image
            }
            Self::Mp3 | Self::Wav | Self::Aac | Self::Flac | Self::Ogg | Self::Wma => {
                MediaKind::Audio
            }
            Self::Mp4 | Self::Avi | Self::Mkv | Self::WebM | Self::Mov | Self::Flv | Self::Wmv => {
                MediaKind::Video
            }
        }
    }

    /// File extension (no dot) written for this format: the lowercased
    /// format name.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Wma => "wma",
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mkv => "mkv",
            Self::WebM => "webm",
            Self::Mov => "mov",
            Self::Flv => "flv",
            Self::Wmv => "wmv",
        }
    }

    /// File name for the converted output of a source with the given stem.
    pub fn output_file_name(self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim_start_matches('.').to_ascii_lowercase();
        let alias = match lower.as_str() {
            "jpg" => "jpeg",
            "tif" => "tiff",
            other => other,
        };
        MediaKind::ALL
            .iter()
            .flat_map(|kind| kind.formats().iter().copied())
            .find(|format| format.extension() == alias)
            .ok_or_else(|| Error::Validation(format!("unknown output format: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn extension_sets_are_disjoint() {
        let mut seen = HashSet::new();
        for kind in MediaKind::ALL {
            for ext in kind.extensions() {
                assert!(seen.insert(*ext), "{ext} listed twice");
            }
        }
    }

    #[test]
    fn every_format_belongs_to_exactly_one_catalog() {
        for kind in MediaKind::ALL {
            for format in kind.formats() {
                assert_eq!(format.kind(), kind);
                let owners = MediaKind::ALL
                    .iter()
                    .filter(|k| k.supports(*format))
                    .count();
                assert_eq!(owners, 1, "{format} in {owners} catalogs");
            }
        }
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(classify("IMG.PNG"), Some(MediaKind::Image));
        assert_eq!(classify("img.png"), classify("IMG.PNG"));
        assert_eq!(classify("/music/Song.Mp3"), Some(MediaKind::Audio));
        assert_eq!(classify("clip.WebM"), Some(MediaKind::Video));
    }

    #[test]
    fn classify_unknown_or_missing_extension() {
        assert_eq!(classify("notes.txt"), None);
        assert_eq!(classify("README"), None);
        assert_eq!(classify(".hidden"), None);
    }

    #[test]
    fn output_extension_is_lowercased_name() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
        assert_eq!(OutputFormat::WebM.extension(), "webm");
        assert_eq!(OutputFormat::Mp3.output_file_name("song"), "song.mp3");
    }

    #[test]
    fn parse_format_with_aliases() {
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("jpg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!(".webm".parse::<OutputFormat>().unwrap(), OutputFormat::WebM);
        assert!("mp5".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn parse_kind() {
        assert_eq!("Audio".parse::<MediaKind>().unwrap(), MediaKind::Audio);
        assert!("text".parse::<MediaKind>().is_err());
    }

    #[test]
    fn file_filter_lists_all_extensions() {
        assert_eq!(
            MediaKind::Audio.file_filter(),
            "*.mp3;*.wav;*.aac;*.flac;*.ogg;*.wma"
        );
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&OutputFormat::WebM).unwrap();
        assert_eq!(json, "\"webm\"");
        let kind: MediaKind = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(kind, MediaKind::Video);
    }
}
