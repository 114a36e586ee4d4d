//! Media type detection from raw bytes.
//!
//! Classification never looks at filenames or declared types. It runs an
//! ordered list of magic-number checks over the first few bytes and falls
//! back to a printable-text heuristic, then to `application/octet-stream`.
//!
//! Order matters: the QuickTime check (`free` at offset 4) also matches some
//! MP4 files, so MP4 is tested first and wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many leading bytes the text heuristic inspects.
pub const TEXT_SNIFF_LEN: usize = 1024;

/// The fixed set of media types the gateway distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Pdf,
    Mp4,
    Avi,
    QuickTime,
    Mp3,
    Wav,
    Zip,
    Text,
    OctetStream,
}

impl MediaType {
    pub const ALL: [MediaType; 13] = [
        MediaType::Jpeg,
        MediaType::Png,
        MediaType::Gif,
        MediaType::Webp,
        MediaType::Pdf,
        MediaType::Mp4,
        MediaType::Avi,
        MediaType::QuickTime,
        MediaType::Mp3,
        MediaType::Wav,
        MediaType::Zip,
        MediaType::Text,
        MediaType::OctetStream,
    ];

    /// The MIME label, e.g. `image/jpeg`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
            MediaType::Pdf => "application/pdf",
            MediaType::Mp4 => "video/mp4",
            MediaType::Avi => "video/x-msvideo",
            MediaType::QuickTime => "video/quicktime",
            MediaType::Mp3 => "audio/mpeg",
            MediaType::Wav => "audio/wav",
            MediaType::Zip => "application/zip",
            MediaType::Text => "text/plain",
            MediaType::OctetStream => "application/octet-stream",
        }
    }

    /// File extension (without the dot) used when a name has none.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
            MediaType::Gif => "gif",
            MediaType::Webp => "webp",
            MediaType::Pdf => "pdf",
            MediaType::Mp4 => "mp4",
            MediaType::Avi => "avi",
            MediaType::QuickTime => "mov",
            MediaType::Mp3 => "mp3",
            MediaType::Wav => "wav",
            MediaType::Zip => "zip",
            MediaType::Text => "txt",
            MediaType::OctetStream => "bin",
        }
    }

    /// Look up a label. Unknown labels map to `OctetStream`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(MediaType::OctetStream)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MediaType::Text)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl From<MediaType> for String {
    fn from(m: MediaType) -> Self {
        m.as_str().to_string()
    }
}

impl From<String> for MediaType {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

/// `bytes[offset..offset + pat.len()] == pat`, false if the buffer is too short.
fn has_at(bytes: &[u8], offset: usize, pat: &[u8]) -> bool {
    bytes
        .get(offset..offset + pat.len())
        .is_some_and(|window| window == pat)
}

fn is_riff(bytes: &[u8], form: &[u8; 4]) -> bool {
    has_at(bytes, 0, b"RIFF") && has_at(bytes, 8, form)
}

/// Classify a payload by its leading bytes.
///
/// Total and deterministic: every input yields a media type.
pub fn classify(bytes: &[u8]) -> MediaType {
    if has_at(bytes, 0, &[0xFF, 0xD8, 0xFF]) {
        return MediaType::Jpeg;
    }
    if has_at(bytes, 0, &[0x89, b'P', b'N', b'G']) {
        return MediaType::Png;
    }
    if has_at(bytes, 0, b"GIF87a") || has_at(bytes, 0, b"GIF89a") {
        return MediaType::Gif;
    }
    if is_riff(bytes, b"WEBP") {
        return MediaType::Webp;
    }
    if has_at(bytes, 0, b"%PDF") {
        return MediaType::Pdf;
    }
    // The 00 00 00 18 box size is a common variant of the same `ftyp` check.
    if has_at(bytes, 4, b"ftyp") {
        return MediaType::Mp4;
    }
    if is_riff(bytes, b"AVI ") {
        return MediaType::Avi;
    }
    if has_at(bytes, 4, b"free") {
        return MediaType::QuickTime;
    }
    if has_at(bytes, 0, &[0xFF, 0xFB]) || has_at(bytes, 0, b"ID3") {
        return MediaType::Mp3;
    }
    if is_riff(bytes, b"WAVE") {
        return MediaType::Wav;
    }
    if has_at(bytes, 0, &[b'P', b'K', 0x03, 0x04]) {
        return MediaType::Zip;
    }
    if looks_like_text(bytes) {
        return MediaType::Text;
    }
    MediaType::OctetStream
}

/// Printable-text heuristic over the first [`TEXT_SNIFF_LEN`] bytes.
///
/// NUL or any control byte other than tab, LF and CR disqualifies. Bytes past
/// the sniff window are never examined. An empty buffer is not text.
pub fn looks_like_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let window = &bytes[..bytes.len().min(TEXT_SNIFF_LEN)];
    window
        .iter()
        .all(|&b| b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\r'))
}
