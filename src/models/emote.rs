use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// MIME type of an encoded image variant
///
/// The upstream reports free-form strings; the four formats the archive knows
/// how to name get their own variant and everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MimeType {
    Webp,
    Gif,
    Avif,
    Png,
    Other(String),
}

impl MimeType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "image/webp" => Self::Webp,
            "image/gif" => Self::Gif,
            "image/avif" => Self::Avif,
            "image/png" => Self::Png,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Preference rank used by variant selection, higher wins
    pub fn rank(&self) -> u8 {
        match self {
            Self::Webp => 4,
            Self::Gif => 3,
            Self::Avif => 2,
            Self::Png => 1,
            Self::Other(_) => 0,
        }
    }

    /// File extension (with the leading dot) used for archived objects
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => ".webp",
            Self::Gif => ".gif",
            Self::Avif => ".avif",
            Self::Png | Self::Other(_) => ".png",
        }
    }

    /// Inverse of [`MimeType::extension`] for the known formats
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "avif" => Some(Self::Avif),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Avif => "image/avif",
            Self::Png => "image/png",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encoded rendition of an emote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariant {
    pub url: String,
    pub mime: MimeType,
    pub scale: u32,
    pub width: u32,
    frame_count: u32,
}

impl ImageVariant {
    /// Frame counts below 1 are normalized to 1
    pub fn new(url: impl Into<String>, mime: MimeType, scale: u32, width: u32, frame_count: u32) -> Self {
        Self {
            url: url.into(),
            mime,
            scale,
            width,
            frame_count: frame_count.max(1),
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }
}

/// A catalog record as returned by the upstream, before archival
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub variants: Vec<ImageVariant>,
    pub ranking: Option<i64>,
}

/// Normalized record of an emote held in object storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedEmote {
    #[schema(example = "60ae958e229664e8667aea38_static.webp")]
    pub file_name: String,
    pub url: String,
    pub emote_id: String,
    #[schema(example = "Kappa")]
    pub emote_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "image/webp")]
    pub mime: Option<String>,
}
