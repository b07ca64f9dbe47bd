//! Data structures exchanged with the extractor and the HTTP clients

use serde::{Deserialize, Serialize};

/// Metadata returned by the extractor for a single media item
///
/// Only the fields the resolver needs are kept; everything else in the
/// extractor output is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Direct URL of the format the extractor selected, if any
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<MediaFormat>>,
}

impl MediaInfo {
    pub fn formats(&self) -> &[MediaFormat] {
        self.formats.as_deref().unwrap_or_default()
    }
}

/// One entry of the `formats` list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub abr: Option<f64>,
}

impl MediaFormat {
    /// Audio-only formats carry `vcodec: "none"`
    pub fn is_audio_only(&self) -> bool {
        self.vcodec.as_deref() == Some("none")
    }

    /// The format URL, when present and non-empty
    pub fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Flat search result as returned by the extractor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "videoId")]
    pub video_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Playlist-shaped output of a search query; failed entries come back as `null`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub entries: Option<Vec<Option<SearchEntry>>>,
}

/// Track record sent to the web client by `/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub collection_name: String,
    pub collection_id: String,
    pub artwork_url: String,
    pub artwork_small: String,
    pub yt_video_id: String,
    /// Duration in whole seconds (0 when unknown)
    pub duration: u64,
    pub genre: String,
    pub release_date: String,
    pub track_number: u32,
    pub artist_id: String,
    pub source: String,
    pub explicit: bool,
}
