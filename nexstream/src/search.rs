//! Search collaborator: extractor entries → track records

use crate::config_ext::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, StreamConfigExt};
use crate::error::{Error, Result};
use crate::extractor::MediaExtractor;
use crate::models::{SearchEntry, Track};
use nexconfig::Config;
use tracing::debug;

const UNKNOWN_TITLE: &str = "Unknown";
const UNKNOWN_ARTIST: &str = "Unknown artist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT as usize,
            max_limit: MAX_SEARCH_LIMIT as usize,
        }
    }
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> Self {
        let max_limit = (config.get_search_max_limit() as usize).max(1);
        let default_limit = (config.get_search_default_limit() as usize).clamp(1, max_limit);
        Self {
            default_limit,
            max_limit,
        }
    }

    /// Parses the raw `limit` query value and clamps it to `1..=max_limit`
    pub fn effective_limit(&self, raw: Option<&str>) -> Result<usize> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(self.default_limit),
            Some(raw) => raw,
        };

        let requested: i64 = raw
            .parse()
            .map_err(|_| Error::InvalidParameter("limit"))?;
        Ok(requested.clamp(1, self.max_limit as i64) as usize)
    }
}

impl Track {
    /// Builds a track record from a flat search entry; `None` without an id
    pub fn from_entry(entry: SearchEntry) -> Option<Self> {
        let id = entry
            .id
            .or(entry.video_id)
            .filter(|id| !id.trim().is_empty())?;

        let title = entry
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let artist = entry
            .uploader
            .filter(|a| !a.is_empty())
            .or(entry.channel.filter(|c| !c.is_empty()))
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let duration = entry
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d as u64)
            .unwrap_or(0);

        Some(Self {
            track_id: format!("yt_{}", id),
            track_name: title,
            artist_name: artist,
            collection_name: String::new(),
            collection_id: String::new(),
            artwork_url: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
            artwork_small: format!("https://i.ytimg.com/vi/{}/default.jpg", id),
            yt_video_id: id,
            duration,
            genre: String::new(),
            release_date: String::new(),
            track_number: 1,
            artist_id: String::new(),
            source: "youtube".to_string(),
            explicit: false,
        })
    }
}

/// Runs a search and maps the results to track records
///
/// An empty query returns no tracks without calling the extractor.
pub async fn search_tracks(
    extractor: &dyn MediaExtractor,
    query: &str,
    limit: usize,
) -> Result<Vec<Track>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let entries = extractor.search(query, limit).await?;
    let tracks: Vec<Track> = entries
        .into_iter()
        .filter_map(Track::from_entry)
        .take(limit)
        .collect();
    debug!(query, count = tracks.len(), "Search completed");
    Ok(tracks)
}
