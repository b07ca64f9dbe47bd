//! Identifier → direct audio URL resolution
//!
//! [`StreamResolver::resolve`] consults the [`ResolutionCache`] first and only
//! calls the [`MediaExtractor`] on a miss. Successful resolutions are cached;
//! failures never are, so the next request retries the extraction.

use crate::cache::{DEFAULT_TTL, ResolutionCache};
use crate::config_ext::{DEFAULT_WATCH_URL_TEMPLATE, StreamConfigExt};
use crate::error::{Error, Result};
use crate::extractor::{DEFAULT_FORMAT, MediaExtractor};
use crate::models::MediaInfo;
use nexconfig::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Resolver tunables
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub ttl: Duration,
    pub format: String,
    /// Canonical reference template, `{id}` is replaced by the identifier
    pub watch_url_template: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            format: DEFAULT_FORMAT.to_string(),
            watch_url_template: DEFAULT_WATCH_URL_TEMPLATE.to_string(),
        }
    }
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: Duration::from_secs(config.get_stream_cache_ttl_secs()),
            format: config.get_extractor_format(),
            watch_url_template: config.get_extractor_watch_url_template(),
        }
    }
}

/// Picks the playable audio URL out of extractor metadata
///
/// The top-level `url` wins when non-empty. Otherwise the last audio-only
/// format (`vcodec == "none"`) with a non-empty URL is taken.
pub fn select_audio_url(info: &MediaInfo) -> Option<String> {
    if let Some(url) = info.url.as_deref().filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }

    info.formats()
        .iter()
        .filter(|f| f.is_audio_only())
        .filter_map(|f| f.usable_url())
        .last()
        .map(str::to_string)
}

/// Resolves identifiers to direct audio URLs, through the cache
pub struct StreamResolver {
    cache: Arc<ResolutionCache>,
    extractor: Arc<dyn MediaExtractor>,
    settings: ResolverSettings,
}

impl StreamResolver {
    pub fn new(
        cache: Arc<ResolutionCache>,
        extractor: Arc<dyn MediaExtractor>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            cache,
            extractor,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Canonical reference handed to the extractor
    pub fn media_reference(&self, identifier: &str) -> String {
        self.settings.watch_url_template.replace("{id}", identifier)
    }

    /// Returns a playable URL for `identifier`
    ///
    /// # Errors
    ///
    /// - [`Error::NoStreamResolvable`] when the metadata holds no usable URL
    /// - any extractor failure, unchanged
    pub async fn resolve(&self, identifier: &str) -> Result<String> {
        if let Some(url) = self.cache.get(identifier) {
            debug!(identifier, "Resolution cache hit");
            return Ok(url);
        }

        let reference = self.media_reference(identifier);
        info!(identifier, reference = %reference, "Resolving stream URL");

        let media = self
            .extractor
            .extract(&reference, &self.settings.format)
            .await?;

        let url = select_audio_url(&media)
            .ok_or_else(|| Error::NoStreamResolvable(identifier.to_string()))?;

        self.cache.put(identifier, &url, self.settings.ttl);
        debug!(identifier, ttl = ?self.settings.ttl, "Stream URL cached");
        Ok(url)
    }
}
