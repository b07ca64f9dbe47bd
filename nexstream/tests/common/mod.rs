//! Shared helpers for the nexstream integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use nexconfig::Config;
use nexstream::{Error, MediaExtractor, MediaInfo, MusicService, Result, SearchEntry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory extractor returning scripted answers and counting calls
#[derive(Default)]
pub struct ScriptedExtractor {
    media: Mutex<Option<MediaInfo>>,
    entries: Vec<SearchEntry>,
    search_failure: Option<String>,
    extract_calls: AtomicUsize,
    search_calls: AtomicUsize,
    last_reference: Mutex<Option<String>>,
    last_limit: Mutex<Option<usize>>,
}

impl ScriptedExtractor {
    /// Extraction yields `url` as the top-level URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::with_media(MediaInfo {
            url: Some(url.into()),
            ..Default::default()
        })
    }

    pub fn with_media(media: MediaInfo) -> Self {
        Self {
            media: Mutex::new(Some(media)),
            ..Default::default()
        }
    }

    /// Every extraction fails
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<SearchEntry>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    pub fn with_search_failure(message: &str) -> Self {
        Self {
            search_failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn set_url(&self, url: &str) {
        *self.media.lock().unwrap() = Some(MediaInfo {
            url: Some(url.to_string()),
            ..Default::default()
        });
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn last_reference(&self) -> Option<String> {
        self.last_reference.lock().unwrap().clone()
    }

    pub fn last_limit(&self) -> Option<usize> {
        *self.last_limit.lock().unwrap()
    }
}

#[async_trait]
impl MediaExtractor for ScriptedExtractor {
    async fn extract(&self, reference: &str, _format: &str) -> Result<MediaInfo> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_reference.lock().unwrap() = Some(reference.to_string());
        self.media
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::extraction("ERROR: Video unavailable"))
    }

    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchEntry>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(limit);
        match &self.search_failure {
            Some(message) => Err(Error::extraction(message.clone())),
            None => Ok(self.entries.clone()),
        }
    }
}

/// Search entry with an id and a title
pub fn entry(id: &str, title: &str) -> SearchEntry {
    SearchEntry {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        uploader: Some("Uploader".to_string()),
        duration: Some(180.0),
        ..Default::default()
    }
}

/// Service with default settings around `extractor`
pub fn service(extractor: Arc<ScriptedExtractor>) -> MusicService {
    MusicService::with_extractor(&Config::defaults(), extractor).unwrap()
}
