//! Resolve, cache and proxy audio streams for NexSon
//!
//! This crate turns a media identifier into a playable, seekable audio
//! stream:
//!
//! - **Resolution**: a [`MediaExtractor`] (by default the `yt-dlp` command line
//!   tool) describes the media; [`select_audio_url`] picks the audio-only URL.
//! - **Cache**: resolved URLs are kept in a [`ResolutionCache`] for one hour
//!   (configurable) since upstream URLs are time-limited.
//! - **Proxy**: [`StreamProxy`] forwards the client `Range` header, relays
//!   200/206 responses with their `Content-Range`, and streams the body in
//!   16 KiB chunks.
//! - **Search**: flat search results mapped to track records.
//!
//! # Example
//!
//! ```no_run
//! use nexserver::ServerBuilder;
//! use nexstream::NexStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new_configured().build();
//!     server.init_music_service().await?;
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```
//!
//! # HTTP endpoints
//!
//! - `GET /health` → `{"status": "ok", "service": "<name>"}`
//! - `GET /search?q=<term>&limit=<n>` → array of track records
//! - `GET /stream?id=<identifier>` → raw audio, 200 or 206
//!
//! Failures are returned as `{"error": "<message>"}` with 400, 404 or 500.

pub mod api_rest;
pub mod cache;
pub mod config_ext;
pub mod error;
pub mod extractor;
pub mod models;
pub mod proxy;
pub mod resolver;
pub mod search;
pub mod server_ext;

pub use api_rest::{AppError, StreamApiDoc, create_router};
pub use cache::{CacheEntry, DEFAULT_TTL, ResolutionCache};
pub use config_ext::StreamConfigExt;
pub use error::{Error, Result};
pub use extractor::{MediaExtractor, YtDlpExtractor};
pub use models::{MediaFormat, MediaInfo, SearchEntry, Track};
pub use proxy::{ProxiedStream, ProxySettings, StreamProxy, StreamRequest, client_headers};
pub use resolver::{ResolverSettings, StreamResolver, select_audio_url};
pub use search::{SearchSettings, search_tracks};
pub use server_ext::{MusicService, NexStreamExt};
