//! Extension pour intégrer les réglages de streaming dans nexconfig
//!
//! Ce module fournit le trait `StreamConfigExt` qui ajoute à
//! `nexconfig::Config` les réglages du résolveur, du proxy, de l'extracteur
//! et de la recherche. Toutes les valeurs ont un défaut ; rien n'est écrit
//! sur disque.
//!
//! # Exemple
//!
//! ```no_run
//! use nexconfig::get_config;
//! use nexstream::StreamConfigExt;
//!
//! let config = get_config();
//! println!("cache TTL: {}s", config.get_stream_cache_ttl_secs());
//! println!("extractor: {}", config.get_extractor_program());
//! ```

use crate::extractor::{DEFAULT_FORMAT, DEFAULT_PROGRAM};
use crate::proxy::{DEFAULT_CHUNK_SIZE, DEFAULT_UPSTREAM_TIMEOUT, DEFAULT_USER_AGENT};
use nexconfig::{Config, impl_string_config, impl_u64_config};

/// Default lifetime of a cache entry, in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Canonical watch URL built from a bare identifier
pub const DEFAULT_WATCH_URL_TEMPLATE: &str = "https://www.youtube.com/watch?v={id}";

/// Default number of search results
pub const DEFAULT_SEARCH_LIMIT: u64 = 25;

/// Hard cap on the number of search results
pub const MAX_SEARCH_LIMIT: u64 = 50;

/// Trait d'extension pour les réglages du service de streaming
pub trait StreamConfigExt {
    // ========================================================================
    // Resolver / proxy
    // ========================================================================

    /// TTL of a resolved URL in the cache (default: 3600)
    fn get_stream_cache_ttl_secs(&self) -> u64;
    fn set_stream_cache_ttl_secs(&self, secs: u64) -> anyhow::Result<()>;

    /// Bound on connect + response head from the upstream (default: 30)
    fn get_stream_upstream_timeout_secs(&self) -> u64;
    fn set_stream_upstream_timeout_secs(&self, secs: u64) -> anyhow::Result<()>;

    /// Size of the chunks relayed to the client (default: 16384)
    fn get_stream_chunk_size(&self) -> u64;
    fn set_stream_chunk_size(&self, size: u64) -> anyhow::Result<()>;

    /// User-Agent sent upstream
    fn get_stream_user_agent(&self) -> String;
    fn set_stream_user_agent(&self, ua: String) -> anyhow::Result<()>;

    // ========================================================================
    // Extractor
    // ========================================================================

    fn get_extractor_program(&self) -> String;
    fn set_extractor_program(&self, program: String) -> anyhow::Result<()>;

    fn get_extractor_format(&self) -> String;
    fn set_extractor_format(&self, format: String) -> anyhow::Result<()>;

    /// Template with a `{id}` placeholder
    fn get_extractor_watch_url_template(&self) -> String;
    fn set_extractor_watch_url_template(&self, template: String) -> anyhow::Result<()>;

    // ========================================================================
    // Search
    // ========================================================================

    fn get_search_default_limit(&self) -> u64;
    fn set_search_default_limit(&self, limit: u64) -> anyhow::Result<()>;

    fn get_search_max_limit(&self) -> u64;
    fn set_search_max_limit(&self, limit: u64) -> anyhow::Result<()>;
}

impl StreamConfigExt for Config {
    impl_u64_config!(
        get_stream_cache_ttl_secs,
        set_stream_cache_ttl_secs,
        &["stream", "cache_ttl_secs"],
        DEFAULT_CACHE_TTL_SECS
    );
    impl_u64_config!(
        get_stream_upstream_timeout_secs,
        set_stream_upstream_timeout_secs,
        &["stream", "upstream_timeout_secs"],
        DEFAULT_UPSTREAM_TIMEOUT.as_secs()
    );
    impl_u64_config!(
        get_stream_chunk_size,
        set_stream_chunk_size,
        &["stream", "chunk_size"],
        DEFAULT_CHUNK_SIZE as u64
    );
    impl_string_config!(
        get_stream_user_agent,
        set_stream_user_agent,
        &["stream", "user_agent"],
        DEFAULT_USER_AGENT
    );

    impl_string_config!(
        get_extractor_program,
        set_extractor_program,
        &["extractor", "program"],
        DEFAULT_PROGRAM
    );
    impl_string_config!(
        get_extractor_format,
        set_extractor_format,
        &["extractor", "format"],
        DEFAULT_FORMAT
    );
    impl_string_config!(
        get_extractor_watch_url_template,
        set_extractor_watch_url_template,
        &["extractor", "watch_url_template"],
        DEFAULT_WATCH_URL_TEMPLATE
    );

    impl_u64_config!(
        get_search_default_limit,
        set_search_default_limit,
        &["search", "default_limit"],
        DEFAULT_SEARCH_LIMIT
    );
    impl_u64_config!(
        get_search_max_limit,
        set_search_max_limit,
        &["search", "max_limit"],
        MAX_SEARCH_LIMIT
    );
}
