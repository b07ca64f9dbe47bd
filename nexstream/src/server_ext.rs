//! Extension nexserver pour le service musical
//!
//! Ce module fournit l'état partagé des handlers ([`MusicService`]) et le trait
//! d'extension [`NexStreamExt`] qui enregistre les routes `/health`, `/search`
//! et `/stream` sur un `nexserver::Server`, sans que nexserver dépende de
//! nexstream.

use crate::api_rest::{StreamApiDoc, create_router};
use crate::cache::ResolutionCache;
use crate::config_ext::StreamConfigExt;
use crate::extractor::{MediaExtractor, YtDlpExtractor};
use crate::proxy::{ProxySettings, StreamProxy};
use crate::resolver::{ResolverSettings, StreamResolver};
use crate::search::SearchSettings;
use anyhow::Result;
use nexconfig::Config;
use nexserver::Server;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

/// État partagé pour les handlers du service
///
/// Built once at startup; every field is shared by reference, so cloning is
/// cheap and all clones see the same cache.
#[derive(Clone)]
pub struct MusicService {
    pub service_name: String,
    pub cache: Arc<ResolutionCache>,
    pub extractor: Arc<dyn MediaExtractor>,
    pub resolver: Arc<StreamResolver>,
    pub proxy: Arc<StreamProxy>,
    pub search: SearchSettings,
}

impl MusicService {
    /// Assembles the service around an existing extractor
    pub fn new(
        service_name: impl Into<String>,
        extractor: Arc<dyn MediaExtractor>,
        resolver_settings: ResolverSettings,
        proxy_settings: ProxySettings,
        search: SearchSettings,
    ) -> Result<Self> {
        let cache = Arc::new(ResolutionCache::new());
        let resolver = Arc::new(StreamResolver::new(
            cache.clone(),
            extractor.clone(),
            resolver_settings,
        ));
        let proxy = Arc::new(StreamProxy::new(resolver.clone(), proxy_settings)?);

        Ok(Self {
            service_name: service_name.into(),
            cache,
            extractor,
            resolver,
            proxy,
            search,
        })
    }

    /// Builds the service from configuration, with the `yt-dlp` extractor
    pub fn from_config(config: &Config) -> Result<Self> {
        let extractor = Arc::new(YtDlpExtractor::new(config.get_extractor_program()));
        Self::with_extractor(config, extractor)
    }

    /// Builds the service from configuration around a given extractor
    pub fn with_extractor(config: &Config, extractor: Arc<dyn MediaExtractor>) -> Result<Self> {
        Self::new(
            config.get_service_name(),
            extractor,
            ResolverSettings::from_config(config),
            ProxySettings::from_config(config),
            SearchSettings::from_config(config),
        )
    }
}

/// Trait pour étendre nexserver avec le service musical
///
/// # Exemple
///
/// ```rust,no_run
/// use nexserver::ServerBuilder;
/// use nexstream::NexStreamExt;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///     server.init_music_service().await?;
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait NexStreamExt {
    /// Construit le service depuis la configuration et enregistre ses routes
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /health`
    /// - `GET /search?q=<term>&limit=<n>`
    /// - `GET /stream?id=<identifier>`
    /// - Swagger UI sous `/swagger-ui/stream`
    async fn init_music_service(&mut self) -> Result<MusicService>;

    /// Enregistre les routes pour un service déjà construit
    async fn init_music_service_with(&mut self, service: MusicService) -> Result<MusicService>;
}

impl NexStreamExt for Server {
    async fn init_music_service(&mut self) -> Result<MusicService> {
        let config = nexconfig::get_config();
        let service = MusicService::from_config(&config)?;
        self.init_music_service_with(service).await
    }

    async fn init_music_service_with(&mut self, service: MusicService) -> Result<MusicService> {
        info!("Initializing music service...");

        let router = create_router(service.clone());
        self.add_openapi(router, StreamApiDoc::openapi(), "stream")
            .await;

        info!(
            service = %service.service_name,
            "Music service endpoints available at /health, /search, /stream"
        );
        Ok(service)
    }
}
