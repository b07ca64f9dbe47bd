//! Range-aware streaming proxy
//!
//! The proxy resolves an identifier, opens the upstream URL with the client's
//! `Range` header forwarded verbatim, and relays the body chunk by chunk. The
//! upstream status (200, 206, ...) is passed through unchanged so clients can
//! seek. Chunks hold at most 16 KiB and are never empty (`ReaderStream` ends
//! on a zero-length read). Nothing is buffered beyond one chunk: the body is a
//! stream polled by the HTTP server, and dropping it drops the upstream
//! connection.

use crate::config_ext::StreamConfigExt;
use crate::error::{Error, Result};
use crate::resolver::StreamResolver;
use axum::{
    body::Body,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use nexconfig::Config;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, warn};

/// Size of the chunks relayed to the client (16 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Bound on connecting and receiving the upstream response head
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser User-Agent; some media hosts refuse unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Content type used when the upstream does not send one
pub const DEFAULT_CONTENT_TYPE: &str = "audio/webm";

/// Proxy tunables
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub timeout: Duration,
    pub chunk_size: usize,
    pub user_agent: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ProxySettings {
    pub fn from_config(config: &Config) -> Self {
        let chunk_size = usize::try_from(config.get_stream_chunk_size())
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        Self {
            timeout: Duration::from_secs(config.get_stream_upstream_timeout_secs()),
            chunk_size,
            user_agent: config.get_stream_user_agent(),
        }
    }
}

/// One proxy call
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub identifier: String,
    /// Client `Range` header, forwarded as-is
    pub client_range: Option<HeaderValue>,
}

impl StreamRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            client_range: None,
        }
    }

    pub fn with_range(mut self, range: Option<HeaderValue>) -> Self {
        self.client_range = range;
        self
    }
}

/// Upstream response ready to be relayed
///
/// The body yields an `io::Error` if the upstream fails mid-transfer, which
/// makes the HTTP server abort the client connection instead of ending the
/// response cleanly.
pub struct ProxiedStream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BoxStream<'static, io::Result<Bytes>>,
}

impl std::fmt::Debug for ProxiedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxiedStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for ProxiedStream {
    fn into_response(self) -> Response {
        (self.status, self.headers, Body::from_stream(self.body)).into_response()
    }
}

/// Headers sent to the client for a given upstream response
///
/// `Content-Type` falls back to `audio/webm`, `Accept-Ranges: bytes` is always
/// advertised, `Content-Length` and `Content-Range` are copied when present.
pub fn client_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = upstream
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    for name in [CONTENT_LENGTH, CONTENT_RANGE] {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    headers
}

/// Resolve-then-relay proxy
pub struct StreamProxy {
    client: reqwest::Client,
    resolver: Arc<StreamResolver>,
    settings: ProxySettings,
}

impl StreamProxy {
    pub fn new(resolver: Arc<StreamResolver>, settings: ProxySettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            resolver,
            settings,
        })
    }

    pub fn resolver(&self) -> &Arc<StreamResolver> {
        &self.resolver
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// Resolves `request.identifier` and opens the upstream stream
    ///
    /// A resolution failure is returned before any upstream request is made.
    pub async fn proxy(&self, request: StreamRequest) -> Result<ProxiedStream> {
        let identifier = request.identifier.trim();
        if identifier.is_empty() {
            return Err(Error::MissingParameter("id"));
        }

        let url = self.resolver.resolve(identifier).await?;
        self.open_upstream(&url, request.client_range.as_ref()).await
    }

    /// Opens `url` and prepares the relayed response
    pub async fn open_upstream(
        &self,
        url: &str,
        range: Option<&HeaderValue>,
    ) -> Result<ProxiedStream> {
        let mut request = self.client.get(url);
        if let Some(range) = range {
            request = request.header(RANGE, range.clone());
        }

        let response = tokio::time::timeout(self.settings.timeout, request.send())
            .await
            .map_err(|_| Error::Timeout(self.settings.timeout))??;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus(status));
        }
        debug!(status = %status, range = ?range, "Upstream stream opened");

        let headers = client_headers(response.headers());

        let reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
        let body = ReaderStream::with_capacity(reader, self.settings.chunk_size)
            .inspect_err(|e| warn!(error = %e, "Upstream stream interrupted"))
            .boxed();

        Ok(ProxiedStream {
            status,
            headers,
            body,
        })
    }
}
