//! HTTP endpoints driven through the axum router

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use common::{ScriptedExtractor, entry, service};
use nexserver::Server;
use nexstream::{MediaInfo, NexStreamExt, SearchEntry, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let router = create_router(service(Arc::new(ScriptedExtractor::failing())));
    let (status, body) = get_json(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "service": "NexSon Music Service"}));
}

#[tokio::test]
async fn test_stream_without_id_is_bad_request() {
    let extractor = Arc::new(ScriptedExtractor::with_url("https://media.example/a"));
    let router = create_router(service(extractor.clone()));

    let (status, body) = get_json(router.clone(), "/stream").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "missing id parameter"}));

    let (status, _) = get_json(router, "/stream?id=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(extractor.extract_calls(), 0);
}

#[tokio::test]
async fn test_stream_without_audio_is_not_found() {
    let extractor = Arc::new(ScriptedExtractor::with_media(MediaInfo::default()));
    let router = create_router(service(extractor.clone()));

    let (status, body) = get_json(router, "/stream?id=abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "could not resolve stream"}));
    assert_eq!(extractor.extract_calls(), 1);
}

#[tokio::test]
async fn test_stream_extraction_failure_is_internal_error() {
    let router = create_router(service(Arc::new(ScriptedExtractor::failing())));

    let (status, body) = get_json(router, "/stream?id=abc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "extraction failed: ERROR: Video unavailable"})
    );
}

#[tokio::test]
async fn test_stream_relays_partial_content() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio.webm"))
        .and(header("range", "bytes=0-3"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "bytes 0-3/4096")
                .set_body_raw(b"OggS".to_vec(), "audio/webm"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let extractor = Arc::new(ScriptedExtractor::with_url(format!(
        "{}/audio.webm",
        mock_server.uri()
    )));
    let router = create_router(service(extractor.clone()));

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/stream?id=abc")
                    .header("range", "bytes=0-3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()["content-range"], "bytes 0-3/4096");
        assert_eq!(response.headers()["accept-ranges"], "bytes");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OggS");
    }

    // la deuxième requête est servie depuis le cache
    assert_eq!(extractor.extract_calls(), 1);
}

#[tokio::test]
async fn test_search_with_empty_query_returns_empty_list() {
    let extractor = Arc::new(ScriptedExtractor::with_entries(vec![entry("abc", "Song")]));
    let router = create_router(service(extractor.clone()));

    let (status, body) = get_json(router.clone(), "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = get_json(router, "/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    assert_eq!(extractor.search_calls(), 0);
}

#[tokio::test]
async fn test_search_limit_is_capped() {
    let extractor = Arc::new(ScriptedExtractor::with_entries(vec![entry("abc", "Song")]));
    let router = create_router(service(extractor.clone()));

    let (status, _) = get_json(router.clone(), "/search?q=test&limit=100").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extractor.last_limit(), Some(50));

    let (status, _) = get_json(router, "/search?q=test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extractor.last_limit(), Some(25));
}

#[tokio::test]
async fn test_search_invalid_limit() {
    let extractor = Arc::new(ScriptedExtractor::with_entries(Vec::new()));
    let router = create_router(service(extractor.clone()));

    let (status, body) = get_json(router, "/search?q=test&limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid limit parameter"}));
    assert_eq!(extractor.search_calls(), 0);
}

#[tokio::test]
async fn test_search_maps_tracks() {
    let extractor = Arc::new(ScriptedExtractor::with_entries(vec![
        entry("dQw4w9WgXcQ", "Never Gonna Give You Up"),
        SearchEntry {
            title: Some("no id".to_string()),
            ..Default::default()
        },
        entry("9bZkp7q19f0", "Gangnam Style"),
    ]));
    let router = create_router(service(extractor));

    let (status, body) = get_json(router, "/search?q=pop").await;
    assert_eq!(status, StatusCode::OK);

    let tracks = body.as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["trackId"], "yt_dQw4w9WgXcQ");
    assert_eq!(tracks[0]["trackName"], "Never Gonna Give You Up");
    assert_eq!(tracks[0]["artistName"], "Uploader");
    assert_eq!(tracks[0]["duration"], 180);
    assert_eq!(tracks[0]["trackNumber"], 1);
    assert_eq!(tracks[0]["source"], "youtube");
    assert_eq!(tracks[1]["ytVideoId"], "9bZkp7q19f0");
}

#[tokio::test]
async fn test_search_failure_is_internal_error() {
    let extractor = Arc::new(ScriptedExtractor::with_search_failure("network down"));
    let router = create_router(service(extractor));

    let (status, body) = get_json(router, "/search?q=test").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "extraction failed: network down"}));
}

#[tokio::test]
async fn test_server_extension_registers_routes_with_cors() {
    let extractor = Arc::new(ScriptedExtractor::failing());
    let mut server = Server::new("NexSon test", "127.0.0.1", 0);
    server
        .init_music_service_with(service(extractor))
        .await
        .unwrap();

    let response = server
        .router()
        .await
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://player.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let (status, _) = get(server.router().await, "/api-docs/stream.json").await;
    assert_eq!(status, StatusCode::OK);
}
