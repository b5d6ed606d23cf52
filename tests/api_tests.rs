use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use mockito::{Matcher, Server};
use serde_json::{json, Value};

use subtitle_gateway::cache::{DiskCache, MemoryCache, SubtitleCache};
use subtitle_gateway::models::{RequestConfig, SubtitleQuery, SubtitleTrack};
use subtitle_gateway::routes::{create_router, AppState};
use subtitle_gateway::services::providers::{OpenSubtitlesProvider, SubtitleProvider};
use subtitle_gateway::services::SubtitleService;

const PUBLIC_URL: &str = "http://localhost:7000";
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Provider that blows up, standing in for any unexpected failure mid-request
struct PanickingProvider;

#[async_trait::async_trait]
impl SubtitleProvider for PanickingProvider {
    async fn fetch_subtitles(&self, _: &RequestConfig, _: &SubtitleQuery) -> Vec<SubtitleTrack> {
        panic!("provider exploded");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

fn config_blob(json: &str) -> String {
    URL_SAFE_NO_PAD.encode(json)
}

fn valid_config() -> String {
    config_blob(r#"{"opensubtitles_key":"test_key","opensubtitles_app":"TestApp"}"#)
}

fn create_test_server(
    provider: Arc<dyn SubtitleProvider>,
    cache: Arc<dyn SubtitleCache>,
) -> TestServer {
    let state = Arc::new(AppState::new(SubtitleService::new(provider, cache), PUBLIC_URL));
    TestServer::new(create_router(state)).unwrap()
}

fn server_with_provider_at(url: &str) -> TestServer {
    let provider = OpenSubtitlesProvider::new(url, Duration::from_secs(2)).unwrap();
    create_test_server(Arc::new(provider), Arc::new(MemoryCache::new(WEEK)))
}

#[tokio::test]
async fn test_health_check() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_series_episode_end_to_end() {
    let mut provider = Server::new_async().await;
    let mock = provider
        .mock("GET", "/subtitles/series/tt0111161:1:5")
        .match_header("api-key", "test_key")
        .match_header("user-agent", "TestApp")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"subtitles":[{"id":"x1","url":"http://p/1.srt","lang":"eng"}]}"#)
        .create_async()
        .await;

    let server = server_with_provider_at(&provider.url());
    let response = server
        .get(&format!("/{}/subtitles/series/tt0111161:1:5.json", valid_config()))
        .await;

    mock.assert_async().await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"subtitles": [{"id": "tt0111161:1:5-x1", "url": "http://p/1.srt", "lang": "eng"}]})
    );
}

#[tokio::test]
async fn test_repeated_request_is_served_from_cache() {
    let mut provider = Server::new_async().await;
    let mock = provider
        .mock("GET", "/subtitles/movie/tt0111161")
        .with_status(200)
        .with_body(r#"{"subtitles":[{"id":"m1","url":"http://p/m1.srt","lang":"spa"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let server = server_with_provider_at(&provider.url());
    let path = format!("/{}/subtitles/movie/tt0111161.json", valid_config());

    let first = server.get(&path).await;
    let second = server.get(&path).await;

    mock.assert_async().await;
    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(first.json::<Value>(), second.json::<Value>());
    assert_eq!(second.json::<Value>()["subtitles"][0]["id"], "tt0111161-m1");
}

#[tokio::test]
async fn test_extra_arguments_are_forwarded() {
    let mut provider = Server::new_async().await;
    let mock = provider
        .mock("GET", "/subtitles/movie/tt0111161")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("hash".into(), "8e245d9679d31e12".into()),
            Matcher::UrlEncoded("size".into(), "734003200".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"subtitles":[{"id":"h1","url":"http://p/h1.srt"}]}"#)
        .create_async()
        .await;

    let server = server_with_provider_at(&provider.url());
    let response = server
        .get(&format!(
            "/{}/subtitles/movie/tt0111161/videoHash=8e245d9679d31e12&videoSize=734003200.json",
            valid_config()
        ))
        .await;

    mock.assert_async().await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"subtitles": [{"id": "tt0111161-h1", "url": "http://p/h1.srt", "lang": "eng"}]})
    );
}

#[tokio::test]
async fn test_invalid_base64_config_answers_empty_list() {
    let mut provider = Server::new_async().await;
    let mock = provider
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let server = server_with_provider_at(&provider.url());
    let response = server
        .get("/not*base64!/subtitles/movie/tt0111161.json")
        .await;

    mock.assert_async().await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"subtitles": []}));
}

#[tokio::test]
async fn test_config_without_api_key_answers_empty_list() {
    let server = server_with_provider_at("http://127.0.0.1:9");

    for config in [
        config_blob(r#"{"opensubtitles_app":"TestApp"}"#),
        config_blob(r#"{"opensubtitles_key":""}"#),
    ] {
        let response = server
            .get(&format!("/{}/subtitles/movie/tt0111161.json", config))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({"subtitles": []}));
    }
}

#[tokio::test]
async fn test_provider_transport_error_answers_empty_list() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    let server = server_with_provider_at(&url);
    let response = server
        .get(&format!("/{}/subtitles/movie/tt0111161.json", valid_config()))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"subtitles": []}));
}

#[tokio::test]
async fn test_provider_error_status_answers_empty_list() {
    let mut provider = Server::new_async().await;
    let _mock = provider
        .mock("GET", "/subtitles/movie/tt0111161")
        .with_status(503)
        .create_async()
        .await;

    let server = server_with_provider_at(&provider.url());
    let response = server
        .get(&format!("/{}/subtitles/movie/tt0111161.json", valid_config()))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"subtitles": []}));
}

#[tokio::test]
async fn test_malformed_episode_falls_back_to_catalog_id() {
    let mut provider = Server::new_async().await;
    let mock = provider
        .mock("GET", "/subtitles/series/tt0111161")
        .with_status(200)
        .with_body(r#"{"subtitles":[{"id":"s1","url":"http://p/s1.srt","lang":"eng"}]}"#)
        .create_async()
        .await;

    let server = server_with_provider_at(&provider.url());
    let response = server
        .get(&format!("/{}/subtitles/series/tt0111161:x:5.json", valid_config()))
        .await;

    mock.assert_async().await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["subtitles"][0]["id"],
        "tt0111161:x:5-s1"
    );
}

#[tokio::test]
async fn test_unexpected_failure_answers_placeholder_with_500() {
    let server = create_test_server(Arc::new(PanickingProvider), Arc::new(MemoryCache::new(WEEK)));
    let response = server
        .get(&format!("/{}/subtitles/movie/tt0111161.json", valid_config()))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    let subtitles = body["subtitles"].as_array().unwrap();
    assert_eq!(subtitles.len(), 1);
    assert_eq!(subtitles[0]["url"], "http://localhost:7000/loading.srt");
}

#[tokio::test]
async fn test_non_numeric_video_size_answers_placeholder_with_500() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server
        .get(&format!(
            "/{}/subtitles/movie/tt0111161/videoHash=abc&videoSize=huge.json",
            valid_config()
        ))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["subtitles"][0]["url"],
        "http://localhost:7000/loading.srt"
    );
}

#[tokio::test]
async fn test_bad_config_wins_over_bad_video_size() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server
        .get("/%25%25/subtitles/movie/tt0111161/videoSize=huge.json")
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"subtitles": []}));
}

#[tokio::test]
async fn test_undecodable_config_segment_answers_empty_list() {
    let server = server_with_provider_at("http://127.0.0.1:9");

    for path in [
        "/%FF%FE/subtitles/movie/tt0111161.json",
        "/%FF%FE/subtitles/movie/tt%FF.json",
        "/%FF%FE/subtitles/movie/tt0111161/videoHash=a%FFb&videoSize=1.json",
    ] {
        let response = server.get(path).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({"subtitles": []}), "{}", path);
    }
}

#[tokio::test]
async fn test_undecodable_id_or_extra_answers_placeholder_with_500() {
    let server = server_with_provider_at("http://127.0.0.1:9");

    for path in [
        format!("/{}/subtitles/movie/tt%FF.json", valid_config()),
        format!(
            "/{}/subtitles/movie/tt0111161/videoHash=a%FFb&videoSize=1.json",
            valid_config()
        ),
    ] {
        let response = server.get(&path).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>()["subtitles"][0]["url"],
            "http://localhost:7000/loading.srt"
        );
    }
}

#[tokio::test]
async fn test_undecodable_id_with_bad_config_answers_empty_list() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server
        .get(&format!("/{}/subtitles/movie/tt%FF.json", config_blob("{}")))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"subtitles": []}));
}

#[tokio::test]
async fn test_disk_cache_serves_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut provider = Server::new_async().await;
    let mock = provider
        .mock("GET", "/subtitles/movie/tt0068646")
        .with_status(200)
        .with_body(r#"{"subtitles":[{"id":"g1","url":"http://p/g1.srt","lang":"ita"}]}"#)
        .expect(1)
        .create_async()
        .await;
    let path = format!("/{}/subtitles/movie/tt0068646.json", valid_config());

    for _ in 0..2 {
        let cache = DiskCache::open(dir.path(), WEEK).await.unwrap();
        let provider = OpenSubtitlesProvider::new(provider.url(), Duration::from_secs(2)).unwrap();
        let server = create_test_server(Arc::new(provider), Arc::new(cache));

        let response = server.get(&path).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["subtitles"][0]["lang"], "ita");
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_manifest_requires_configuration() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server.get("/manifest.json").await;

    response.assert_status_ok();
    let manifest = response.json::<Value>();
    assert_eq!(manifest["resources"], json!(["subtitles"]));
    assert_eq!(manifest["behaviorHints"]["configurationRequired"], true);
}

#[tokio::test]
async fn test_configured_manifest() {
    let server = server_with_provider_at("http://127.0.0.1:9");

    let configured = server
        .get(&format!("/{}/manifest.json", valid_config()))
        .await
        .json::<Value>();
    assert_eq!(configured["behaviorHints"]["configurationRequired"], false);

    let unconfigured = server
        .get(&format!("/{}/manifest.json", config_blob("{}")))
        .await
        .json::<Value>();
    assert_eq!(unconfigured["behaviorHints"]["configurationRequired"], true);
}

#[tokio::test]
async fn test_manifest_with_undecodable_config_requires_configuration() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server.get("/%FF%FE/manifest.json").await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["behaviorHints"]["configurationRequired"],
        true
    );
}

#[tokio::test]
async fn test_loading_placeholder_is_served() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server.get("/loading.srt").await;

    response.assert_status_ok();
    assert!(response.text().starts_with("1\n00:00:00,000 --> "));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = server_with_provider_at("http://127.0.0.1:9");
    let response = server.get("/health").await;

    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(uuid::Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
}
