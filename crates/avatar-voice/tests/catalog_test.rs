use avatar_voice::{fetch_voice_options, UpstreamConfig, VoiceCatalogClient, VoiceError};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const API_KEY: &str = "test-key";

type Responder = dyn Fn(Option<usize>) -> (StatusCode, String) + Send + Sync;

/// Scripted stand-in for the LiveAvatar voice API.
#[derive(Clone)]
struct Upstream {
    /// Offsets requested, `None` for unpaged requests.
    requests: Arc<Mutex<Vec<Option<usize>>>>,
    respond: Arc<Responder>,
}

impl Upstream {
    fn new(respond: impl Fn(Option<usize>) -> (StatusCode, String) + Send + Sync + 'static) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(respond),
        }
    }

    fn requests(&self) -> Vec<Option<usize>> {
        self.requests.lock().unwrap().clone()
    }
}

async fn voices_route(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, String::from("missing key")).into_response();
    }
    let offset = params.get("offset").and_then(|o| o.parse().ok());
    if offset.is_some() {
        assert_eq!(params.get("limit").map(String::as_str), Some("100"));
    }
    upstream.requests.lock().unwrap().push(offset);
    let (status, body) = (upstream.respond)(offset);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/v1/voices", get(voices_route))
        .with_state(upstream);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn page(offset: usize, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({ "voice_id": format!("v{}", offset + i), "name": format!("Voice {}", offset + i) }))
        .collect()
}

fn client(url: &str) -> VoiceCatalogClient {
    VoiceCatalogClient::new(UpstreamConfig::new(url, API_KEY)).unwrap()
}

#[tokio::test]
async fn test_pages_are_concatenated_in_order() {
    let upstream = Upstream::new(|offset| {
        let count = match offset {
            Some(0) | Some(100) => 100,
            Some(200) => 37,
            _ => return (StatusCode::BAD_REQUEST, "unexpected".to_string()),
        };
        // Alternate wrapper shapes between pages.
        let body = if offset == Some(100) {
            json!({ "data": page(100, count) })
        } else {
            Value::Array(page(offset.unwrap_or(0), count))
        };
        (StatusCode::OK, body.to_string())
    });
    let url = spawn_upstream(upstream.clone()).await;

    let voices = client(&url).list_voices().await.unwrap();

    assert_eq!(voices.len(), 237);
    for (i, voice) in voices.iter().enumerate() {
        assert_eq!(voice.id, format!("v{i}"));
    }
    assert_eq!(upstream.requests(), vec![Some(0), Some(100), Some(200)]);
}

#[tokio::test]
async fn test_first_page_failure_falls_back_to_unpaged_list() {
    let upstream = Upstream::new(|offset| match offset {
        Some(_) => (StatusCode::UNPROCESSABLE_ENTITY, "paging not supported".to_string()),
        None => (
            StatusCode::OK,
            json!({ "voices": [{ "id": "a", "name": "Ana" }, { "id": "b" }, { "name": "no id" }] })
                .to_string(),
        ),
    });
    let url = spawn_upstream(upstream.clone()).await;

    let voices = client(&url).list_voices().await.unwrap();

    let ids: Vec<_> = voices.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(voices[1].name, "b");
    assert_eq!(upstream.requests(), vec![Some(0), None]);
}

#[tokio::test]
async fn test_fallback_failure_reports_its_status_and_body() {
    let upstream = Upstream::new(|offset| match offset {
        Some(_) => (StatusCode::NOT_FOUND, "paged missing".to_string()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance".to_string()),
    });
    let url = spawn_upstream(upstream).await;

    let err = client(&url).list_voices().await.unwrap_err();

    match err {
        VoiceError::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "down for maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_later_page_failure_is_not_retried() {
    let upstream = Upstream::new(|offset| match offset {
        Some(0) => (StatusCode::OK, Value::Array(page(0, 100)).to_string()),
        _ => (StatusCode::BAD_GATEWAY, "boom".to_string()),
    });
    let url = spawn_upstream(upstream.clone()).await;

    let err = client(&url).list_voices().await.unwrap_err();

    assert!(matches!(err, VoiceError::Upstream { status: 502, ref body } if body == "boom"));
    assert_eq!(upstream.requests(), vec![Some(0), Some(100)]);
}

#[tokio::test]
async fn test_empty_upstream_list() {
    let upstream = Upstream::new(|_| (StatusCode::OK, json!({ "data": [] }).to_string()));
    let url = spawn_upstream(upstream.clone()).await;

    let voices = client(&url).list_voices().await.unwrap();

    assert!(voices.is_empty());
    assert_eq!(upstream.requests(), vec![Some(0)]);
}

#[tokio::test]
async fn test_unexpected_shape_degrades_to_empty_list() {
    let upstream = Upstream::new(|_| (StatusCode::OK, json!({ "items": 3 }).to_string()));
    let url = spawn_upstream(upstream).await;

    let voices = client(&url).list_voices().await.unwrap();
    assert!(voices.is_empty());
}

#[tokio::test]
async fn test_invalid_json_is_an_error() {
    let upstream = Upstream::new(|_| (StatusCode::OK, "<html>oops</html>".to_string()));
    let url = spawn_upstream(upstream).await;

    let err = client(&url).list_voices().await.unwrap_err();
    assert!(matches!(err, VoiceError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_full_final_page_costs_one_extra_request() {
    let upstream = Upstream::new(|offset| {
        let count = if offset == Some(0) { 100 } else { 0 };
        (StatusCode::OK, Value::Array(page(0, count)).to_string())
    });
    let url = spawn_upstream(upstream.clone()).await;

    let voices = client(&url).list_voices().await.unwrap();

    assert_eq!(voices.len(), 100);
    assert_eq!(upstream.requests(), vec![Some(0), Some(100)]);
}

#[tokio::test]
async fn test_page_limit_stops_endless_paging() {
    let upstream = Upstream::new(|offset| {
        (StatusCode::OK, Value::Array(page(offset.unwrap_or(0), 100)).to_string())
    });
    let url = spawn_upstream(upstream.clone()).await;

    let config = UpstreamConfig {
        max_pages: 3,
        ..UpstreamConfig::new(&url, API_KEY)
    };
    let voices = VoiceCatalogClient::new(config).unwrap().list_voices().await.unwrap();

    assert_eq!(voices.len(), 300);
    assert_eq!(upstream.requests().len(), 3);
}

#[tokio::test]
async fn test_unreachable_upstream_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr)).list_voices().await.unwrap_err();
    assert!(matches!(err, VoiceError::Http(_)), "got {err:?}");
}

#[test]
fn test_zero_page_size_is_rejected() {
    let config = UpstreamConfig {
        page_size: 0,
        ..UpstreamConfig::default()
    };
    assert!(matches!(VoiceCatalogClient::new(config), Err(VoiceError::Config(_))));
}

async fn spawn_kiosk(status: StatusCode, body: Value) -> String {
    let app = Router::new().route(
        "/api/list-voices",
        get(move || {
            let body = body.clone();
            async move { (status, axum::Json(body)) }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/list-voices", addr)
}

#[tokio::test]
async fn test_fetch_voice_options_normalizes_route_body() {
    let url = spawn_kiosk(
        StatusCode::OK,
        json!({ "data": [{ "id": "v1", "name": "Maria" }, { "voice_id": "v2" }, { "id": "" }] }),
    )
    .await;

    let voices = fetch_voice_options(&reqwest::Client::new(), &url).await.unwrap();

    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0].name, "Maria");
    assert_eq!(voices[1].name, "v2");
}

#[tokio::test]
async fn test_fetch_voice_options_surfaces_route_error() {
    let url = spawn_kiosk(
        StatusCode::BAD_GATEWAY,
        json!({ "error": "LiveAvatar API error", "details": "nope" }),
    )
    .await;

    let err = fetch_voice_options(&reqwest::Client::new(), &url).await.unwrap_err();
    assert_eq!(err.to_string(), "LiveAvatar API error");
}
