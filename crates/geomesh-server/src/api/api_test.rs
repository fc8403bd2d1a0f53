use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use geomesh_assistant::OFFLINE_ANSWER;
use geomesh_index::{GeoPoint, PointIndex};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn sample_index() -> PointIndex {
    PointIndex::build(vec![
        GeoPoint::new("Islamabad Model College", 33.6844, 73.0479).unwrap(),
        GeoPoint::new("Karachi Grammar School", 24.8607, 67.0011).unwrap(),
        GeoPoint::new("Quetta Public School", 30.1798, 66.9750).unwrap(),
    ])
    .unwrap()
}

fn state_with(index: PointIndex, assistant: Option<AssistantClient>) -> AppState {
    AppState {
        index: Arc::new(IndexHandle::new(index)),
        resolver: NodeResolver::new(),
        assistant: assistant.map(Arc::new),
        dataset_path: Arc::new(PathBuf::from("/nonexistent/schools.csv")),
        signal_radius_km: 10.0,
    }
}

fn app(state: AppState) -> Router {
    build_app(state, RateLimitState::per_minute(100))
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("index_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("assistant_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("assistant_error", StatusCode::BAD_GATEWAY),
        ("dataset_error", StatusCode::UNPROCESSABLE_ENTITY),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), expected, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_node_count() {
    let (status, json) = send(app(state_with(sample_index(), None)), get_req("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["nodes"], 3);
    assert_eq!(json["data"]["assistant"], "offline_only");
    assert!(json["meta"]["request_id"].is_string());
    assert!(json["meta"]["timestamp"].is_string());
}

#[tokio::test]
async fn health_is_degraded_with_empty_index() {
    let (status, json) = send(
        app(state_with(PointIndex::empty(), None)),
        get_req("/api/v1/health"),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["status"], "degraded");
    assert_eq!(json["data"]["nodes"], 0);
}

#[tokio::test]
async fn nodes_lists_points_in_insertion_order() {
    let (status, json) = send(app(state_with(sample_index(), None)), get_req("/api/v1/nodes")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(
        names,
        [
            "Islamabad Model College",
            "Karachi Grammar School",
            "Quetta Public School"
        ]
    );
}

#[tokio::test]
async fn nearest_returns_rounded_and_raw_distance() {
    let (status, json) = send(
        app(state_with(sample_index(), None)),
        get_req("/api/v1/nearest?lat=24.9&lon=67.05"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["name"], "Karachi Grammar School");
    let rounded = data["distance_km"].as_f64().unwrap();
    let raw = data["distance_km_raw"].as_f64().unwrap();
    assert!((rounded - raw).abs() <= 0.005 + 1e-9);
    assert!(raw > 0.0 && raw < 10.0);
}

#[tokio::test]
async fn nearest_rejects_out_of_range_latitude() {
    let (status, json) = send(
        app(state_with(sample_index(), None)),
        get_req("/api/v1/nearest?lat=91&lon=0"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["error"]["message"].as_str().unwrap().contains("latitude"));
}

#[tokio::test]
async fn nearest_rejects_missing_params() {
    let (status, json) = send(
        app(state_with(sample_index(), None)),
        get_req("/api/v1/nearest?lat=10"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn nearest_on_empty_index_is_unavailable() {
    let (status, json) = send(
        app(state_with(PointIndex::empty(), None)),
        get_req("/api/v1/nearest?lat=10&lon=10"),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "index_unavailable");
}

#[tokio::test]
async fn ask_offline_returns_canned_answer_and_map() {
    let body = serde_json::json!({
        "question": "What is photosynthesis?",
        "latitude": 30.3753,
        "longitude": 69.3451,
        "offline": true
    });
    let (status, json) = send(
        app(state_with(sample_index(), None)),
        post_json("/api/v1/ask", &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["resolution"]["name"], "Quetta Public School");
    assert_eq!(data["answer"]["source"], "offline");
    assert_eq!(data["answer"]["text"], OFFLINE_ANSWER);
    assert!(data["answer_error"].is_null());
    assert_eq!(data["map"]["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(
        data["map"]["closest"]["tooltip"],
        "Closest Hub: Quetta Public School"
    );
    assert_eq!(data["map"]["user"]["tooltip"], "Your Location");
}

#[tokio::test]
async fn ask_rejects_blank_question() {
    let body = serde_json::json!({ "question": "  ", "latitude": 0.0, "longitude": 0.0 });
    let (status, json) = send(
        app(state_with(sample_index(), None)),
        post_json("/api/v1/ask", &body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn ask_rejects_malformed_body() {
    let body = serde_json::json!({ "question": "Hi" });
    let (status, json) = send(
        app(state_with(sample_index(), None)),
        post_json("/api/v1/ask", &body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn ask_online_without_key_is_unavailable() {
    let body = serde_json::json!({ "question": "Hi", "latitude": 24.9, "longitude": 67.0 });
    let (status, json) = send(
        app(state_with(sample_index(), None)),
        post_json("/api/v1/ask", &body),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "assistant_unavailable");
}

#[tokio::test]
async fn ask_online_uses_assistant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "content": "Plants make food from light." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = AssistantClient::with_base_url("k", 5, &server.uri(), "test/model")
        .unwrap()
        .with_retry_policy(0, 0);

    let body = serde_json::json!({ "question": "Hi", "latitude": 24.9, "longitude": 67.0 });
    let (status, json) = send(
        app(state_with(sample_index(), Some(client))),
        post_json("/api/v1/ask", &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["answer"]["source"], "online");
    assert_eq!(json["data"]["answer"]["text"], "Plants make food from light.");
}

async fn ask_upstream_failure(status: u16, body: &str) -> serde_json::Value {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    let client = AssistantClient::with_base_url("k", 5, &server.uri(), "test/model")
        .unwrap()
        .with_retry_policy(0, 0);

    let request = serde_json::json!({
        "question": "hi", "latitude": 30.3753, "longitude": 69.3451
    });
    let (status, json) = send(
        app(state_with(sample_index(), Some(client))),
        post_json("/api/v1/ask", &request),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json
}

#[tokio::test]
async fn ask_assistant_failure_keeps_resolution_and_map() {
    let json = ask_upstream_failure(500, "boom").await;
    let data = &json["data"];

    assert_eq!(data["resolution"]["name"], "Quetta Public School");
    assert_eq!(
        data["map"]["closest"]["tooltip"],
        "Closest Hub: Quetta Public School"
    );
    assert!(data["answer"].is_null());
    assert_eq!(data["answer_error"]["code"], "assistant_error");
    assert!(data["answer_error"]["message"]
        .as_str()
        .unwrap()
        .contains("status 500"));
}

#[tokio::test]
async fn ask_rejected_key_is_reported_in_answer_error() {
    let json = ask_upstream_failure(401, r#"{"error":{"message":"nope"}}"#).await;
    let data = &json["data"];

    assert_eq!(data["resolution"]["name"], "Quetta Public School");
    assert_eq!(data["map"]["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(data["answer_error"]["code"], "assistant_error");
    assert_eq!(
        data["answer_error"]["message"],
        "assistant API error (status 401): nope"
    );
}

#[tokio::test]
async fn ask_is_rate_limited() {
    let app = build_app(state_with(sample_index(), None), RateLimitState::per_minute(1));
    let body = serde_json::json!({
        "question": "Hi", "latitude": 24.9, "longitude": 67.0, "offline": true
    });

    let (first, _) = send(app.clone(), post_json("/api/v1/ask", &body)).await;
    let (second, json) = send(app.clone(), post_json("/api/v1/ask", &body)).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");

    // Lookups are not limited.
    let (status, _) = send(app, get_req("/api/v1/nearest?lat=1&lon=1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reload_swaps_in_new_dataset() {
    let file = std::env::temp_dir().join(format!("geomesh-reload-{}.csv", Uuid::new_v4()));
    std::fs::write(
        &file,
        "school_name,latitude,longitude\nNew Hub,10.0,10.0\nBad,abc,1\n",
    )
    .unwrap();

    let mut state = state_with(sample_index(), None);
    state.dataset_path = Arc::new(file.clone());
    let index = Arc::clone(&state.index);

    let (status, json) = send(app(state), post_json("/api/v1/index/reload", &serde_json::json!({}))).await;
    std::fs::remove_file(&file).ok();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["points"], 1);
    assert_eq!(json["data"]["previous_points"], 3);
    assert_eq!(json["data"]["skipped"][0]["line"], 3);
    assert_eq!(index.snapshot().points()[0].name, "New Hub");
}

#[tokio::test]
async fn failed_reload_keeps_current_index() {
    let state = state_with(sample_index(), None);
    let index = Arc::clone(&state.index);

    let (status, json) = send(app(state), post_json("/api/v1/index/reload", &serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "dataset_error");
    assert_eq!(index.snapshot().len(), 3);
}

#[tokio::test]
async fn request_id_propagates_into_meta() {
    let req = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "trace-abc")
        .body(Body::empty())
        .unwrap();
    let (_, json) = send(app(state_with(sample_index(), None)), req).await;
    assert_eq!(json["meta"]["request_id"], "trace-abc");
}
