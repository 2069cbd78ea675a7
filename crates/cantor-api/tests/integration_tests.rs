//! Integration tests for the Cantor API.
//!
//! Each test builds its own router over a fresh development state and
//! drives it with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use cantor_api::create_router;
use cantor_api::error::ErrorBody;
use cantor_api::handlers::HealthResponse;
use cantor_api::state::AppState;
use cantor_core::config::CantorConfig;
use cantor_core::types::{IngestSummary, MoreFromArtistResponse, TrackOutcome, WhoSaidResponse};

// =============================================================================
// Helpers
// =============================================================================

const BOUNDARY: &str = "cantor-test-boundary";

fn make_state() -> AppState {
    AppState::development(CantorConfig::default())
}

/// Build a multipart/form-data body from (field name, value) pairs.
fn multipart_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        if *name == "files" {
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}.txt\"\r\n",
                name
            ));
            body.push_str("Content-Type: application/octet-stream\r\n\r\n");
        } else {
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            ));
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

fn ingest_request(fields: &[(&str, &str)]) -> Request<Body> {
    Request::post("/ingest-songs")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields)))
        .unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn ingest(state: &AppState, fields: &[(&str, &str)]) -> IngestSummary {
    let resp = create_router(state.clone())
        .oneshot(ingest_request(fields))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn indexed_id(outcome: &TrackOutcome) -> String {
    match outcome {
        TrackOutcome::Indexed { track_id, .. } => track_id.clone(),
        other => panic!("expected indexed, got {:?}", other),
    }
}

const SONG_A: &str = "voice: aurora\n[0.0-1.2] hello world\n[1.2-2.5] goodbye now";
const SONG_B: &str = "voice: aurora\n[0.0-3.0] running with the wolves";
const SONG_C: &str = "voice: basso\n[0.0-2.0] deep down low";

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_empty_catalog() {
    let resp = create_router(make_state())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.segments, 0);
    assert_eq!(health.tracks, 0);
}

// =============================================================================
// Ingest
// =============================================================================

#[tokio::test]
async fn test_ingest_songs_happy_path() {
    let state = make_state();
    let summary = ingest(
        &state,
        &[
            ("files", SONG_A),
            ("artists", "Artist A"),
            ("titles", "Title X"),
        ],
    )
    .await;

    assert!(summary.success);
    assert_eq!(summary.tracks, 1);
    assert_eq!(summary.segments_indexed, 2);
    let id = indexed_id(&summary.outcomes[0]);
    assert!(id.starts_with("Artist A:Title X:"));
    assert_eq!(state.catalog.stats().segments, 2);
}

#[tokio::test]
async fn test_ingest_songs_size_mismatch() {
    let resp = create_router(make_state())
        .oneshot(ingest_request(&[
            ("files", SONG_A),
            ("files", SONG_B),
            ("artists", "Artist A"),
            ("titles", "Title X"),
        ]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "bad_request");
    assert!(err.message.contains("must match"));
}

#[tokio::test]
async fn test_ingest_songs_blank_script_is_skipped() {
    let state = make_state();
    let summary = ingest(
        &state,
        &[("files", "voice: nobody\n   "), ("artists", "A"), ("titles", "Quiet")],
    )
    .await;

    assert_eq!(summary.segments_indexed, 0);
    assert!(matches!(summary.outcomes[0], TrackOutcome::Skipped { .. }));
    assert_eq!(state.catalog.stats().segments, 0);
}

#[tokio::test]
async fn test_ingest_songs_same_upload_twice_is_duplicate() {
    let state = make_state();
    let fields = [("files", SONG_A), ("artists", "Artist A"), ("titles", "Title X")];
    ingest(&state, &fields).await;
    let second = ingest(&state, &fields).await;

    assert!(matches!(second.outcomes[0], TrackOutcome::Duplicate { .. }));
    assert_eq!(second.segments_indexed, 0);
    assert_eq!(state.catalog.stats().segments, 2);
}

// =============================================================================
// Who said
// =============================================================================

#[tokio::test]
async fn test_who_said_empty_catalog() {
    let resp = create_router(make_state())
        .oneshot(post_json("/who-said", r#"{"quote": "hello world"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["answer"], "I couldn't find that line.");
    assert_eq!(json["candidates"], serde_json::json!([]));
}

#[tokio::test]
async fn test_who_said_finds_line_and_voice() {
    let state = make_state();
    let summary = ingest(
        &state,
        &[
            ("files", SONG_A),
            ("files", SONG_B),
            ("files", SONG_C),
            ("artists", "Artist A"),
            ("artists", "Artist A"),
            ("artists", "Artist Z"),
            ("titles", "Title X"),
            ("titles", "Title Y"),
            ("titles", "Title W"),
        ],
    )
    .await;
    let second = indexed_id(&summary.outcomes[1]);

    let resp = create_router(state.clone())
        .oneshot(post_json("/who-said", r#"{"quote": "hello world", "k": 3}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let response: WhoSaidResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();

    let best = response.best().unwrap();
    assert_eq!(best.artist, "Artist A");
    assert_eq!(best.title, "Title X");
    assert_eq!(best.timestamp, [0.0, 1.2]);
    assert_eq!(best.snippet, "hello world");

    let voices: Vec<_> = response.more_by_voice().iter().map(|v| v.track_id.clone()).collect();
    assert!(voices.contains(&second));
    assert!(voices.iter().all(|id| id != &best.track_id));

    match response {
        WhoSaidResponse::Found { answer, .. } => {
            assert!(answer.starts_with("Artist A said it in “Title X” [0.0s–1.2s]."));
        }
        other => panic!("expected found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_who_said_blank_quote_is_bad_request() {
    let resp = create_router(make_state())
        .oneshot(post_json("/who-said", r#"{"quote": "  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_who_said_missing_quote_is_rejected() {
    let resp = create_router(make_state())
        .oneshot(post_json("/who-said", r#"{"k": 2}"#))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

// =============================================================================
// More from artist
// =============================================================================

#[tokio::test]
async fn test_more_from_artist_unknown_track() {
    let resp = create_router(make_state())
        .oneshot(post_json(
            "/more-from-artist",
            r#"{"track_id": "nobody:nothing:0000000"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(err.message.contains("nobody:nothing:0000000"));
}

#[tokio::test]
async fn test_more_from_artist_same_voice_only() {
    let state = make_state();
    let summary = ingest(
        &state,
        &[
            ("files", SONG_A),
            ("files", SONG_B),
            ("files", SONG_C),
            ("artists", "Artist A"),
            ("artists", "Artist A"),
            ("artists", "Artist Z"),
            ("titles", "Title X"),
            ("titles", "Title Y"),
            ("titles", "Title W"),
        ],
    )
    .await;
    let first = indexed_id(&summary.outcomes[0]);
    let second = indexed_id(&summary.outcomes[1]);
    let third = indexed_id(&summary.outcomes[2]);

    let body = serde_json::json!({ "track_id": first, "top_n": 5 }).to_string();
    let resp = create_router(state.clone())
        .oneshot(post_json("/more-from-artist", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let response: MoreFromArtistResponse =
        serde_json::from_slice(&body_bytes(resp).await).unwrap();

    let ids: Vec<_> = response.results.iter().map(|r| r.track_id.clone()).collect();
    assert_eq!(ids, vec![second]);
    assert!(!ids.contains(&third));
    assert!(response.results[0].similarity >= 0.6);
}
