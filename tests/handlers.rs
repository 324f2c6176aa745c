//! HTTP-level tests over the assembled router: public activation flow,
//! guarded dictionary endpoints, admin surface.

mod common;
use common::*;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use glyphgate::db::DbPool;
use glyphgate::handlers;

fn test_app() -> (Router, DbPool, tempfile::TempDir) {
    let (pool, dir) = test_pool();
    let app = handlers::app(test_state(pool.clone()));
    (app, pool, dir)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn admin_post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("valid JSON body")
    };
    (status, json)
}

// ============ Public surface ============

#[tokio::test]
async fn health_reports_ok() {
    let (app, _pool, _dir) = test_app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn activate_then_status_round_trip() {
    let (app, pool, _dir) = test_app();
    seed_code(&pool, "AAAA1111", "monthly");

    let (status, body) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-1", "code": "AAAA1111"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "monthly");
    assert!(body["activated_at"].is_string());
    assert!(body["expires_at"].is_string());

    let (status, body) = send(&app, post_json("/status", json!({"device_id": "dev-1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "activated");
    assert_eq!(body["plan"], "monthly");
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn status_of_unknown_device_is_unactivated() {
    let (app, _pool, _dir) = test_app();
    let (status, body) = send(&app, post_json("/status", json!({"device_id": "dev-x"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unactivated");
    assert!(body.get("plan").is_none());
    assert!(body.get("expires_at").is_none());
}

#[tokio::test]
async fn invalid_code_rejected_with_kind() {
    let (app, _pool, _dir) = test_app();
    let (status, body) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-1", "code": "NOPE0000"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "invalid_code");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn consumed_code_and_bound_device_rejections() {
    let (app, pool, _dir) = test_app();
    seed_code(&pool, "AAAA1111", "monthly");
    seed_code(&pool, "BBBB2222", "monthly");

    let (status, _) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-1", "code": "AAAA1111"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Same device, fresh code: conflict.
    let (status, body) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-1", "code": "BBBB2222"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "already_bound");

    // Consumed code, new device: indistinguishable from unknown.
    let (status, body) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-2", "code": "AAAA1111"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "invalid_code");
}

#[tokio::test]
async fn blank_fields_are_bad_requests() {
    let (app, _pool, _dir) = test_app();
    let (status, body) = send(
        &app,
        post_json("/activate", json!({"device_id": "", "code": "AAAA1111"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");

    let (status, _) = send(&app, post_json("/status", json!({"device_id": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============ Gated dictionary surface ============

#[tokio::test]
async fn dict_requires_active_binding() {
    let (app, pool, _dir) = test_app();

    // No binding at all.
    let (status, body) = send(
        &app,
        post_json("/dict/entry", json!({"device_id": "dev-1", "glyph": "清"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    // Lapsed binding.
    let activated = Utc::now() - Duration::days(10);
    seed_binding(
        &pool,
        "dev-old",
        "CCCC3333",
        "trial",
        activated,
        activated + Duration::days(7),
    );
    let (status, body) = send(
        &app,
        post_json("/dict/entry", json!({"device_id": "dev-old", "glyph": "清"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "expired");
}

#[tokio::test]
async fn dict_lookup_and_searches_for_active_device() {
    let (app, pool, _dir) = test_app();
    seed_code(&pool, "AAAA1111", "monthly");
    let (status, _) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-1", "code": "AAAA1111"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json("/dict/entry", json!({"device_id": "dev-1", "glyph": "清"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["glyph"], "清");
    assert_eq!(body["components"]["phonetic_radical"], "青");

    let (status, body) = send(
        &app,
        post_json("/dict/entry", json!({"device_id": "dev-1", "glyph": "馬"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    // Pinyin search is case-folded.
    let (status, body) = send(
        &app,
        post_json("/dict/search/pinyin", json!({"device_id": "dev-1", "pinyin": "QING"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let glyphs: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|e| e["glyph"].as_str().expect("glyph"))
        .collect();
    assert_eq!(glyphs, vec!["青", "清", "晴"]);

    let (status, body) = send(
        &app,
        post_json(
            "/dict/search/char-type",
            json!({"device_id": "dev-1", "char_type": "phono-semantic"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 4);

    // Group query from a member resolves the whole series, deduplicated.
    let (status, body) = send(
        &app,
        post_json("/dict/search/group", json!({"device_id": "dev-1", "glyph": "晴"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let glyphs: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|e| e["glyph"].as_str().expect("glyph"))
        .collect();
    assert_eq!(glyphs, vec!["青", "清", "晴"]);

    // Loner resolves to itself.
    let (status, body) = send(
        &app,
        post_json("/dict/search/group", json!({"device_id": "dev-1", "glyph": "独"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn identities_list_group_membership() {
    let (app, pool, _dir) = test_app();
    seed_code(&pool, "AAAA1111", "monthly");
    send(
        &app,
        post_json("/activate", json!({"device_id": "dev-1", "code": "AAAA1111"})),
    )
    .await;

    let (status, body) = send(
        &app,
        post_json("/dict/identities", json!({"device_id": "dev-1", "glyph": "青"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|i| i["type"].as_str().expect("type"))
        .collect();
    assert_eq!(kinds, vec!["definition", "phonetic_group"]);

    // No phonetic group for the loner.
    let (_, body) = send(
        &app,
        post_json("/dict/identities", json!({"device_id": "dev-1", "glyph": "独"})),
    )
    .await;
    assert_eq!(body.as_array().expect("array").len(), 1);
}

// ============ Admin surface ============

#[tokio::test]
async fn admin_rejects_missing_and_wrong_tokens() {
    let (app, _pool, _dir) = test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/admin/codes")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("GET")
        .uri("/admin/codes")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_generates_lists_and_revokes() {
    let (app, _pool, _dir) = test_app();

    let (status, body) = send(
        &app,
        admin_post_json("/admin/codes", json!({"quantity": 5, "plan": "monthly"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "monthly");
    let codes: Vec<String> = body["codes"]
        .as_array()
        .expect("codes")
        .iter()
        .map(|c| c.as_str().expect("code").to_string())
        .collect();
    assert_eq!(codes.len(), 5);

    // Listing: all five unused.
    let (status, body) = send(&app, admin_get("/admin/codes?unused_only=true&per_page=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["items"].as_array().expect("items").len(), 3);
    assert_eq!(body["per_page"], 3);

    // Activate one, then find it by device search.
    let (status, _) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-1", "code": codes[0]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, admin_get("/admin/codes?search=dev-1")).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["code"], codes[0].as_str());

    let (_, body) = send(&app, admin_get("/admin/devices?search=dev-1")).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["plan"], "monthly");

    // Revoke and verify the device drops back to unactivated.
    let (status, body) = send(
        &app,
        admin_post_json("/admin/revoke", json!({"device_id": "dev-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], true);

    let (_, body) = send(&app, post_json("/status", json!({"device_id": "dev-1"}))).await;
    assert_eq!(body["status"], "unactivated");

    // The freed code works for another device.
    let (status, _) = send(
        &app,
        post_json("/activate", json!({"device_id": "dev-2", "code": codes[0]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        admin_post_json("/admin/revoke", json!({"device_id": "dev-ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn admin_validates_generation_requests() {
    let (app, _pool, _dir) = test_app();

    let (status, body) = send(
        &app,
        admin_post_json("/admin/codes", json!({"quantity": 0, "plan": "monthly"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");

    let (status, _) = send(
        &app,
        admin_post_json("/admin/codes", json!({"quantity": 5001, "plan": "monthly"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        admin_post_json("/admin/codes", json!({"quantity": 5, "plan": "lifetime"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .expect("message")
            .contains("unknown plan")
    );
}

#[tokio::test]
async fn admin_metrics_counts_public_traffic() {
    let (app, _pool, _dir) = test_app();

    for _ in 0..3 {
        send(&app, post_json("/status", json!({"device_id": "dev-1"}))).await;
    }

    let (status, body) = send(&app, admin_get("/admin/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests"]["total_requests"], 3);
    assert_eq!(body["store"]["codes_total"], 0);
    assert_eq!(body["dictionary_entries"], 4);

    // Admin traffic itself is not counted.
    let (_, body) = send(&app, admin_get("/admin/metrics")).await;
    assert_eq!(body["requests"]["total_requests"], 3);
}
