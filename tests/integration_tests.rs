//! Integration tests for the block grid HTTP surface
//!
//! These tests drive the full router (all middleware layers included):
//! - Grid snapshot and stats
//! - Guest sessions and bearer authentication
//! - Claim results, coordinate validation and auth rejection
//! - CORS and security headers

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use blockgrid::{
    app::{build_router, cors_layer},
    core::Dimensions,
    state::AppState,
};
use serde_json::{json, Value};

/// Helper to create a test server over a fresh grid
fn create_test_server(rows: u32, cols: u32) -> (TestServer, AppState) {
    let state = AppState::new(
        Dimensions::new(rows, cols).unwrap(),
        "test_secret_key_for_integration_tests",
    );
    let cors = cors_layer(&["http://localhost:8000".to_string()]).unwrap();
    let app = build_router(state.clone(), cors);

    (TestServer::new(app).unwrap(), state)
}

/// Start a guest session and return its bearer header value
async fn sign_in(server: &TestServer, name: &str) -> (HeaderValue, String) {
    let response = server
        .post("/api/session")
        .json(&json!({ "name": name }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let token = body["token"].as_str().expect("session should return a token");
    let owner_id = body["ownerId"].as_str().unwrap().to_string();

    (
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        owner_id,
    )
}

mod grid_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let (server, _) = create_test_server(5, 5);
        let response = server.get("/health").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_empty_grid_snapshot() {
        let (server, _) = create_test_server(6, 9);
        let response = server.get("/api/grid").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["rows"], 6);
        assert_eq!(body["cols"], 9);
        assert_eq!(body["blocks"], json!([]));
    }

    #[tokio::test]
    async fn test_claim_then_snapshot() {
        let (server, _) = create_test_server(5, 5);
        let (auth, owner_id) = sign_in(&server, "Alice").await;

        let response = server
            .post("/api/blocks/claim")
            .add_header(header::AUTHORIZATION, auth)
            .json(&json!({ "row": 3, "col": 4 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({ "ok": true }));

        let grid: Value = server.get("/api/grid").await.json();
        let blocks = grid["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["key"], "3:4");
        assert_eq!(blocks[0]["row"], 3);
        assert_eq!(blocks[0]["col"], 4);
        assert_eq!(blocks[0]["ownerId"], owner_id.as_str());
        assert_eq!(blocks[0]["ownerName"], "Alice");
    }

    #[tokio::test]
    async fn test_second_claimant_sees_owner() {
        let (server, state) = create_test_server(5, 5);
        let (alice, alice_id) = sign_in(&server, "Alice").await;
        let (bob, _) = sign_in(&server, "Bob").await;

        server
            .post("/api/blocks/claim")
            .add_header(header::AUTHORIZATION, alice.clone())
            .json(&json!({ "row": 0, "col": 0 }))
            .await;

        for auth in [bob, alice] {
            let response = server
                .post("/api/blocks/claim")
                .add_header(header::AUTHORIZATION, auth)
                .json(&json!({ "row": 0, "col": 0 }))
                .await;

            assert_eq!(response.status_code(), StatusCode::OK);
            let body: Value = response.json();
            assert_eq!(body["ok"], false);
            assert_eq!(body["reason"], "owned");
            assert_eq!(body["ownerId"], alice_id.as_str());
        }

        assert_eq!(state.grid.claimed_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_rejected() {
        let (server, state) = create_test_server(5, 5);
        let (auth, _) = sign_in(&server, "Alice").await;

        for body in [
            json!({ "row": -1, "col": 0 }),
            json!({ "row": 5, "col": 0 }),
            json!({ "row": 0, "col": 5 }),
            json!({ "row": 1.5, "col": 0 }),
            json!({ "row": "1", "col": 0 }),
            json!({ "col": 0 }),
        ] {
            let response = server
                .post("/api/blocks/claim")
                .add_header(header::AUTHORIZATION, auth.clone())
                .json(&body)
                .await;

            assert_eq!(
                response.status_code(),
                StatusCode::BAD_REQUEST,
                "body {} should be rejected",
                body
            );
            let error: Value = response.json();
            assert_eq!(error["error"], "invalid_coordinate");
        }

        assert_eq!(state.grid.claimed_count(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_claim_rejected() {
        let (server, state) = create_test_server(5, 5);

        let response = server
            .post("/api/blocks/claim")
            .json(&json!({ "row": 0, "col": 0 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let error: Value = response.json();
        assert_eq!(error["error"], "unauthenticated");

        let forged = server
            .post("/api/blocks/claim")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Bearer forged.token"),
            )
            .json(&json!({ "row": 0, "col": 0 }))
            .await;
        assert_eq!(forged.status_code(), StatusCode::UNAUTHORIZED);

        assert!(state.grid.owner_of(0, 0).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        let (server, _) = create_test_server(5, 5);
        let (alice, alice_id) = sign_in(&server, "Alice").await;
        let (bob, bob_id) = sign_in(&server, "Bob").await;

        let (a, b) = tokio::join!(
            server
                .post("/api/blocks/claim")
                .add_header(header::AUTHORIZATION, alice)
                .json(&json!({ "row": 2, "col": 2 })),
            server
                .post("/api/blocks/claim")
                .add_header(header::AUTHORIZATION, bob)
                .json(&json!({ "row": 2, "col": 2 })),
        );

        let a: Value = a.json();
        let b: Value = b.json();
        let winner = match (a["ok"].as_bool(), b["ok"].as_bool()) {
            (Some(true), Some(false)) => {
                assert_eq!(b["ownerId"], alice_id.as_str());
                alice_id
            }
            (Some(false), Some(true)) => {
                assert_eq!(a["ownerId"], bob_id.as_str());
                bob_id
            }
            other => panic!("expected exactly one winner, got {:?}", other),
        };

        let grid: Value = server.get("/api/grid").await.json();
        assert_eq!(grid["blocks"].as_array().unwrap().len(), 1);
        assert_eq!(grid["blocks"][0]["ownerId"], winner.as_str());
    }

    #[tokio::test]
    async fn test_stats() {
        let (server, _) = create_test_server(4, 5);
        let (auth, _) = sign_in(&server, "Alice").await;

        server
            .post("/api/blocks/claim")
            .add_header(header::AUTHORIZATION, auth)
            .json(&json!({ "row": 1, "col": 1 }))
            .await;

        let stats: Value = server.get("/api/stats").await.json();
        assert_eq!(stats["rows"], 4);
        assert_eq!(stats["cols"], 5);
        assert_eq!(stats["claimed"], 1);
        assert_eq!(stats["total"], 20);
        assert_eq!(stats["subscribers"], 0);
    }
}

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_session_defaults_to_anonymous() {
        let (server, _) = create_test_server(2, 2);
        let response = server.post("/api/session").json(&json!({})).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["ownerName"], "Anonymous");
        assert!(body["ownerId"].as_str().unwrap().starts_with("guest|"));
    }

    #[tokio::test]
    async fn test_current_session_with_bearer() {
        let (server, _) = create_test_server(2, 2);
        let (auth, owner_id) = sign_in(&server, "Carol").await;

        let response = server
            .get("/api/session")
            .add_header(header::AUTHORIZATION, auth)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["ownerId"], owner_id.as_str());
        assert_eq!(body["ownerName"], "Carol");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_session_cookie_authenticates_claims() {
        let (server, state) = create_test_server(2, 2);
        let response = server
            .post("/api/session")
            .json(&json!({ "nickname": "cookie-user" }))
            .await;

        let cookie = response
            .iter_headers()
            .find(|(name, _)| *name == header::SET_COOKIE)
            .map(|(_, value)| value.to_str().unwrap().to_string())
            .expect("Should have set-cookie header");
        let cookie_pair = cookie.split(';').next().unwrap().to_string();

        let claim = server
            .post("/api/blocks/claim")
            .add_header(header::COOKIE, HeaderValue::from_str(&cookie_pair).unwrap())
            .json(&json!({ "row": 1, "col": 0 }))
            .await;

        assert_eq!(claim.status_code(), StatusCode::OK);
        let owner = state.grid.owner_of(1, 0).unwrap().unwrap();
        assert_eq!(owner.owner_name, "cookie-user");
    }
}

mod middleware_tests {
    use super::*;

    #[tokio::test]
    async fn test_cors_allows_configured_origins() {
        let (server, _) = create_test_server(2, 2);

        let response = server
            .get("/health")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://localhost:8000"),
            )
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "http://localhost:8000"
        );
    }

    #[tokio::test]
    async fn test_security_headers_on_api_responses() {
        let (server, _) = create_test_server(2, 2);
        let response = server.get("/api/grid").await;

        assert_eq!(response.header(header::X_FRAME_OPTIONS), "DENY");
        assert!(response
            .header(header::CONTENT_SECURITY_POLICY)
            .to_str()
            .unwrap()
            .contains("default-src 'self'"));
    }
}
