//! Route-level tests over an in-memory SQLite store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use agora_api::{AppStateInner, router};
use agora_core::PostService;
use agora_core::identity::JwtVerifier;
use agora_db::Database;
use agora_types::models::{Identity, Role};

const SECRET: &str = "route-test-secret";

struct TestApp {
    app: Router,
    alice: String,
    bob: String,
    admin: String,
}

fn test_app() -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let verifier = JwtVerifier::new(SECRET);

    let token = |id: &str, name: &str, role: Role| {
        verifier
            .issue(
                &Identity {
                    id: id.into(),
                    name: name.into(),
                    role,
                },
                Duration::from_secs(3600),
            )
            .unwrap()
    };
    let alice = token("user-a", "alice", Role::User);
    let bob = token("user-b", "bob", Role::User);
    let admin = token("admin", "root", Role::Admin);

    let service = PostService::new(db.clone(), db, Arc::new(verifier));
    TestApp {
        app: router(Arc::new(AppStateInner { service })),
        alice,
        bob,
        admin,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_post(t: &TestApp, token: &str, content: &str) -> String {
    let (status, body) = send(
        &t.app,
        "POST",
        "/posts",
        Some(token),
        Some(json!({ "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["post"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_needs_no_token() {
    let t = test_app();
    let (status, body) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_then_fetch_post_with_comments() {
    let t = test_app();

    let (status, body) = send(
        &t.app,
        "POST",
        "/posts",
        Some(t.alice.as_str()),
        Some(json!({ "content": "first light" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Post created");
    assert_eq!(body["post"]["creator"]["name"], "alice");
    assert_eq!(body["post"]["comment_count"], 0);
    let id = body["post"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/posts/{}/comments", id),
        Some(t.bob.as_str()),
        Some(json!({ "content": "nice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Comment created");
    assert_eq!(body["comment"]["post_id"], id.as_str());

    let (status, body) = send(&t.app, "GET", &format!("/posts/{}", id), Some(t.bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["comment_count"], 1);
    assert_eq!(body["comments"][0]["creator"]["name"], "bob");
}

#[tokio::test]
async fn list_filters_by_query() {
    let t = test_app();
    create_post(&t, &t.alice, "Rust is fun").await;
    create_post(&t, &t.bob, "gardening notes").await;

    let (status, body) = send(&t.app, "GET", "/posts", Some(t.alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&t.app, "GET", "/posts?q=rust", Some(t.alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "Rust is fun");
}

#[tokio::test]
async fn missing_and_bad_tokens_are_rejected() {
    let t = test_app();

    let (status, body) = send(&t.app, "GET", "/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    let (status, body) = send(&t.app, "GET", "/posts", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIAL");

    // Credential errors win over a bad body.
    let (status, body) = send(&t.app, "POST", "/posts", None, Some(json!({ "content": 7 }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn bad_bodies_are_validation_errors() {
    let t = test_app();

    for body in [json!({}), json!({ "content": "   " }), json!({ "content": 7 })] {
        let (status, resp) = send(&t.app, "POST", "/posts", Some(t.alice.as_str()), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"]["code"], "VALIDATION_ERROR");
    }

    let id = create_post(&t, &t.alice, "hi").await;
    for body in [json!({ "like": 2 }), json!({ "like": "1" }), json!({})] {
        let (status, resp) = send(
            &t.app,
            "PUT",
            &format!("/posts/{}/like", id),
            Some(t.bob.as_str()),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn only_owner_or_admin_may_edit() {
    let t = test_app();
    let id = create_post(&t, &t.alice, "draft").await;
    let uri = format!("/posts/{}", id);

    let (status, body) = send(
        &t.app,
        "PUT",
        &uri,
        Some(t.bob.as_str()),
        Some(json!({ "content": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = send(
        &t.app,
        "PUT",
        &uri,
        Some(t.admin.as_str()),
        Some(json!({ "content": "moderated" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post updated");
    assert_eq!(body["post"]["content"], "moderated");
    assert_eq!(body["post"]["creator"]["name"], "alice");
}

#[tokio::test]
async fn reactions_count_once_per_user() {
    let t = test_app();
    let id = create_post(&t, &t.alice, "vote on me").await;
    let uri = format!("/posts/{}/like", id);

    let (status, body) = send(&t.app, "PUT", &uri, Some(t.bob.as_str()), Some(json!({ "like": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "'Like' registered");
    assert_eq!(body["target"]["like_count"], 1);

    let (status, body) = send(&t.app, "PUT", &uri, Some(t.bob.as_str()), Some(json!({ "like": 0 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_REACTION");

    let (status, body) = send(&t.app, "PUT", &uri, Some(t.admin.as_str()), Some(json!({ "like": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "'Dislike' registered");
    assert_eq!(body["target"]["like_count"], 1);
    assert_eq!(body["target"]["dislike_count"], 1);
}

#[tokio::test]
async fn comments_can_be_reacted_to() {
    let t = test_app();
    let post_id = create_post(&t, &t.alice, "thread").await;
    let (_, body) = send(
        &t.app,
        "POST",
        &format!("/posts/{}/comments", post_id),
        Some(t.alice.as_str()),
        Some(json!({ "content": "reply" })),
    )
    .await;
    let comment_id = body["comment"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &t.app,
        "PUT",
        &format!("/posts/{}/like", comment_id),
        Some(t.bob.as_str()),
        Some(json!({ "like": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"]["kind"], "comment");
    assert_eq!(body["target"]["dislike_count"], 1);
}

#[tokio::test]
async fn delete_cascades_and_then_404s() {
    let t = test_app();
    let id = create_post(&t, &t.alice, "short lived").await;
    let uri = format!("/posts/{}", id);

    send(
        &t.app,
        "POST",
        &format!("{}/comments", uri),
        Some(t.bob.as_str()),
        Some(json!({ "content": "bye" })),
    )
    .await;
    send(
        &t.app,
        "PUT",
        &format!("{}/like", uri),
        Some(t.bob.as_str()),
        Some(json!({ "like": 1 })),
    )
    .await;

    let (status, _) = send(&t.app, "DELETE", &uri, Some(t.bob.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.app, "DELETE", &uri, Some(t.admin.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post deleted");
    assert_eq!(body["post"]["id"], id.as_str());

    let (status, body) = send(&t.app, "GET", &uri, Some(t.alice.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&t.app, "GET", "/posts", Some(t.alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
}
