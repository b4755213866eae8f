use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde_json::Value;
use tracing::{debug, error};

use agora_core::{PostError, PostResult, PostService};
use agora_types::api::{
    CommentResponse, ContentRequest, ListPostsQuery, PostResponse, ReactRequest, ReactResponse,
};

use crate::AppState;
use crate::error::ApiError;

// ── Request helpers ─────────────────────────────────────────────────────

/// Raw token from `Authorization: Bearer <token>`. A missing or non-bearer
/// header yields `None`, which the service reports as unauthenticated.
fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    if token.is_none() {
        debug!("Malformed Authorization header");
    }
    token
}

/// `content` must be a JSON string when present.
fn content_field(body: Result<Json<ContentRequest>, JsonRejection>) -> PostResult<Option<String>> {
    let Json(req) = body.map_err(|e| PostError::validation(e.body_text()))?;
    match req.content {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(PostError::validation("'content' must be a string")),
    }
}

/// `like` must be a JSON integer.
fn like_field(body: Result<Json<ReactRequest>, JsonRejection>) -> PostResult<i64> {
    let Json(req) = body.map_err(|e| PostError::validation(e.body_text()))?;
    req.like
        .as_ref()
        .and_then(Value::as_i64)
        .ok_or_else(|| PostError::validation("'like' must be 1 (like) or 0 (dislike)"))
}

/// Runs a service call off the async runtime; the stores are blocking.
async fn run<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&PostService) -> PostResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal("worker task failed".into())
        })?;
    Ok(result?)
}

/// A bad body is only reported once the caller has been authenticated, so an
/// anonymous request never learns more than "unauthenticated".
fn after_auth<T>(
    service: &PostService,
    credential: Option<&str>,
    field: PostResult<T>,
) -> PostResult<T> {
    match field {
        Ok(value) => Ok(value),
        Err(e) => {
            service.authenticate(credential)?;
            Err(e)
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────────

/// GET /posts?q=
pub async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer(&headers);
    let posts = run(&state, move |s| s.list_posts(credential.as_deref(), &query)).await?;
    Ok(Json(posts))
}

/// GET /posts/{id}: the post with its comments.
pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer(&headers);
    let post = run(&state, move |s| s.get_post(credential.as_deref(), &id)).await?;
    Ok(Json(post))
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer(&headers);
    let content = content_field(body);

    let post = run(&state, move |s| {
        let content = after_auth(s, credential.as_deref(), content)?;
        s.create_post(credential.as_deref(), content.as_deref())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Post created".into(),
            post,
        }),
    ))
}

/// PUT /posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer(&headers);
    let content = content_field(body);

    let post = run(&state, move |s| {
        let content = after_auth(s, credential.as_deref(), content)?;
        s.update_post(credential.as_deref(), &id, content.as_deref())
    })
    .await?;

    Ok(Json(PostResponse {
        message: "Post updated".into(),
        post,
    }))
}

/// DELETE /posts/{id}: answers with the post as it was before deletion.
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer(&headers);
    let post = run(&state, move |s| s.delete_post(credential.as_deref(), &id)).await?;

    Ok(Json(PostResponse {
        message: "Post deleted".into(),
        post,
    }))
}

/// POST /posts/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer(&headers);
    let content = content_field(body);

    let comment = run(&state, move |s| {
        let content = after_auth(s, credential.as_deref(), content)?;
        s.create_comment(credential.as_deref(), &post_id, content.as_deref())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: "Comment created".into(),
            comment,
        }),
    ))
}

/// PUT /posts/{id}/like: `{ "like": 1 }` likes, `{ "like": 0 }` dislikes.
/// The id may name a post or a comment.
pub async fn react(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target_id): Path<String>,
    body: Result<Json<ReactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = bearer(&headers);
    let value = like_field(body);

    let outcome = run(&state, move |s| {
        let value = after_auth(s, credential.as_deref(), value)?;
        s.react(credential.as_deref(), &target_id, value)
    })
    .await?;

    Ok(Json(ReactResponse {
        message: outcome.message().to_string(),
        reaction: outcome.reaction.kind,
        target: outcome.target.view(),
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
