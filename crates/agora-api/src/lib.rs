//! HTTP surface for the post service.

pub mod error;
pub mod posts;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use agora_core::PostService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: PostService,
}

/// All routes, without transport layers (CORS, tracing) which the binary adds.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(posts::health))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/{id}/comments", post(posts::create_comment))
        .route("/posts/{id}/like", put(posts::react))
        .with_state(state)
}
