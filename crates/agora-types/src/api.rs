use serde::{Deserialize, Serialize};

use crate::models::{Comment, Creator, Post, ReactionKind, Role, TargetKind};

// -- JWT Claims --

/// JWT claims accepted by the post service. Tokens are minted by whichever
/// identity service shares `AGORA_JWT_SECRET`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

// -- Posts --

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub q: Option<String>,
}

/// `content` stays untyped so a wrong JSON type surfaces as a validation error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentRequest {
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactRequest {
    #[serde(default)]
    pub like: Option<serde_json::Value>,
}

/// Read model for a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub content: String,
    pub comment_count: u32,
    pub like_count: u32,
    pub dislike_count: u32,
    pub created_at: String,
    pub updated_at: String,
    pub creator: Creator,
}

impl PostView {
    pub fn new(post: Post, creator: Creator) -> Self {
        Self {
            id: post.id,
            content: post.content,
            comment_count: post.comment_count,
            like_count: post.like_count,
            dislike_count: post.dislike_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
            creator,
        }
    }
}

/// Read model for a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub like_count: u32,
    pub dislike_count: u32,
    pub created_at: String,
    pub updated_at: String,
    pub creator: Creator,
}

impl CommentView {
    pub fn new(comment: Comment, creator: Creator) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            like_count: comment.like_count,
            dislike_count: comment.dislike_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            creator,
        }
    }
}

/// A post together with its comments, as returned by `GET /posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub message: String,
    pub post: PostView,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub message: String,
    pub comment: CommentView,
}

/// Counters of a post or comment after a reaction was recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionTargetView {
    pub id: String,
    pub kind: TargetKind,
    pub like_count: u32,
    pub dislike_count: u32,
}

#[derive(Debug, Serialize)]
pub struct ReactResponse {
    pub message: String,
    pub reaction: ReactionKind,
    pub target: ReactionTargetView,
}
