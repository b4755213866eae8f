use agora_types::models::ReactionKind;

use crate::error::{PostError, PostResult};

/// Post and comment bodies must be present and not blank.
pub fn require_content(content: Option<&str>) -> PostResult<String> {
    match content {
        None => Err(PostError::validation("'content' is required")),
        Some(c) if c.trim().is_empty() => Err(PostError::validation("'content' must not be empty")),
        Some(c) => Ok(c.to_string()),
    }
}

/// Reaction values are 1 (like) or 0 (dislike); nothing else.
pub fn reaction_kind(value: i64) -> PostResult<ReactionKind> {
    ReactionKind::from_value(value)
        .ok_or_else(|| PostError::validation("reaction must be 1 (like) or 0 (dislike)"))
}
