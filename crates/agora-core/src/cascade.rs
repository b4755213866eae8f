use agora_types::models::{Identity, Post, UserRecord};
use tracing::{debug, info};

use crate::error::{PostError, PostResult};
use crate::policy::authorize;
use crate::store::{PostStore, UserStore};

/// What a post looked like right before it was deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedPost {
    pub post: Post,
    pub owner: UserRecord,
}

/// Removes a post with everything hanging off it.
///
/// Order matters: reactions go before the rows they point at, comments go
/// before their post. Each step is a separate store call.
pub fn delete_post(
    posts: &dyn PostStore,
    users: &dyn UserStore,
    actor: &Identity,
    post_id: &str,
) -> PostResult<DeletedPost> {
    let post = posts
        .get_post(post_id)?
        .ok_or_else(|| PostError::not_found(format!("post '{}'", post_id)))?;

    let owner = users.get_user_by_id(&post.creator_id)?.ok_or_else(|| {
        PostError::integrity(format!(
            "owner '{}' of post '{}' does not exist",
            post.creator_id, post.id
        ))
    })?;

    authorize(actor, &owner.id)?;

    let post_reactions = posts.get_reactions_for_post(&post.id)?;
    if !post_reactions.is_empty() {
        debug!(post = %post.id, count = post_reactions.len(), "Deleting post reactions");
        posts.delete_reactions(&post.id)?;
    }

    let comments = posts.comments_for_post(&post.id)?;
    if !comments.is_empty() {
        for comment in &comments {
            let comment_reactions = posts.get_reactions_for_comment(&comment.id)?;
            if !comment_reactions.is_empty() {
                posts.delete_reactions(&comment.id)?;
            }
        }
        debug!(post = %post.id, count = comments.len(), "Deleting comments");
        posts.delete_comments_for_post(&post.id)?;
    }

    posts.delete_post(&post.id)?;

    info!(post = %post.id, actor = %actor.id, "Post deleted");
    Ok(DeletedPost { post, owner })
}
