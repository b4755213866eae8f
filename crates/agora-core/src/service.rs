use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use agora_types::api::{CommentView, ListPostsQuery, PostDetail, PostView};
use agora_types::models::{Comment, Creator, Identity, Post, UserRecord};

use crate::cascade;
use crate::error::{PostError, PostResult, StoreError};
use crate::identity::{IdentityVerifier, authenticate};
use crate::policy::authorize;
use crate::reactions::{ReactionOutcome, ReactionTarget, apply_reaction, resolve_target};
use crate::store::{Clock, IdGenerator, PostStore, SystemClock, UserStore, UuidGenerator};
use crate::validate::{reaction_kind, require_content};

/// Creators of one result batch, keyed by user id.
struct CreatorIndex(HashMap<String, Creator>);

impl CreatorIndex {
    fn new(users: Vec<UserRecord>) -> Self {
        Self(
            users
                .into_iter()
                .map(|u| (u.id.clone(), u.creator()))
                .collect(),
        )
    }

    fn resolve(&self, creator_id: &str, owner_of: &str) -> PostResult<Creator> {
        self.0.get(creator_id).cloned().ok_or_else(|| {
            PostError::integrity(format!(
                "creator '{}' of '{}' does not exist",
                creator_id, owner_of
            ))
        })
    }
}

/// Entry point for every post, comment and reaction operation.
///
/// Holds no entity state; each call reads what it needs from the stores and
/// writes the result back before returning.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
    verifier: Arc<dyn IdentityVerifier>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        users: Arc<dyn UserStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            posts,
            users,
            verifier,
            ids: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Verifies the credential without doing anything else.
    pub fn authenticate(&self, credential: Option<&str>) -> PostResult<Identity> {
        authenticate(self.verifier.as_ref(), credential)
    }

    fn require_post(&self, id: &str) -> PostResult<Post> {
        self.posts
            .get_post(id)?
            .ok_or_else(|| PostError::not_found(format!("post '{}'", id)))
    }

    /// All posts with their creators, newest first. A non-blank `q` keeps only
    /// posts whose content contains it, ignoring case.
    pub fn list_posts(
        &self,
        credential: Option<&str>,
        query: &ListPostsQuery,
    ) -> PostResult<Vec<PostView>> {
        self.authenticate(credential)?;

        let (posts, creators) = self.posts.list_posts_with_creators()?;
        let creators = CreatorIndex::new(creators);

        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut views = posts
            .into_iter()
            .filter(|p| match &needle {
                Some(n) => p.content.to_lowercase().contains(n),
                None => true,
            })
            .map(|p| {
                let creator = creators.resolve(&p.creator_id, &p.id)?;
                Ok(PostView::new(p, creator))
            })
            .collect::<PostResult<Vec<_>>>()?;

        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }

    pub fn get_post(&self, credential: Option<&str>, id: &str) -> PostResult<PostDetail> {
        self.authenticate(credential)?;

        let (posts, creators, comments) = self.posts.get_post_with_comments(id)?;
        let post = posts
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PostError::not_found(format!("post '{}'", id)))?;
        let creators = CreatorIndex::new(creators);

        let mut comments = comments
            .into_iter()
            .filter(|c| c.post_id == post.id)
            .map(|c| {
                let creator = creators.resolve(&c.creator_id, &c.id)?;
                Ok(CommentView::new(c, creator))
            })
            .collect::<PostResult<Vec<_>>>()?;
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let creator = creators.resolve(&post.creator_id, &post.id)?;
        Ok(PostDetail {
            post: PostView::new(post, creator),
            comments,
        })
    }

    pub fn create_post(&self, credential: Option<&str>, content: Option<&str>) -> PostResult<PostView> {
        let caller = self.authenticate(credential)?;
        let content = require_content(content)?;

        self.users.upsert_user(&caller)?;

        let now = self.clock.now();
        let post = Post {
            id: self.ids.new_id(),
            creator_id: caller.id.clone(),
            content,
            comment_count: 0,
            like_count: 0,
            dislike_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        self.posts.insert_post(&post)?;
        info!(post = %post.id, creator = %caller.id, "Post created");

        Ok(PostView::new(
            post,
            Creator {
                id: caller.id,
                name: caller.name,
            },
        ))
    }

    /// Adds a comment under `post_id` and bumps the post's comment counter.
    pub fn create_comment(
        &self,
        credential: Option<&str>,
        post_id: &str,
        content: Option<&str>,
    ) -> PostResult<CommentView> {
        let caller = self.authenticate(credential)?;
        let content = require_content(content)?;
        let post = self.require_post(post_id)?;

        self.users.upsert_user(&caller)?;

        let now = self.clock.now();
        let comment = Comment {
            id: self.ids.new_id(),
            post_id: post.id.clone(),
            creator_id: caller.id.clone(),
            content,
            like_count: 0,
            dislike_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        self.posts.insert_comment(&comment)?;
        self.posts.increment_comment_count(&post.id)?;
        info!(comment = %comment.id, post = %post.id, creator = %caller.id, "Comment created");

        Ok(CommentView::new(
            comment,
            Creator {
                id: caller.id,
                name: caller.name,
            },
        ))
    }

    /// Replaces a post's content. Counters and creator are kept as stored.
    pub fn update_post(
        &self,
        credential: Option<&str>,
        id: &str,
        content: Option<&str>,
    ) -> PostResult<PostView> {
        let caller = self.authenticate(credential)?;
        let mut post = self.require_post(id)?;

        authorize(&caller, &post.creator_id)?;

        post.content = require_content(content)?;
        post.updated_at = self.clock.now();

        let creator = self
            .users
            .get_user_by_id(&post.creator_id)?
            .ok_or_else(|| {
                PostError::integrity(format!(
                    "creator '{}' of '{}' does not exist",
                    post.creator_id, post.id
                ))
            })?
            .creator();

        self.posts.update_post(&post, id)?;
        info!(post = %post.id, actor = %caller.id, "Post updated");

        // Counters may have moved since the read above.
        let post = self.posts.get_post(id)?.unwrap_or(post);
        Ok(PostView::new(post, creator))
    }

    /// Deletes the post with its comments and reactions, returning the post as
    /// it was just before deletion.
    pub fn delete_post(&self, credential: Option<&str>, id: &str) -> PostResult<PostView> {
        let caller = self.authenticate(credential)?;
        let deleted = cascade::delete_post(self.posts.as_ref(), self.users.as_ref(), &caller, id)?;

        Ok(PostView::new(deleted.post, deleted.owner.creator()))
    }

    /// Casts the caller's single vote on a post or comment: 1 likes, 0 dislikes.
    pub fn react(
        &self,
        credential: Option<&str>,
        target_id: &str,
        value: i64,
    ) -> PostResult<ReactionOutcome> {
        let caller = self.authenticate(credential)?;
        reaction_kind(value)?;

        let target = resolve_target(
            target_id,
            self.posts.get_post(target_id)?,
            self.posts.get_comment(target_id)?,
        )?;
        let existing = self.posts.find_reaction(&caller.id, target_id)?;

        let (target, reaction) = apply_reaction(target, existing.as_ref(), &caller.id, value)
            .inspect_err(|e| {
                if matches!(e, PostError::DuplicateReaction) {
                    warn!(user = %caller.id, target = %target_id, "Duplicate reaction rejected");
                }
            })?;

        self.users.upsert_user(&caller)?;

        match self.posts.record_reaction(&reaction) {
            Ok(()) => {}
            Err(StoreError::Duplicate) => {
                warn!(user = %caller.id, target = %target_id, "Concurrent duplicate reaction rejected");
                return Err(PostError::DuplicateReaction);
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            user = %caller.id,
            target = %target_id,
            kind = ?reaction.kind,
            "Reaction recorded"
        );
        let target = self.reload(target)?;
        Ok(ReactionOutcome { reaction, target })
    }

    /// Committed state of a reaction target. Falls back to `target` if it was
    /// deleted in the meantime.
    fn reload(&self, target: ReactionTarget) -> PostResult<ReactionTarget> {
        let fresh = match &target {
            ReactionTarget::Post(p) => self.posts.get_post(&p.id)?.map(ReactionTarget::Post),
            ReactionTarget::Comment(c) => {
                self.posts.get_comment(&c.id)?.map(ReactionTarget::Comment)
            }
        };
        Ok(fresh.unwrap_or(target))
    }
}
