//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use agora_types::models::{
    Comment, Identity, Post, Reaction, ReactionKind, Role, TargetKind, UserRecord,
};

use crate::error::{StoreError, StoreResult};
use crate::identity::IdentityVerifier;
use crate::store::{Clock, IdGenerator, PostStore, UserStore};

#[derive(Default)]
struct Inner {
    users: Vec<UserRecord>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    reactions: Vec<Reaction>,
    log: Vec<String>,
}

/// Post and user store backed by vectors. Every delete is appended to a log
/// so tests can check the order of cascade steps.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn add_user(&self, user: UserRecord) {
        self.inner.lock().unwrap().users.push(user);
    }

    pub fn add_post(&self, post: Post) {
        self.inner.lock().unwrap().posts.push(post);
    }

    pub fn add_comment(&self, comment: Comment) {
        self.inner.lock().unwrap().comments.push(comment);
    }

    pub fn remove_user(&self, id: &str) {
        self.inner.lock().unwrap().users.retain(|u| u.id != id);
    }

    pub fn post(&self, id: &str) -> Option<Post> {
        self.inner.lock().unwrap().posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn comment(&self, id: &str) -> Option<Comment> {
        self.inner.lock().unwrap().comments.iter().find(|c| c.id == id).cloned()
    }

    pub fn reactions(&self) -> Vec<Reaction> {
        self.inner.lock().unwrap().reactions.clone()
    }

    pub fn comment_total(&self) -> usize {
        self.inner.lock().unwrap().comments.len()
    }

    pub fn log(&self) -> Vec<String> {
        self.inner.lock().unwrap().log.clone()
    }
}

impl PostStore for MemoryStore {
    fn list_posts_with_creators(&self) -> StoreResult<(Vec<Post>, Vec<UserRecord>)> {
        let inner = self.inner.lock().unwrap();
        Ok((inner.posts.clone(), inner.users.clone()))
    }

    fn get_post(&self, id: &str) -> StoreResult<Option<Post>> {
        Ok(self.post(id))
    }

    fn get_post_with_comments(
        &self,
        id: &str,
    ) -> StoreResult<(Vec<Post>, Vec<UserRecord>, Vec<Comment>)> {
        let inner = self.inner.lock().unwrap();
        let posts: Vec<Post> = inner.posts.iter().filter(|p| p.id == id).cloned().collect();
        let comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.post_id == id)
            .cloned()
            .collect();
        Ok((posts, inner.users.clone(), comments))
    }

    fn get_comment(&self, id: &str) -> StoreResult<Option<Comment>> {
        Ok(self.comment(id))
    }

    fn insert_post(&self, post: &Post) -> StoreResult<()> {
        self.add_post(post.clone());
        Ok(())
    }

    fn update_post(&self, post: &Post, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(stored) = inner.posts.iter_mut().find(|p| p.id == id) {
            stored.content = post.content.clone();
            stored.updated_at = post.updated_at.clone();
        }
        Ok(())
    }

    fn delete_post(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.posts.retain(|p| p.id != id);
        inner.log.push(format!("delete_post:{}", id));
        Ok(())
    }

    fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.add_comment(comment.clone());
        Ok(())
    }

    fn update_comment(&self, comment: &Comment, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(stored) = inner.comments.iter_mut().find(|c| c.id == id) {
            stored.content = comment.content.clone();
            stored.updated_at = comment.updated_at.clone();
        }
        Ok(())
    }

    fn comments_for_post(&self, post_id: &str) -> StoreResult<Vec<Comment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    fn delete_comments_for_post(&self, post_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.comments.retain(|c| c.post_id != post_id);
        inner.log.push(format!("delete_comments_for_post:{}", post_id));
        Ok(())
    }

    fn increment_comment_count(&self, post_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(post) = inner.posts.iter_mut().find(|p| p.id == post_id) {
            post.comment_count += 1;
        }
        Ok(())
    }

    fn get_reactions_for_post(&self, post_id: &str) -> StoreResult<Vec<Reaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .reactions
            .iter()
            .filter(|r| r.target_kind == TargetKind::Post && r.target_id == post_id)
            .cloned()
            .collect())
    }

    fn get_reactions_for_comment(&self, comment_id: &str) -> StoreResult<Vec<Reaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .reactions
            .iter()
            .filter(|r| r.target_kind == TargetKind::Comment && r.target_id == comment_id)
            .cloned()
            .collect())
    }

    fn delete_reactions(&self, target_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.reactions.retain(|r| r.target_id != target_id);
        inner.log.push(format!("delete_reactions:{}", target_id));
        Ok(())
    }

    fn find_reaction(&self, user_id: &str, target_id: &str) -> StoreResult<Option<Reaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .reactions
            .iter()
            .find(|r| r.user_id == user_id && r.target_id == target_id)
            .cloned())
    }

    fn record_reaction(&self, reaction: &Reaction) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .reactions
            .iter()
            .any(|r| r.user_id == reaction.user_id && r.target_id == reaction.target_id)
        {
            return Err(StoreError::Duplicate);
        }

        let counters = match reaction.target_kind {
            TargetKind::Post => inner
                .posts
                .iter_mut()
                .find(|p| p.id == reaction.target_id)
                .map(|p| (&mut p.like_count, &mut p.dislike_count)),
            TargetKind::Comment => inner
                .comments
                .iter_mut()
                .find(|c| c.id == reaction.target_id)
                .map(|c| (&mut c.like_count, &mut c.dislike_count)),
        };
        if let Some((likes, dislikes)) = counters {
            match reaction.kind {
                ReactionKind::Like => *likes += 1,
                ReactionKind::Dislike => *dislikes += 1,
            }
        }

        inner.reactions.push(reaction.clone());
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn get_user_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    fn upsert_user(&self, identity: &Identity) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = UserRecord {
            id: identity.id.clone(),
            name: identity.name.clone(),
            role: identity.role,
        };
        match inner.users.iter_mut().find(|u| u.id == identity.id) {
            Some(existing) => *existing = record,
            None => inner.users.push(record),
        }
        Ok(())
    }
}

/// Accepts a fixed set of tokens.
#[derive(Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticVerifier {
    pub fn with(mut self, token: &str, id: &str, name: &str, role: Role) -> Self {
        self.tokens.insert(
            token.to_string(),
            Identity {
                id: id.to_string(),
                name: name.to_string(),
                role,
            },
        );
        self
    }
}

impl IdentityVerifier for StaticVerifier {
    fn verify(&self, credential: &str) -> Option<Identity> {
        self.tokens.get(credential).cloned()
    }
}

/// Ids `id-1`, `id-2`, ...
#[derive(Default)]
pub struct SeqIds(AtomicU64);

impl IdGenerator for SeqIds {
    fn new_id(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// A clock that moves one second forward on every read.
#[derive(Default)]
pub struct TickClock(AtomicU64);

impl Clock for TickClock {
    fn now(&self) -> String {
        let tick = self.0.fetch_add(1, Ordering::SeqCst) as i64;
        let at = chrono::DateTime::from_timestamp(1_700_000_000 + tick, 0).unwrap_or_default();
        at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}
