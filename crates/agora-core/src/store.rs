use agora_types::models::{Comment, Identity, Post, Reaction, UserRecord};

use crate::error::StoreResult;

/// Durable owner of posts, comments and reactions.
///
/// Collection lookups return an empty `Vec` when nothing matches; `Err` is
/// reserved for the store itself failing.
pub trait PostStore: Send + Sync {
    /// Every post, plus the users who created them.
    fn list_posts_with_creators(&self) -> StoreResult<(Vec<Post>, Vec<UserRecord>)>;

    fn get_post(&self, id: &str) -> StoreResult<Option<Post>>;

    /// The post matching `id` (zero or one), its comments, and every user who
    /// authored either.
    fn get_post_with_comments(
        &self,
        id: &str,
    ) -> StoreResult<(Vec<Post>, Vec<UserRecord>, Vec<Comment>)>;

    fn get_comment(&self, id: &str) -> StoreResult<Option<Comment>>;

    fn insert_post(&self, post: &Post) -> StoreResult<()>;

    /// Writes `content` and `updated_at` of the post stored as `id`. Counters
    /// are only ever changed by the atomic increments.
    fn update_post(&self, post: &Post, id: &str) -> StoreResult<()>;

    fn delete_post(&self, id: &str) -> StoreResult<()>;

    fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;

    /// Writes `content` and `updated_at` only, like [`PostStore::update_post`].
    fn update_comment(&self, comment: &Comment, id: &str) -> StoreResult<()>;

    fn comments_for_post(&self, post_id: &str) -> StoreResult<Vec<Comment>>;

    fn delete_comments_for_post(&self, post_id: &str) -> StoreResult<()>;

    /// Atomically adds one to the post's comment counter.
    fn increment_comment_count(&self, post_id: &str) -> StoreResult<()>;

    fn get_reactions_for_post(&self, post_id: &str) -> StoreResult<Vec<Reaction>>;

    fn get_reactions_for_comment(&self, comment_id: &str) -> StoreResult<Vec<Reaction>>;

    fn delete_reactions(&self, target_id: &str) -> StoreResult<()>;

    fn find_reaction(&self, user_id: &str, target_id: &str) -> StoreResult<Option<Reaction>>;

    /// Inserts the reaction and bumps the matching counter on its target as
    /// one unit. Fails with `StoreError::Duplicate` if the user already has a
    /// reaction on that target.
    fn record_reaction(&self, reaction: &Reaction) -> StoreResult<()>;
}

pub trait UserStore: Send + Sync {
    fn get_user_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>>;

    /// Records (or refreshes) the display name and role of a verified caller.
    fn upsert_user(&self, identity: &Identity) -> StoreResult<()>;
}

pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

pub trait Clock: Send + Sync {
    /// Current time as an ISO-8601 UTC string.
    fn now(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}
