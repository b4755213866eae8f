//! `PostStore`/`UserStore` on top of the SQLite queries.

use anyhow::anyhow;

use agora_core::StoreError;
use agora_core::StoreResult;
use agora_core::store::{PostStore, UserStore};
use agora_types::models::{
    Comment, Identity, Post, Reaction, ReactionKind, TargetKind, UserRecord,
};

use crate::Database;
use crate::models::{CommentRow, PostRow, ReactionRow, UserRow};

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        let role = row
            .role
            .parse()
            .map_err(|e| anyhow!("Corrupt role on user '{}': {}", row.id, e))?;
        Ok(UserRecord {
            id: row.id,
            name: row.name,
            role,
        })
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            creator_id: row.creator_id,
            content: row.content,
            comment_count: row.comments,
            like_count: row.likes,
            dislike_count: row.dislikes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        PostRow {
            id: post.id.clone(),
            creator_id: post.creator_id.clone(),
            content: post.content.clone(),
            comments: post.comment_count,
            likes: post.like_count,
            dislikes: post.dislike_count,
            created_at: post.created_at.clone(),
            updated_at: post.updated_at.clone(),
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            creator_id: row.creator_id,
            content: row.content,
            like_count: row.likes,
            dislike_count: row.dislikes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Comment> for CommentRow {
    fn from(comment: &Comment) -> Self {
        CommentRow {
            id: comment.id.clone(),
            post_id: comment.post_id.clone(),
            creator_id: comment.creator_id.clone(),
            content: comment.content.clone(),
            likes: comment.like_count,
            dislikes: comment.dislike_count,
            created_at: comment.created_at.clone(),
            updated_at: comment.updated_at.clone(),
        }
    }
}

impl TryFrom<ReactionRow> for Reaction {
    type Error = StoreError;

    fn try_from(row: ReactionRow) -> StoreResult<Self> {
        let target_kind: TargetKind = row
            .target_kind
            .parse()
            .map_err(|e| anyhow!("Corrupt reaction by '{}': {}", row.user_id, e))?;
        let kind = ReactionKind::from_value(row.value).ok_or_else(|| {
            anyhow!("Corrupt reaction value {} by '{}'", row.value, row.user_id)
        })?;
        Ok(Reaction {
            user_id: row.user_id,
            target_id: row.target_id,
            target_kind,
            kind,
        })
    }
}

impl From<&Reaction> for ReactionRow {
    fn from(reaction: &Reaction) -> Self {
        ReactionRow {
            user_id: reaction.user_id.clone(),
            target_id: reaction.target_id.clone(),
            target_kind: reaction.target_kind.as_str().to_string(),
            value: reaction.kind.value(),
        }
    }
}

fn users(rows: Vec<UserRow>) -> StoreResult<Vec<UserRecord>> {
    rows.into_iter().map(UserRecord::try_from).collect()
}

fn reactions(rows: Vec<ReactionRow>) -> StoreResult<Vec<Reaction>> {
    rows.into_iter().map(Reaction::try_from).collect()
}

impl PostStore for Database {
    fn list_posts_with_creators(&self) -> StoreResult<(Vec<Post>, Vec<UserRecord>)> {
        let (posts, creators) = Database::list_posts_with_creators(self)?;
        Ok((posts.into_iter().map(Post::from).collect(), users(creators)?))
    }

    fn get_post(&self, id: &str) -> StoreResult<Option<Post>> {
        Ok(Database::get_post(self, id)?.map(Post::from))
    }

    fn get_post_with_comments(
        &self,
        id: &str,
    ) -> StoreResult<(Vec<Post>, Vec<UserRecord>, Vec<Comment>)> {
        let (posts, creators, comments) = Database::get_post_with_comments(self, id)?;
        Ok((
            posts.into_iter().map(Post::from).collect(),
            users(creators)?,
            comments.into_iter().map(Comment::from).collect(),
        ))
    }

    fn get_comment(&self, id: &str) -> StoreResult<Option<Comment>> {
        Ok(Database::get_comment(self, id)?.map(Comment::from))
    }

    fn insert_post(&self, post: &Post) -> StoreResult<()> {
        Ok(Database::insert_post(self, &PostRow::from(post))?)
    }

    fn update_post(&self, post: &Post, id: &str) -> StoreResult<()> {
        Ok(Database::update_post(self, &PostRow::from(post), id)?)
    }

    fn delete_post(&self, id: &str) -> StoreResult<()> {
        Ok(Database::delete_post(self, id)?)
    }

    fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        Ok(Database::insert_comment(self, &CommentRow::from(comment))?)
    }

    fn update_comment(&self, comment: &Comment, id: &str) -> StoreResult<()> {
        Ok(Database::update_comment(self, &CommentRow::from(comment), id)?)
    }

    fn comments_for_post(&self, post_id: &str) -> StoreResult<Vec<Comment>> {
        Ok(Database::comments_for_post(self, post_id)?
            .into_iter()
            .map(Comment::from)
            .collect())
    }

    fn delete_comments_for_post(&self, post_id: &str) -> StoreResult<()> {
        Ok(Database::delete_comments_for_post(self, post_id)?)
    }

    fn increment_comment_count(&self, post_id: &str) -> StoreResult<()> {
        Ok(Database::increment_comment_count(self, post_id)?)
    }

    fn get_reactions_for_post(&self, post_id: &str) -> StoreResult<Vec<Reaction>> {
        reactions(self.get_reactions_for_target(post_id, TargetKind::Post.as_str())?)
    }

    fn get_reactions_for_comment(&self, comment_id: &str) -> StoreResult<Vec<Reaction>> {
        reactions(self.get_reactions_for_target(comment_id, TargetKind::Comment.as_str())?)
    }

    fn delete_reactions(&self, target_id: &str) -> StoreResult<()> {
        Ok(Database::delete_reactions(self, target_id)?)
    }

    fn find_reaction(&self, user_id: &str, target_id: &str) -> StoreResult<Option<Reaction>> {
        Database::find_reaction(self, user_id, target_id)?
            .map(Reaction::try_from)
            .transpose()
    }

    fn record_reaction(&self, reaction: &Reaction) -> StoreResult<()> {
        if Database::record_reaction(self, &ReactionRow::from(reaction))? {
            Ok(())
        } else {
            Err(StoreError::Duplicate)
        }
    }
}

impl UserStore for Database {
    fn get_user_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Database::get_user_by_id(self, id)?
            .map(UserRecord::try_from)
            .transpose()
    }

    fn upsert_user(&self, identity: &Identity) -> StoreResult<()> {
        Ok(Database::upsert_user(
            self,
            &identity.id,
            &identity.name,
            identity.role.as_str(),
        )?)
    }
}
