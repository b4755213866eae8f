use crate::models::{CommentRow, PostRow, ReactionRow, UserRow};
use crate::Database;
use anyhow::{Result, bail};
use rusqlite::{Connection, Row};

const POST_COLUMNS: &str =
    "p.id, p.creator_id, p.content, p.comments, p.likes, p.dislikes, p.created_at, p.updated_at";
const COMMENT_COLUMNS: &str =
    "c.id, c.post_id, c.creator_id, c.content, c.likes, c.dislikes, c.created_at, c.updated_at";

impl Database {
    // -- Users --

    /// Inserts the user, or refreshes name and role if the id is known.
    pub fn upsert_user(&self, id: &str, name: &str, role: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, role) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, role = excluded.role",
                (id, name, role),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, role FROM users WHERE id = ?1",
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Posts --

    /// All posts newest first, with every user who created one of them.
    pub fn list_posts_with_creators(&self) -> Result<(Vec<PostRow>, Vec<UserRow>)> {
        self.with_conn(|conn| {
            let posts = query_posts(
                conn,
                &format!("SELECT {} FROM posts p ORDER BY p.created_at DESC", POST_COLUMNS),
                &[],
            )?;

            let mut stmt = conn.prepare(
                "SELECT DISTINCT u.id, u.name, u.role
                 FROM users u
                 JOIN posts p ON p.creator_id = u.id",
            )?;
            let creators = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((posts, creators))
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM posts p WHERE p.id = ?1", POST_COLUMNS),
                    [id],
                    post_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// The post (if any), its comments oldest first, and the users who wrote
    /// either.
    pub fn get_post_with_comments(
        &self,
        id: &str,
    ) -> Result<(Vec<PostRow>, Vec<UserRow>, Vec<CommentRow>)> {
        self.with_conn(|conn| {
            let posts = query_posts(
                conn,
                &format!("SELECT {} FROM posts p WHERE p.id = ?1", POST_COLUMNS),
                &[&id],
            )?;
            let comments = query_comments(conn, id)?;

            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.role FROM users u
                 WHERE u.id IN (
                     SELECT creator_id FROM posts WHERE id = ?1
                     UNION
                     SELECT creator_id FROM comments WHERE post_id = ?1
                 )",
            )?;
            let creators = stmt
                .query_map([id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((posts, creators, comments))
        })
    }

    pub fn insert_post(&self, post: &PostRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, creator_id, content, comments, likes, dislikes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    post.id,
                    post.creator_id,
                    post.content,
                    post.comments,
                    post.likes,
                    post.dislikes,
                    post.created_at,
                    post.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_post(&self, post: &PostRow, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE posts SET content = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![post.content, post.updated_at, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn increment_comment_count(&self, post_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET comments = comments + 1 WHERE id = ?1",
                [post_id],
            )?;
            if changed != 1 {
                bail!("Post not found for comment count: {}", post_id);
            }
            Ok(())
        })
    }

    // -- Comments --

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM comments c WHERE c.id = ?1", COMMENT_COLUMNS),
                    [id],
                    comment_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn comments_for_post(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, post_id))
    }

    pub fn insert_comment(&self, comment: &CommentRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, creator_id, content, likes, dislikes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    comment.id,
                    comment.post_id,
                    comment.creator_id,
                    comment.content,
                    comment.likes,
                    comment.dislikes,
                    comment.created_at,
                    comment.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_comment(&self, comment: &CommentRow, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![comment.content, comment.updated_at, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_comments_for_post(&self, post_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM comments WHERE post_id = ?1", [post_id])?;
            Ok(())
        })
    }

    // -- Reactions --

    pub fn get_reactions_for_target(&self, target_id: &str, target_kind: &str) -> Result<Vec<ReactionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, target_id, target_kind, value FROM reactions
                 WHERE target_id = ?1 AND target_kind = ?2",
            )?;
            let rows = stmt
                .query_map([target_id, target_kind], reaction_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_reaction(&self, user_id: &str, target_id: &str) -> Result<Option<ReactionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, target_id, target_kind, value FROM reactions
                     WHERE user_id = ?1 AND target_id = ?2",
                    [user_id, target_id],
                    reaction_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_reactions(&self, target_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM reactions WHERE target_id = ?1", [target_id])?;
            Ok(())
        })
    }

    /// Inserts the reaction and bumps the matching counter of its post or
    /// comment in one transaction.
    /// Returns false, with nothing written, if the user already reacted to the target.
    pub fn record_reaction(&self, reaction: &ReactionRow) -> Result<bool> {
        let table = match reaction.target_kind.as_str() {
            "post" => "posts",
            "comment" => "comments",
            other => bail!("Unknown reaction target kind: {}", other),
        };
        let column = match reaction.value {
            1 => "likes",
            0 => "dislikes",
            other => bail!("Unknown reaction value: {}", other),
        };

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let inserted = tx.execute(
                "INSERT INTO reactions (user_id, target_id, target_kind, value) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    reaction.user_id,
                    reaction.target_id,
                    reaction.target_kind,
                    reaction.value,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                {
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }

            // Counter bump happens in SQL so concurrent votes never overwrite each other
            let changed = tx.execute(
                &format!("UPDATE {table} SET {column} = {column} + 1 WHERE id = ?1"),
                [&reaction.target_id],
            )?;
            if changed != 1 {
                bail!("Reaction target vanished: {}", reaction.target_id);
            }

            tx.commit()?;
            Ok(true)
        })
    }
}

fn query_posts(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<PostRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, post_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_comments(conn: &Connection, post_id: &str) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM comments c WHERE c.post_id = ?1 ORDER BY c.created_at ASC",
        COMMENT_COLUMNS
    ))?;
    let rows = stmt
        .query_map([post_id], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        content: row.get(2)?,
        comments: row.get(3)?,
        likes: row.get(4)?,
        dislikes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        creator_id: row.get(2)?,
        content: row.get(3)?,
        likes: row.get(4)?,
        dislikes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn reaction_from_row(row: &Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        user_id: row.get(0)?,
        target_id: row.get(1)?,
        target_kind: row.get(2)?,
        value: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
