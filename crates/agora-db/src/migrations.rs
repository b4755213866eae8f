use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'USER',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE posts (
                id          TEXT PRIMARY KEY,
                creator_id  TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                comments    INTEGER NOT NULL DEFAULT 0,
                likes       INTEGER NOT NULL DEFAULT 0,
                dislikes    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_at);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                post_id     TEXT NOT NULL REFERENCES posts(id),
                creator_id  TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                likes       INTEGER NOT NULL DEFAULT 0,
                dislikes    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id, created_at);

            -- One vote per user per post or comment
            CREATE TABLE reactions (
                user_id     TEXT NOT NULL REFERENCES users(id),
                target_id   TEXT NOT NULL,
                target_kind TEXT NOT NULL CHECK (target_kind IN ('post', 'comment')),
                value       INTEGER NOT NULL CHECK (value IN (0, 1)),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, target_id)
            );

            CREATE INDEX idx_reactions_target ON reactions(target_id);

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
