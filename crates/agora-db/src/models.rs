//! Row types as stored in SQLite. Conversion to domain models lives in `store`.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub role: String,
}

pub struct PostRow {
    pub id: String,
    pub creator_id: String,
    pub content: String,
    pub comments: u32,
    pub likes: u32,
    pub dislikes: u32,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub creator_id: String,
    pub content: String,
    pub likes: u32,
    pub dislikes: u32,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ReactionRow {
    pub user_id: String,
    pub target_id: String,
    pub target_kind: String,
    pub value: i64,
}
