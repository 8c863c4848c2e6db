use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One node discovered by the comment tree fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedComment {
    pub remote_comment_id: i64,
    /// Remote id of the immediate parent comment, `None` for top-level comments.
    pub parent_id: Option<i64>,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub story_ref: i64,
    pub remote_comment_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub body_text: String,
    pub translated_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn from_fetched(comment: FetchedComment, story_ref: i64) -> Self {
        Self {
            story_ref,
            remote_comment_id: comment.remote_comment_id,
            parent_id: comment.parent_id,
            author: comment.author,
            body_text: comment.content,
            translated_body: None,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub story_ref: i64,
    pub remote_comment_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub body_text: String,
    pub translated_body: Option<String>,
    pub created_at: DateTime<Utc>,
}
