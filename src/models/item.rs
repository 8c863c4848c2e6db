use serde::{Deserialize, Serialize};

const DISCUSSION_URL: &str = "https://news.ycombinator.com/item";

/// A raw record as served by the remote item endpoint. Stories, comments,
/// jobs and polls all share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub score: Option<i64>,
    pub descendants: Option<i64>,
    pub time: Option<i64>,
    pub by: Option<String>,
    #[serde(default)]
    pub kids: Vec<i64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

impl Item {
    pub fn is_story(&self) -> bool {
        self.kind.as_deref() == Some("story")
    }

    /// Deleted or dead items are never shown and never traversed.
    pub fn is_gone(&self) -> bool {
        self.deleted || self.dead
    }

    pub fn discussion_url(id: i64) -> String {
        format!("{DISCUSSION_URL}?id={id}")
    }
}
