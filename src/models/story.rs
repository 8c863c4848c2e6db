use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which metric drives the ranking and the persisted read order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    ByComments,
    ByPoints,
}

impl SortMode {
    pub fn toggle(self) -> Self {
        match self {
            SortMode::ByComments => SortMode::ByPoints,
            SortMode::ByPoints => SortMode::ByComments,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::ByComments => "Comments",
            SortMode::ByPoints => "Points",
        }
    }
}

/// A story that survived ranking, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStory {
    pub remote_id: i64,
    pub title: String,
    pub url: String,
    pub body_text: Option<String>,
    pub score: i64,
    pub comment_count: i64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub age_hours: f64,
    /// Time-decayed popularity. Diagnostic only, never a sort key.
    pub heat: f64,
}

/// A story with every enrichment slot declared up front.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStory {
    pub remote_id: i64,
    pub title: String,
    pub translated_title: Option<String>,
    pub url: String,
    pub body_text: Option<String>,
    pub translated_body: Option<String>,
    pub abstract_text: Option<String>,
    pub score: i64,
    pub comment_count: i64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl NewStory {
    pub fn from_ranked(story: RankedStory, fetched_at: DateTime<Utc>) -> Self {
        Self {
            remote_id: story.remote_id,
            title: story.title,
            translated_title: None,
            url: story.url,
            body_text: story.body_text,
            translated_body: None,
            abstract_text: None,
            score: story.score,
            comment_count: story.comment_count,
            author: story.author,
            created_at: story.created_at,
            fetched_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub remote_id: i64,
    pub title: String,
    pub translated_title: Option<String>,
    pub url: String,
    pub body_text: Option<String>,
    pub translated_body: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub score: i64,
    pub comment_count: i64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip)]
    pub abstract_source: Option<String>,
}

impl Story {
    pub fn display_title(&self) -> &str {
        self.translated_title.as_deref().unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub story_count: i64,
    pub total_comments: i64,
    pub total_points: i64,
}
