use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Repository;
use crate::error::Result;
use crate::models::{Comment, SortMode, Story};

/// A story as served to the display layer, comments embedded flat.
#[derive(Debug, Serialize)]
pub struct StoryWithComments {
    #[serde(flatten)]
    pub story: Story,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct Snapshot {
    /// Latest `fetched_at` in epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_update: Option<DateTime<Utc>>,
    pub stories: Vec<StoryWithComments>,
}

pub async fn build_snapshot(repository: &Repository, limit: usize, mode: SortMode) -> Result<Snapshot> {
    let stories = repository.get_stories_ranked(limit, mode).await?;

    let mut with_comments = Vec::with_capacity(stories.len());
    for story in stories {
        let comments = repository.get_comments_by_story_id(story.id).await?;
        with_comments.push(StoryWithComments { story, comments });
    }

    Ok(Snapshot {
        last_update: repository.last_update().await?,
        stories: with_comments,
    })
}

/// Write the current ranking with comments as pretty JSON. Returns the number
/// of stories written.
pub async fn export_snapshot(repository: &Repository, path: &Path, limit: usize) -> Result<usize> {
    let snapshot = build_snapshot(repository, limit, SortMode::ByComments).await?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json)?;

    tracing::info!("Exported {} stories to {:?}", snapshot.stories.len(), path);
    Ok(snapshot.stories.len())
}
