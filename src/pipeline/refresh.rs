use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::ai::{LlmTranslator, Translator};
use crate::config::Config;
use crate::db::{PurgeCounts, Repository};
use crate::error::{AppError, Result};
use crate::models::{Item, SortMode};
use crate::ranking::{fetch_candidates, rank};
use crate::source::{fetch_comment_tree, HnClient, ItemSource};

use super::enrich::{AbstractInput, Enricher, BACKEND_SOURCE};
use super::merge::merge_ranked;

/// What one refresh cycle stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub stories: usize,
    pub comments_fetched: usize,
    pub comments_inserted: usize,
}

/// One fetch → rank → merge → enrich → store cycle, with its collaborators
/// injected at construction. At most one cycle runs at a time.
pub struct Pipeline {
    source: Arc<dyn ItemSource>,
    enricher: Enricher,
    repository: Arc<Repository>,
    story_limit: usize,
    guard: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ItemSource>,
        enricher: Enricher,
        repository: Arc<Repository>,
        story_limit: usize,
    ) -> Self {
        Self {
            source,
            enricher,
            repository,
            story_limit,
            guard: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config, repository: Arc<Repository>) -> Result<Self> {
        let source = HnClient::new(Duration::from_secs(config.request_timeout_secs))?;

        let translator = match &config.translator_api_key {
            Some(key) => {
                let translator = LlmTranslator::new(
                    key.clone(),
                    config.translator_base_url.clone(),
                    config.translator_model.clone(),
                )?;
                tracing::info!("Using translator model {}", translator.model_version());
                Some(Arc::new(translator) as Arc<dyn Translator>)
            }
            None => None,
        };

        let enricher = Enricher::new(
            translator,
            config.comment_translation_cap,
            Duration::from_millis(config.enrichment_delay_ms),
        );

        Ok(Self::new(Arc::new(source), enricher, repository, config.story_limit))
    }

    /// Run a full cycle. Fails with `RefreshInProgress` if another cycle holds
    /// the guard, or when the story list cannot be fetched at all. Per-story
    /// and per-comment failures are logged and skipped.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let _guard = self
            .guard
            .try_lock()
            .map_err(|_| AppError::RefreshInProgress)?;
        self.run_cycle(Utc::now()).await
    }

    /// Purge everything last refreshed before `cutoff`. Waits for a running
    /// cycle to finish first.
    pub async fn purge(&self, cutoff: DateTime<Utc>) -> Result<PurgeCounts> {
        let _guard = self.guard.lock().await;
        let counts = self.repository.delete_older_than(cutoff).await?;
        tracing::info!(
            "Purged {} stories and {} comments fetched before {}",
            counts.stories,
            counts.comments,
            cutoff
        );
        Ok(counts)
    }

    async fn run_cycle(&self, now: DateTime<Utc>) -> Result<RefreshReport> {
        tracing::info!("Starting refresh cycle at {}", now);

        let candidates = fetch_candidates(self.source.as_ref()).await?;
        let by_comments = rank(&candidates, SortMode::ByComments, self.story_limit, now.timestamp());
        let by_points = rank(&candidates, SortMode::ByPoints, self.story_limit, now.timestamp());
        let stories = merge_ranked([by_comments, by_points]);

        let mut report = RefreshReport::default();
        if stories.is_empty() {
            tracing::info!("No stories with comments found");
            return Ok(report);
        }
        tracing::info!("Ranked {} distinct stories", stories.len());

        let items: HashMap<i64, &Item> = candidates.iter().map(|item| (item.id, item)).collect();

        let mut stored = Vec::with_capacity(stories.len());
        for (i, story) in stories.into_iter().enumerate() {
            let remote_id = story.remote_id;
            tracing::debug!("[{}] Enriching {:?}", i + 1, story.title);
            let enriched = self.enricher.enrich_story(story, now).await;
            match self.repository.upsert_story(enriched).await {
                Ok(id) => stored.push((id, remote_id)),
                Err(e) => tracing::error!("Failed to store story {}: {}", remote_id, e),
            }
        }
        report.stories = stored.len();

        for (story_id, remote_id) in stored {
            let Some(item) = items.get(&remote_id) else {
                continue;
            };
            match self.refresh_comments(story_id, item).await {
                Ok((fetched, inserted)) => {
                    report.comments_fetched += fetched;
                    report.comments_inserted += inserted;
                }
                Err(e) => tracing::warn!("Comment refresh failed for story {}: {}", remote_id, e),
            }
        }

        let stats = self.repository.get_stats().await?;
        tracing::info!(
            "Refresh done: {} stories stored, {} new comments; store holds {} stories, {} comments, {} points",
            report.stories,
            report.comments_inserted,
            stats.story_count,
            stats.total_comments,
            stats.total_points
        );
        Ok(report)
    }

    /// Fetch, enrich and store the comments of one story, then rebuild its
    /// abstract unless the stored one came from the backend.
    async fn refresh_comments(&self, story_id: i64, item: &Item) -> Result<(usize, usize)> {
        let fetched = fetch_comment_tree(self.source.as_ref(), item).await;
        let texts: Vec<String> = fetched.iter().map(|c| c.content.clone()).collect();
        let fetched_count = fetched.len();

        let mut inserted = 0;
        for comment in self.enricher.enrich_comments(fetched, story_id).await {
            let remote_id = comment.remote_comment_id;
            match self.repository.insert_comment(comment).await {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to store comment {}: {}", remote_id, e),
            }
        }

        if let Some(story) = self.repository.get_story_by_id(story_id).await? {
            if story.abstract_source.as_deref() != Some(BACKEND_SOURCE) {
                let input = AbstractInput {
                    title: &story.title,
                    body: story.body_text.as_deref(),
                    comments: &texts,
                };
                let (source, text) = self.enricher.abstract_for(&input).await;
                self.repository
                    .update_story_abstract(story_id, text, source)
                    .await?;
            }
        }

        Ok((fetched_count, inserted))
    }
}
