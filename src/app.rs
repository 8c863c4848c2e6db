use std::sync::Arc;

use tokio::sync::mpsc;

use crate::db::Repository;
use crate::error::Result;
use crate::models::{SortMode, Stats, Story};
use crate::pipeline::{Pipeline, RefreshReport};
use crate::tree::{build_comment_forest, CommentNode};
use crate::tui::AppAction;

/// Stories loaded into the browser at once.
pub const DISPLAY_LIMIT: usize = 60;

// Message for a finished background refresh
pub struct RefreshResult {
    pub result: std::result::Result<RefreshReport, String>,
}

pub struct App {
    // Data
    pub stories: Vec<Story>,
    pub forest: Vec<CommentNode>,
    pub stats: Stats,

    // UI State
    pub selected_index: usize,
    pub sort_mode: SortMode,
    pub active_search: Option<String>,
    pub search_input_active: bool,
    pub search_input: String,
    pub comment_scroll: u16,
    pub show_help: bool,
    pub status_message: Option<String>,

    // Async state
    pub is_refreshing: bool,
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,

    // Services
    pub repository: Arc<Repository>,
    pipeline: Arc<Pipeline>,
}

impl App {
    pub async fn new(repository: Arc<Repository>, pipeline: Arc<Pipeline>) -> Result<Self> {
        let (refresh_tx, refresh_rx) = mpsc::channel(1);

        let mut app = Self {
            stories: Vec::new(),
            forest: Vec::new(),
            stats: Stats::default(),
            selected_index: 0,
            sort_mode: SortMode::default(),
            active_search: None,
            search_input_active: false,
            search_input: String::new(),
            comment_scroll: 0,
            show_help: false,
            status_message: None,
            is_refreshing: false,
            refresh_rx,
            refresh_tx,
            repository,
            pipeline,
        };
        app.reload_stories().await?;
        Ok(app)
    }

    pub fn selected_story(&self) -> Option<&Story> {
        self.stories.get(self.selected_index)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                    self.on_selection_changed().await?;
                }
            }

            AppAction::MoveDown => {
                if self.selected_index + 1 < self.stories.len() {
                    self.selected_index += 1;
                    self.on_selection_changed().await?;
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
                self.on_selection_changed().await?;
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.stories.len().saturating_sub(1);
                self.on_selection_changed().await?;
            }

            AppAction::ScrollCommentsDown => {
                self.comment_scroll = self.comment_scroll.saturating_add(3);
            }

            AppAction::ScrollCommentsUp => {
                self.comment_scroll = self.comment_scroll.saturating_sub(3);
            }

            AppAction::ToggleSort => {
                self.sort_mode = self.sort_mode.toggle();
                self.reload_stories().await?;
            }

            AppAction::Refresh => {
                self.start_refresh();
            }

            AppAction::OpenInBrowser => {
                if let Some(story) = self.selected_story() {
                    let url = story.url.clone();
                    if let Err(e) = open::that(&url) {
                        tracing::warn!("Failed to open {}: {}", url, e);
                    }
                }
            }

            AppAction::ShowHelp => self.show_help = true,
            AppAction::HideHelp => self.show_help = false,

            AppAction::SearchStart => {
                self.search_input_active = true;
                self.search_input.clear();
            }

            AppAction::SearchChar(c) => self.search_input.push(c),

            AppAction::SearchBackspace => {
                self.search_input.pop();
            }

            AppAction::SearchConfirm => {
                self.search_input_active = false;
                let query = self.search_input.trim().to_string();
                self.active_search = (!query.is_empty()).then_some(query);
                self.reload_stories().await?;
            }

            AppAction::SearchCancel => {
                self.search_input_active = false;
                self.search_input.clear();
            }

            AppAction::ClearSearch => {
                if self.active_search.take().is_some() {
                    self.reload_stories().await?;
                }
            }
        }

        Ok(false)
    }

    async fn on_selection_changed(&mut self) -> Result<()> {
        self.comment_scroll = 0;
        self.forest = match self.selected_story() {
            Some(story) => {
                let comments = self.repository.get_comments_by_story_id(story.id).await?;
                build_comment_forest(&comments)
            }
            None => Vec::new(),
        };
        Ok(())
    }

    async fn reload_stories(&mut self) -> Result<()> {
        self.stories = match &self.active_search {
            Some(query) => {
                self.repository
                    .search_stories_by_title(query, DISPLAY_LIMIT)
                    .await?
            }
            None => {
                self.repository
                    .get_stories_ranked(DISPLAY_LIMIT, self.sort_mode)
                    .await?
            }
        };
        self.stats = self.repository.get_stats().await?;

        if self.selected_index >= self.stories.len() {
            self.selected_index = self.stories.len().saturating_sub(1);
        }
        self.on_selection_changed().await
    }

    fn start_refresh(&mut self) {
        if self.is_refreshing {
            return;
        }
        self.is_refreshing = true;
        self.status_message = None;

        // Run the cycle in the background so the UI keeps drawing
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let result = pipeline.refresh().await.map_err(|e| e.to_string());
            let _ = tx.send(RefreshResult { result }).await;
        });
    }

    /// Poll for a finished refresh (non-blocking)
    pub async fn poll_refresh_result(&mut self) -> Result<()> {
        if let Ok(refresh) = self.refresh_rx.try_recv() {
            self.is_refreshing = false;
            match refresh.result {
                Ok(report) => {
                    self.status_message = Some(format!(
                        "Refreshed {} stories, {} new comments",
                        report.stories, report.comments_inserted
                    ));
                    self.reload_stories().await?;
                }
                Err(e) => {
                    tracing::error!("Refresh failed: {}", e);
                    self.status_message = Some(format!("Refresh failed: {e}"));
                }
            }
        }
        Ok(())
    }
}
