use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod ai;
mod app;
mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod ranking;
mod source;
mod tree;
mod tui;

use app::App;
use config::Config;
use db::Repository;
use error::Result;
use models::Story;
use pipeline::{export_snapshot, Pipeline};
use tree::{build_comment_forest, flatten_with_depth, CommentNode};
use tui::{draw, handle_key_event};

enum Command {
    Refresh,
    Purge,
    Export(PathBuf),
    Stats,
    Date(String),
    Story(String),
    Browse,
}

fn parse_args(args: &[String]) -> Command {
    match args.get(1).map(String::as_str) {
        Some("--refresh") => Command::Refresh,
        Some("--purge") => Command::Purge,
        Some("--export") => Command::Export(
            args.get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("stories.json")),
        ),
        Some("--stats") => Command::Stats,
        Some("--date") => Command::Date(args.get(2).cloned().unwrap_or_default()),
        Some("--story") => Command::Story(args.get(2).cloned().unwrap_or_default()),
        _ => Command::Browse,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args);

    let config = Config::load()?;
    let repository = Arc::new(Repository::new(&config.db_path).await?);
    let pipeline = Arc::new(Pipeline::from_config(&config, Arc::clone(&repository))?);

    match command {
        Command::Refresh => {
            let report = pipeline.refresh().await?;
            println!(
                "Stored {} stories, fetched {} comments ({} new)",
                report.stories, report.comments_fetched, report.comments_inserted
            );
            Ok(())
        }
        Command::Purge => {
            let counts = pipeline.purge(config.retention_cutoff(Utc::now())).await?;
            println!(
                "Purged {} stories and {} comments older than {} days",
                counts.stories, counts.comments, config.retention_days
            );
            Ok(())
        }
        Command::Export(path) => {
            let written = export_snapshot(&repository, &path, config.story_limit * 2).await?;
            println!("Exported {} stories to {:?}", written, path);
            Ok(())
        }
        Command::Stats => {
            let stats = repository.get_stats().await?;
            let last_update = repository
                .last_update()
                .await?
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            println!("Stories:        {}", stats.story_count);
            println!("Total comments: {}", stats.total_comments);
            println!("Total points:   {}", stats.total_points);
            println!("Last update:    {}", last_update);
            Ok(())
        }
        Command::Date(date) => {
            let day = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("invalid date {:?}: {}", date, e))?;
            let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
            let end = start + chrono::Duration::days(1) - chrono::Duration::milliseconds(1);

            let stories = repository
                .get_stories_by_date_range(start, end, config.story_limit)
                .await?;
            for story in &stories {
                println!(
                    "{:>5} comments {:>5} points  {}",
                    story.comment_count,
                    story.score,
                    story.display_title()
                );
            }
            println!("{} stories fetched on {}", stories.len(), day);
            Ok(())
        }
        Command::Story(id) => {
            let remote_id: i64 = id
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid story id {:?}: {}", id, e))?;
            match repository.get_story_by_remote_id(remote_id).await? {
                Some(story) => {
                    let comments = repository.get_comments_by_story_id(story.id).await?;
                    print!("{}", format_thread(&story, &build_comment_forest(&comments)));
                }
                None => println!("Story {} is not stored", remote_id),
            }
            Ok(())
        }
        Command::Browse => browse(repository, pipeline).await,
    }
}

/// Plain-text rendering of one story and its reply tree.
fn format_thread(story: &Story, forest: &[CommentNode]) -> String {
    let mut out = format!("{}\n", story.display_title());
    if story.translated_title.is_some() {
        out.push_str(&format!("{}\n", story.title));
    }
    out.push_str(&format!(
        "{} points | {} comments | by {} | {}\n",
        story.score, story.comment_count, story.author, story.url
    ));
    if let Some(text) = &story.abstract_text {
        out.push_str(&format!("\n{}\n", text));
    }
    out.push('\n');

    for (depth, comment) in flatten_with_depth(forest) {
        let indent = "  ".repeat(depth);
        let body = comment.translated_body.as_deref().unwrap_or(&comment.body_text);
        out.push_str(&format!("{indent}{}:\n", comment.author));
        for line in textwrap::wrap(body, 80) {
            out.push_str(&format!("{indent}  {line}\n"));
        }
    }
    out
}

async fn browse(repository: Arc<Repository>, pipeline: Arc<Pipeline>) -> Result<()> {
    let mut app = App::new(repository, pipeline).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Poll for completed refresh results
        app.poll_refresh_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.search_input_active, app.show_help) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
