use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::tree::flatten_with_depth;

const INDENT: usize = 2;

pub fn draw(frame: &mut Frame, app: &App) {
    // Main horizontal split: story list left, discussion right
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(2, 5), Constraint::Ratio(3, 5)])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Story list
            Constraint::Length(1), // Status line
        ])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Story title
            Constraint::Percentage(30), // Abstract
            Constraint::Min(0),         // Comment tree
        ])
        .split(main_chunks[1]);

    render_header(frame, app, left_chunks[0]);
    render_story_list(frame, app, left_chunks[1]);
    render_status(frame, app, left_chunks[2]);

    render_story_title(frame, app, right_chunks[0]);
    render_abstract(frame, app, right_chunks[1]);
    render_comments(frame, app, right_chunks[2]);

    if app.search_input_active {
        render_search_input(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.active_search {
        Some(query) => format!(" HN Digest [search: {query}] "),
        None => format!(" HN Digest [by {}] ", app.sort_mode.label()),
    };
    let stats = format!(
        " {} stories | {} comments | {} points",
        app.stats.story_count, app.stats.total_comments, app.stats.total_points
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_story_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .stories
        .iter()
        .map(|story| {
            let line = Line::from(vec![
                Span::styled(format!("{:>4}▲ ", story.score), Style::default().fg(Color::Yellow)),
                Span::styled(format!("{:>4}💬 ", story.comment_count), Style::default().fg(Color::Blue)),
                Span::styled(story.display_title(), Style::default().fg(Color::White)),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.stories.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.is_refreshing {
        "Refreshing stories...".to_string()
    } else if let Some(message) = &app.status_message {
        message.clone()
    } else {
        "j/k:nav  s:sort  /:search  r:refresh  o:open  ?:help  q:quit".to_string()
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_story_title(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .selected_story()
        .map(|s| s.title.as_str())
        .unwrap_or("No story selected");

    let block = Block::default()
        .title(" Story ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(title).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_abstract(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_story() {
        Some(story) => {
            let mut text = story
                .abstract_text
                .clone()
                .unwrap_or_else(|| "No abstract yet. Press 'r' to refresh.".to_string());
            text.push_str(&format!("\n\nby {} | {}", story.author, story.url));
            text
        }
        None => "No stories stored yet. Press 'r' to refresh.".to_string(),
    };

    let block = Block::default()
        .title(" Abstract ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_comments(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Comments ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    let width = block.inner(area).width as usize;

    let mut lines: Vec<Line> = Vec::new();
    for (depth, comment) in flatten_with_depth(&app.forest) {
        let indent = " ".repeat(depth * INDENT);
        lines.push(Line::from(vec![
            Span::raw(indent.clone()),
            Span::styled(
                comment.author.clone(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", comment.created_at.format("%Y-%m-%d %H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        let wrap_width = width.saturating_sub(indent.len()).max(10);
        let original_style = match &comment.translated_body {
            Some(translated) => {
                for wrapped in textwrap::wrap(translated, wrap_width) {
                    lines.push(Line::from(format!("{indent}{wrapped}")));
                }
                Style::default().fg(Color::DarkGray)
            }
            None => Style::default(),
        };
        for wrapped in textwrap::wrap(&comment.body_text, wrap_width) {
            lines.push(Line::styled(format!("{indent}{wrapped}"), original_style));
        }
        lines.push(Line::default());
    }

    if lines.is_empty() {
        lines.push(Line::from("No comments"));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.comment_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_search_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(" Search titles ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", app.search_input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = [
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   < / >    First / last story",
        "   J / K    Scroll comments",
        "",
        " Actions:",
        "   s        Toggle sort (comments / points)",
        "   /        Search titles",
        "   Esc      Clear search",
        "   r        Refresh from Hacker News",
        "   o        Open in browser",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
