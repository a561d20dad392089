use crate::output::ELLIPSIS;
use crate::results::{Position, ResultModel, SearchState};
use crate::search::{FileResult, LineMatch, SearchMode};
use crate::tui::app::{App, Mode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Min(5),    // Results
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_query_input(f, app, chunks[0]);
    draw_results(f, app, chunks[1]);
    draw_status_bar(f, app, chunks[2]);

    if app.mode == Mode::Help {
        draw_help(f, f.area());
    }
}

fn draw_query_input(f: &mut Frame, app: &App, area: Rect) {
    let mode = match app.search_mode {
        SearchMode::Plain => "plain",
        SearchMode::Ranked => "ranked",
    };
    let case = if app.case_sensitive { "Aa" } else { "aa" };
    let title = format!(" Search [{} {}] (Ctrl+R: mode, Ctrl+T: case, ?: help) ", mode, case);

    let style = if app.mode == Mode::Query {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let input = Paragraph::new(app.query.as_str())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input, area);

    // Show cursor
    if app.mode == Mode::Query {
        let width = app.query.chars().count() as u16;
        f.set_cursor_position((area.x + width + 1, area.y + 1));
    }
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let model = app.model();
    let items: Vec<ListItem> = model
        .visible_rows()
        .into_iter()
        .filter_map(|row| match row {
            Position::Header { file } => model.file(file).map(header_row),
            Position::Line { file, line } => model
                .file(file)
                .and_then(|f| f.matches.get(line))
                .map(match_row),
        })
        .collect();

    let title = match &app.last_query {
        Some(query) => format!(
            " Results for \"{}\" ({} hits in {} files) ",
            query,
            model.total_hit_count(),
            model.len()
        ),
        None => " Results ".to_string(),
    };

    let border_style = if app.mode == Mode::Results {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default().with_selected(model.cursor_row());
    f.render_stateful_widget(list, area, &mut state);
}

fn header_row(file: &FileResult) -> ListItem<'_> {
    let marker = if file.folded { "▸ " } else { "▾ " };
    let mut spans = vec![
        Span::raw(marker),
        Span::styled(
            file.path.display().to_string(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" ({})", file.hit_count()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(score) = file.score {
        spans.push(Span::styled(
            format!(" score {:.4}", score),
            Style::default().fg(Color::Yellow),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn match_row(m: &LineMatch) -> ListItem<'_> {
    let mut spans = vec![Span::styled(
        format!("  {:>6}: ", m.line_number),
        Style::default().fg(Color::Green),
    )];
    if m.cut_before() {
        spans.push(Span::styled(format!("{} ", ELLIPSIS), Style::default().fg(Color::DarkGray)));
    }
    spans.extend(highlight_matches(m));
    if m.cut_after() {
        spans.push(Span::styled(format!(" {}", ELLIPSIS), Style::default().fg(Color::DarkGray)));
    }
    ListItem::new(Line::from(spans))
}

/// Split the display text into plain and highlighted spans
fn highlight_matches(m: &LineMatch) -> Vec<Span<'_>> {
    let text = m.display_text.as_str();
    let highlight = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut pos = 0;
    for span in m.visible_spans() {
        if span.start > pos {
            spans.push(Span::raw(&text[pos..span.start]));
        }
        spans.push(Span::styled(&text[span.start..span.end], highlight));
        pos = span.end;
    }
    if pos < text.len() {
        spans.push(Span::raw(&text[pos..]));
    }
    spans
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let model = app.model();
    let mut spans = Vec::new();

    if app.is_searching() {
        spans.push(Span::styled("● ", Style::default().fg(Color::Green)));
    }
    spans.push(Span::styled(
        app.status.message.as_str(),
        Style::default().fg(status_color(model)),
    ));
    if !model.diagnostics().is_empty() {
        spans.push(Span::styled(
            format!("  ({} files skipped)", model.diagnostics().len()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn status_color(model: &ResultModel) -> Color {
    match model.state() {
        SearchState::Truncated | SearchState::Cancelled => Color::Yellow,
        SearchState::Failed(_) => Color::Red,
        _ => Color::Cyan,
    }
}

const HELP: &[(&str, &str)] = &[
    ("Enter", "search (query) / open in $EDITOR (results)"),
    ("j / Down", "next line"),
    ("k / Up", "previous line"),
    ("n", "next file"),
    ("N / p", "previous file"),
    ("Tab / Space", "fold or unfold file"),
    ("z / Z", "fold / unfold all"),
    ("/ or i", "edit query"),
    ("Esc", "cancel search / back to query / quit"),
    ("Ctrl+R", "toggle plain / ranked search"),
    ("Ctrl+T", "toggle case sensitivity"),
    ("q / Ctrl+C", "quit"),
];

fn draw_help(f: &mut Frame, area: Rect) {
    let width = area.width.min(64);
    let height = area.height.min(HELP.len() as u16 + 2);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:>12}  ", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Keys ")),
        popup,
    );
}
