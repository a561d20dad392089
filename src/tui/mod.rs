//! Interactive result view.
//!
//! Results stream into a foldable tree while the search runs; the keys map
//! onto the result model's navigation operations.

mod app;
mod ui;

use crate::config::SearchConfig;
use crate::results::NavCommand;
use crate::search::SearchMode;
use anyhow::Result;
use app::{App, Mode};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

pub fn run(
    roots: Vec<PathBuf>,
    config: SearchConfig,
    mode: SearchMode,
    initial_query: Option<String>,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Clear the terminal to prevent any artifacts from previous content
    terminal.clear()?;

    let mut app = App::new(roots, config, mode);
    if let Some(query) = initial_query {
        app.set_query(&query);
        app.execute_search();
    }

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply finished search batches (non-blocking)
        app.poll_search();

        terminal.draw(|f| ui::draw(f, app))?;

        if let Some(target) = app.take_pending_open() {
            // Hand the terminal to the editor, then take it back
            disable_raw_mode()?;
            execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
            let opened = app::open_in_editor(&target);
            enable_raw_mode()?;
            execute!(terminal.backend_mut(), EnterAlternateScreen)?;
            terminal.clear()?;
            if let Err(err) = opened {
                app.status.message = err.to_string();
            }
            continue;
        }

        // Poll for events with timeout for responsive UI
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        // Only handle key press events, not release or repeat
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Global keybindings
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::CONTROL, KeyCode::Char('q')) => return Ok(()),
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                app.toggle_search_mode();
                continue;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('t')) => {
                app.toggle_case_sensitive();
                continue;
            }
            _ => {}
        }

        match app.mode {
            Mode::Help => app.hide_help(),
            Mode::Query => match (key.modifiers, key.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('w')) => app.delete_word(),
                (KeyModifiers::CONTROL, KeyCode::Char('u')) => app.clear_query(),
                (KeyModifiers::NONE | KeyModifiers::SHIFT, code) => match code {
                    KeyCode::Esc => {
                        if app.query.is_empty() {
                            return Ok(());
                        }
                        app.clear_query();
                    }
                    KeyCode::Enter => app.execute_search(),
                    KeyCode::Down | KeyCode::Tab => app.mode = Mode::Results,
                    KeyCode::Char('?') if app.query.is_empty() => app.show_help(),
                    KeyCode::Char(c) => app.query.push(c),
                    KeyCode::Backspace => {
                        app.query.pop();
                    }
                    KeyCode::F(1) => app.show_help(),
                    _ => {}
                },
                _ => {}
            },
            Mode::Results => match key.code {
                KeyCode::Down | KeyCode::Char('j') => app.navigate(NavCommand::NextLine),
                KeyCode::Up | KeyCode::Char('k') => app.navigate(NavCommand::PrevLine),
                KeyCode::Char('n') => app.navigate(NavCommand::NextFile),
                KeyCode::Char('N') | KeyCode::Char('p') => app.navigate(NavCommand::PrevFile),
                KeyCode::Tab | KeyCode::Char(' ') => app.navigate(NavCommand::ToggleFold),
                KeyCode::Enter | KeyCode::Char('o') => app.navigate(NavCommand::OpenSelected),
                KeyCode::Char('z') => app.set_all_folded(true),
                KeyCode::Char('Z') => app.set_all_folded(false),
                KeyCode::Char('/') | KeyCode::Char('i') => app.mode = Mode::Query,
                KeyCode::Char('?') | KeyCode::F(1) => app.show_help(),
                KeyCode::Esc => app.cancel_or_back(),
                KeyCode::Char('q') => return Ok(()),
                _ => {}
            },
        }
    }
}
