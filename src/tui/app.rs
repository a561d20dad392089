use crate::config::SearchConfig;
use crate::results::{NavCommand, OpenTarget, ResultModel, ResultPresenter, SearchSession};
use crate::search::{DirectorySource, SearchEngine, SearchMode, SearchProgress, SearchRequest, SearchSummary};
use crate::utils::progress::format_progress;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Typing in the query line
    Query,
    /// Navigating the result tree
    Results,
    Help,
}

/// Status bar text, updated from search events
#[derive(Debug, Default)]
pub struct StatusLine {
    pub message: String,
}

impl ResultPresenter for StatusLine {
    fn on_progress(&mut self, progress: &SearchProgress) {
        self.message = format_progress(progress);
    }

    fn on_finished(&mut self, model: &ResultModel, summary: &SearchSummary) {
        self.message = format!(
            "{}: {} hits in {} files [{} files searched in {:.1} seconds]",
            summary.status,
            model.total_hit_count(),
            model.len(),
            summary.progress.files_searched,
            summary.progress.elapsed.as_secs_f64()
        );
    }
}

/// Application state
pub struct App {
    pub roots: Vec<PathBuf>,
    config: SearchConfig,
    session: SearchSession,
    pub query: String,
    pub mode: Mode,
    /// Previous mode before entering help (to return to)
    pub previous_mode: Mode,
    pub search_mode: SearchMode,
    pub case_sensitive: bool,
    pub status: StatusLine,
    /// Selection to open once the terminal is released
    pending_open: Option<OpenTarget>,
    /// Query the current results belong to
    pub last_query: Option<String>,
}

impl App {
    pub fn new(roots: Vec<PathBuf>, config: SearchConfig, search_mode: SearchMode) -> Self {
        let source = DirectorySource::from_config(roots.clone(), &config);
        let session = SearchSession::new(SearchEngine::new(Arc::new(source)));
        let case_sensitive = config.case_sensitive;

        Self {
            roots,
            config,
            session,
            query: String::new(),
            mode: Mode::Query,
            previous_mode: Mode::Query,
            search_mode,
            case_sensitive,
            status: StatusLine {
                message: "Type a query and press Enter (? for help)".into(),
            },
            pending_open: None,
            last_query: None,
        }
    }

    pub fn model(&self) -> &ResultModel {
        self.session.model()
    }

    pub fn is_searching(&self) -> bool {
        self.session.is_running()
    }

    /// Apply pending search events (non-blocking). Returns true on change.
    pub fn poll_search(&mut self) -> bool {
        self.session.pump(&mut self.status)
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    /// Delete the word before the end of the query
    pub fn delete_word(&mut self) {
        let trimmed = self.query.trim_end();
        let cut = trimmed
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.query.truncate(cut);
    }

    /// Start a search for the current query, replacing any running one
    pub fn execute_search(&mut self) {
        if self.query.trim().is_empty() {
            return;
        }

        let config = SearchConfig {
            case_sensitive: self.case_sensitive,
            ..self.config.clone()
        };
        self.session
            .start(SearchRequest::new(self.query.clone(), self.search_mode, config));
        self.last_query = Some(self.query.clone());
        self.status.message = "Searching...".into();
        self.mode = Mode::Results;
    }

    pub fn toggle_search_mode(&mut self) {
        self.search_mode = match self.search_mode {
            SearchMode::Plain => SearchMode::Ranked,
            SearchMode::Ranked => SearchMode::Plain,
        };
    }

    pub fn toggle_case_sensitive(&mut self) {
        self.case_sensitive = !self.case_sensitive;
    }

    /// Navigation keys in results mode
    pub fn navigate(&mut self, command: NavCommand) {
        if let Some(target) = self.session.apply(command) {
            self.pending_open = Some(target);
        }
    }

    /// Cancel the running search, or go back to editing the query
    pub fn cancel_or_back(&mut self) {
        if self.is_searching() {
            self.navigate(NavCommand::Cancel);
        } else {
            self.mode = Mode::Query;
        }
    }

    pub fn set_all_folded(&mut self, folded: bool) {
        self.session.model_mut().set_all_folded(folded);
    }

    pub fn show_help(&mut self) {
        if self.mode != Mode::Help {
            self.previous_mode = self.mode;
            self.mode = Mode::Help;
        }
    }

    pub fn hide_help(&mut self) {
        self.mode = self.previous_mode;
    }

    pub fn take_pending_open(&mut self) -> Option<OpenTarget> {
        self.pending_open.take()
    }
}

/// Open `target` in `$EDITOR` (default `vi`), at its line when known
pub fn open_in_editor(target: &OpenTarget) -> Result<()> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    let mut command = Command::new(&editor);
    if let Some(line) = target.line_number {
        // Format line number for editors that support it
        command.arg(format!("+{}", line));
    }
    command
        .arg(&target.path)
        .status()
        .with_context(|| format!("Failed to launch editor `{}`", editor))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn app_with(files: &[(&str, &str)]) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let app = App::new(vec![dir.path().to_path_buf()], SearchConfig::default(), SearchMode::Plain);
        (dir, app)
    }

    fn finish(app: &mut App) {
        while app.is_searching() {
            app.poll_search();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    #[test]
    fn test_search_and_open() {
        let (dir, mut app) = app_with(&[("a.txt", "x\nneedle\n")]);
        app.set_query("needle");
        app.execute_search();
        assert_eq!(app.mode, Mode::Results);
        finish(&mut app);

        assert_eq!(app.model().len(), 1);
        assert!(app.status.message.starts_with("Search finished: 1 hits in 1 files"));

        app.navigate(NavCommand::OpenSelected);
        let target = app.take_pending_open().unwrap();
        assert_eq!(target.path, dir.path().join("a.txt"));
        assert_eq!(target.line_number, Some(2));
        assert!(app.take_pending_open().is_none());
    }

    #[test]
    fn test_blank_query_does_not_search() {
        let (_dir, mut app) = app_with(&[("a.txt", "needle")]);
        app.set_query("   ");
        app.execute_search();
        assert!(!app.is_searching());
        assert_eq!(app.mode, Mode::Query);
    }

    #[test]
    fn test_case_toggle_applies_to_next_search() {
        let (_dir, mut app) = app_with(&[("a.txt", "NEEDLE")]);
        app.set_query("needle");
        app.execute_search();
        finish(&mut app);
        assert!(app.model().is_empty());

        app.toggle_case_sensitive();
        app.execute_search();
        finish(&mut app);
        assert_eq!(app.model().len(), 1);
    }

    #[test]
    fn test_ranked_mode_toggle() {
        let (_dir, mut app) = app_with(&[("a.txt", "cat dog cat"), ("b.txt", "dog dog")]);
        app.toggle_search_mode();
        assert_eq!(app.search_mode, SearchMode::Ranked);
        app.set_query("cat");
        app.execute_search();
        finish(&mut app);
        assert_eq!(app.model().len(), 1);
        assert!(app.model().files()[0].score.is_some());
    }

    #[test]
    fn test_delete_word() {
        let (_dir, mut app) = app_with(&[]);
        app.set_query("fn main ");
        app.delete_word();
        assert_eq!(app.query, "fn ");
        app.delete_word();
        assert_eq!(app.query, "");
    }

    #[test]
    fn test_help_returns_to_previous_mode() {
        let (_dir, mut app) = app_with(&[]);
        app.mode = Mode::Results;
        app.show_help();
        app.show_help();
        assert_eq!(app.mode, Mode::Help);
        app.hide_help();
        assert_eq!(app.mode, Mode::Results);
    }
}
