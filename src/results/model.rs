//! Aggregated results with fold and cursor state.
//!
//! The visible rows are, in order, each file's header followed by its match
//! lines unless the file is folded. The cursor always sits on one of those
//! rows, or is `None` while there are no results.

use crate::search::{
    Diagnostic, FileResult, ResultBatch, SearchMode, SearchProgress, SearchStatus,
};
use serde::Serialize;
use std::path::PathBuf;

/// A visible row of the result view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The file's header row
    Header { file: usize },
    /// A match line inside an unfolded file
    Line { file: usize, line: usize },
}

impl Position {
    pub fn file(&self) -> usize {
        match *self {
            Position::Header { file } | Position::Line { file, .. } => file,
        }
    }
}

/// Lifecycle of the search feeding a model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Running,
    Completed,
    Truncated,
    Cancelled,
    Failed(String),
}

impl From<SearchStatus> for SearchState {
    fn from(status: SearchStatus) -> Self {
        match status {
            SearchStatus::Completed => SearchState::Completed,
            SearchStatus::Truncated => SearchState::Truncated,
            SearchStatus::Cancelled => SearchState::Cancelled,
            SearchStatus::Failed(reason) => SearchState::Failed(reason),
        }
    }
}

impl SearchState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, SearchState::Idle | SearchState::Running)
    }
}

/// What the presenter should open for the current selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTarget {
    pub path: PathBuf,
    /// `None` when a file header is selected
    pub line_number: Option<usize>,
}

/// Results of one search, in display order
#[derive(Debug, Default)]
pub struct ResultModel {
    files: Vec<FileResult>,
    cursor: Option<Position>,
    total_hit_count: usize,
    mode: SearchMode,
    state: SearchState,
    progress: SearchProgress,
    diagnostics: Vec<Diagnostic>,
}

impl ResultModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all results and fold state for a new search
    pub fn start(&mut self, mode: SearchMode) {
        *self = Self {
            mode,
            state: SearchState::Running,
            ..Self::default()
        };
    }

    /// Append files in the order they were emitted
    pub fn append(&mut self, batch: ResultBatch) {
        for file in batch.files {
            self.total_hit_count += file.hit_count();
            self.files.push(file);
        }
        if self.cursor.is_none() && !self.files.is_empty() {
            self.cursor = Some(self.entry(0));
        }
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn set_progress(&mut self, progress: SearchProgress) {
        self.progress = progress;
    }

    pub fn finish(&mut self, status: SearchStatus) {
        self.state = status.into();
    }

    pub fn files(&self) -> &[FileResult] {
        &self.files
    }

    pub fn file(&self, index: usize) -> Option<&FileResult> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_hit_count(&self) -> usize {
        self.total_hit_count
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn is_truncated(&self) -> bool {
        self.state == SearchState::Truncated
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == SearchState::Cancelled
    }

    pub fn progress(&self) -> SearchProgress {
        self.progress
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn cursor(&self) -> Option<Position> {
        self.cursor
    }

    /// Index of the file under the cursor
    pub fn selected_file(&self) -> Option<usize> {
        self.cursor.map(|p| p.file())
    }

    // Navigation

    /// Move to the next visible row. No-op on the last row.
    pub fn next_line(&mut self) {
        if let Some(next) = self.cursor.and_then(|pos| self.row_after(pos)) {
            self.cursor = Some(next);
        }
    }

    /// Move to the previous visible row. No-op on the first row.
    pub fn prev_line(&mut self) {
        if let Some(prev) = self.cursor.and_then(|pos| self.row_before(pos)) {
            self.cursor = Some(prev);
        }
    }

    /// Move to the first line of the next file (its header if folded).
    /// No-op on the last file.
    pub fn next_file(&mut self) {
        if let Some(file) = self.selected_file()
            && file + 1 < self.files.len()
        {
            self.cursor = Some(self.entry(file + 1));
        }
    }

    /// Move to the first line of the previous file (its header if folded).
    /// No-op on the first file.
    pub fn prev_file(&mut self) {
        if let Some(file) = self.selected_file()
            && file > 0
        {
            self.cursor = Some(self.entry(file - 1));
        }
    }

    /// Flip the fold state of a file. Out-of-range indices are ignored.
    pub fn toggle_fold(&mut self, file: usize) {
        if let Some(folded) = self.files.get(file).map(|f| f.folded) {
            self.set_folded(file, !folded);
        }
    }

    /// Fold or unfold a file. A cursor inside a file being folded moves to
    /// its header.
    pub fn set_folded(&mut self, file: usize, folded: bool) {
        let Some(result) = self.files.get_mut(file) else {
            return;
        };
        result.folded = folded;
        if folded && let Some(Position::Line { file: at, .. }) = self.cursor && at == file {
            self.cursor = Some(Position::Header { file });
        }
    }

    /// Fold or unfold every file
    pub fn set_all_folded(&mut self, folded: bool) {
        for file in 0..self.files.len() {
            self.set_folded(file, folded);
        }
    }

    /// Path and line under the cursor
    pub fn open_selected(&self) -> Option<OpenTarget> {
        let pos = self.cursor?;
        let file = self.files.get(pos.file())?;
        let line_number = match pos {
            Position::Header { .. } => None,
            Position::Line { line, .. } => file.matches.get(line).map(|m| m.line_number),
        };
        Some(OpenTarget {
            path: file.path.clone(),
            line_number,
        })
    }

    // Rendering helpers

    /// All visible rows in display order
    pub fn visible_rows(&self) -> Vec<Position> {
        let mut rows = Vec::new();
        for (file, result) in self.files.iter().enumerate() {
            rows.push(Position::Header { file });
            if !result.folded {
                rows.extend((0..result.matches.len()).map(|line| Position::Line { file, line }));
            }
        }
        rows
    }

    /// Index of the cursor within [`visible_rows`](Self::visible_rows)
    pub fn cursor_row(&self) -> Option<usize> {
        let cursor = self.cursor?;
        let mut row = 0;
        for (file, result) in self.files.iter().enumerate() {
            if file == cursor.file() {
                return Some(match cursor {
                    Position::Header { .. } => row,
                    Position::Line { line, .. } => row + 1 + line,
                });
            }
            row += 1 + self.visible_lines(result);
        }
        None
    }

    fn visible_lines(&self, file: &FileResult) -> usize {
        if file.folded { 0 } else { file.matches.len() }
    }

    /// Where the cursor lands when entering a file
    fn entry(&self, file: usize) -> Position {
        match self.files.get(file) {
            Some(result) if !result.folded && !result.matches.is_empty() => {
                Position::Line { file, line: 0 }
            }
            _ => Position::Header { file },
        }
    }

    fn row_after(&self, pos: Position) -> Option<Position> {
        let file = pos.file();
        let lines = self.files.get(file).map(|f| self.visible_lines(f))?;
        let next_line = match pos {
            Position::Header { .. } => 0,
            Position::Line { line, .. } => line + 1,
        };
        if next_line < lines {
            Some(Position::Line { file, line: next_line })
        } else if file + 1 < self.files.len() {
            Some(Position::Header { file: file + 1 })
        } else {
            None
        }
    }

    fn row_before(&self, pos: Position) -> Option<Position> {
        match pos {
            Position::Line { file, line } if line > 0 => Some(Position::Line { file, line: line - 1 }),
            Position::Line { file, .. } => Some(Position::Header { file }),
            Position::Header { file } if file > 0 => {
                let prev = file - 1;
                let lines = self.visible_lines(&self.files[prev]);
                Some(if lines > 0 {
                    Position::Line { file: prev, line: lines - 1 }
                } else {
                    Position::Header { file: prev }
                })
            }
            Position::Header { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{LineMatch, MatchSpan};

    fn line(n: usize) -> LineMatch {
        LineMatch {
            line_number: n,
            display_text: "foo".into(),
            display_start: 0,
            line_len: 3,
            match_spans: vec![MatchSpan::new(0, 3)],
            truncated: false,
        }
    }

    fn file(name: &str, lines: &[usize]) -> FileResult {
        FileResult::new(PathBuf::from(name), None, lines.iter().map(|&n| line(n)).collect())
    }

    fn model(shape: &[usize]) -> ResultModel {
        let mut model = ResultModel::new();
        model.start(SearchMode::Plain);
        model.append(ResultBatch {
            files: shape
                .iter()
                .enumerate()
                .map(|(i, &n)| file(&format!("f{}", i), &(1..=n).collect::<Vec<_>>()))
                .collect(),
        });
        model
    }

    fn header(file: usize) -> Option<Position> {
        Some(Position::Header { file })
    }

    fn at(file: usize, line: usize) -> Option<Position> {
        Some(Position::Line { file, line })
    }

    #[test]
    fn test_empty_model_has_no_cursor() {
        let mut model = ResultModel::new();
        assert_eq!(model.state(), &SearchState::Idle);
        model.next_line();
        model.prev_file();
        model.toggle_fold(0);
        assert_eq!(model.cursor(), None);
        assert_eq!(model.open_selected(), None);
        assert!(model.visible_rows().is_empty());
    }

    #[test]
    fn test_initial_cursor_on_first_line() {
        let model = model(&[2, 1]);
        assert_eq!(model.cursor(), at(0, 0));
        assert_eq!(model.total_hit_count(), 3);
        assert_eq!(model.cursor_row(), Some(1));
    }

    #[test]
    fn test_initial_cursor_on_header_without_lines() {
        let model = model(&[0, 1]);
        assert_eq!(model.cursor(), header(0));
    }

    #[test]
    fn test_next_line_walks_rows_including_headers() {
        let mut model = model(&[2, 1]);
        let mut seen = vec![model.cursor()];
        for _ in 0..5 {
            model.next_line();
            seen.push(model.cursor());
        }
        assert_eq!(
            seen,
            vec![at(0, 0), at(0, 1), header(1), at(1, 0), at(1, 0), at(1, 0)]
        );
    }

    #[test]
    fn test_prev_line_walks_back() {
        let mut model = model(&[2, 1]);
        model.next_file();
        assert_eq!(model.cursor(), at(1, 0));
        model.prev_line();
        assert_eq!(model.cursor(), header(1));
        model.prev_line();
        assert_eq!(model.cursor(), at(0, 1));
        model.prev_line();
        model.prev_line();
        assert_eq!(model.cursor(), header(0));
        model.prev_line();
        assert_eq!(model.cursor(), header(0));
    }

    #[test]
    fn test_folded_lines_are_skipped() {
        let mut model = model(&[2, 2, 1]);
        model.toggle_fold(1);
        model.next_line();
        model.next_line();
        assert_eq!(model.cursor(), header(1));
        model.next_line();
        assert_eq!(model.cursor(), header(2));
        model.prev_line();
        assert_eq!(model.cursor(), header(1));
    }

    #[test]
    fn test_file_navigation_boundaries() {
        let mut model = model(&[1, 1, 1]);
        model.prev_file();
        assert_eq!(model.cursor(), at(0, 0));
        model.next_file();
        model.next_file();
        assert_eq!(model.cursor(), at(2, 0));
        model.next_file();
        assert_eq!(model.cursor(), at(2, 0));
    }

    #[test]
    fn test_next_file_lands_on_header_of_folded_file() {
        let mut model = model(&[1, 3]);
        model.set_folded(1, true);
        model.next_file();
        assert_eq!(model.cursor(), header(1));
    }

    #[test]
    fn test_next_then_prev_file_returns_to_first_line() {
        let shapes: &[&[usize]] = &[&[1, 1, 1], &[3, 0, 2, 5], &[2, 2, 2, 2, 2]];
        for shape in shapes {
            for start in 0..shape.len() - 1 {
                let mut model = model(shape);
                for _ in 0..start {
                    model.next_file();
                }
                let origin = model.cursor();
                model.next_file();
                assert_ne!(model.cursor(), origin);
                model.prev_file();
                assert_eq!(model.cursor(), origin, "shape {:?} file {}", shape, start);
            }
        }
    }

    #[test]
    fn test_fold_twice_restores_visible_rows() {
        let mut model = model(&[3, 0, 2]);
        for file in 0..3 {
            let before = model.visible_rows();
            model.toggle_fold(file);
            model.toggle_fold(file);
            assert_eq!(model.visible_rows(), before);
        }
        model.toggle_fold(0);
        assert_eq!(model.visible_rows().len(), 1 + 1 + 3);
    }

    #[test]
    fn test_folding_moves_cursor_to_header() {
        let mut model = model(&[3, 1]);
        model.next_line();
        assert_eq!(model.cursor(), at(0, 1));
        model.toggle_fold(0);
        assert_eq!(model.cursor(), header(0));

        // Folding another file leaves the cursor alone
        model.next_line();
        assert_eq!(model.cursor(), header(1));
        model.set_all_folded(false);
        model.toggle_fold(0);
        assert_eq!(model.cursor(), header(1));
    }

    #[test]
    fn test_cursor_always_visible() {
        let mut model = model(&[2, 3, 0, 1]);
        let ops: [fn(&mut ResultModel); 5] = [
            ResultModel::next_line,
            ResultModel::next_line,
            ResultModel::next_file,
            ResultModel::prev_line,
            ResultModel::prev_file,
        ];
        for step in 0..40 {
            ops[step % ops.len()](&mut model);
            if step % 3 == 0 {
                let file = model.selected_file().unwrap();
                model.toggle_fold(file);
            }
            let cursor = model.cursor().unwrap();
            assert!(model.visible_rows().contains(&cursor));
            assert_eq!(model.visible_rows()[model.cursor_row().unwrap()], cursor);
        }
    }

    #[test]
    fn test_open_selected() {
        let mut model = ResultModel::new();
        model.start(SearchMode::Plain);
        model.append(ResultBatch {
            files: vec![file("src/lib.rs", &[4, 9])],
        });
        model.next_line();
        assert_eq!(
            model.open_selected(),
            Some(OpenTarget {
                path: PathBuf::from("src/lib.rs"),
                line_number: Some(9)
            })
        );
        model.toggle_fold(0);
        assert_eq!(model.open_selected().unwrap().line_number, None);
    }

    #[test]
    fn test_start_resets_state() {
        let mut model = model(&[2]);
        model.toggle_fold(0);
        model.finish(SearchStatus::Truncated);
        assert!(model.is_truncated());

        model.start(SearchMode::Ranked);
        assert!(model.is_empty());
        assert_eq!(model.total_hit_count(), 0);
        assert_eq!(model.state(), &SearchState::Running);
        assert_eq!(model.mode(), SearchMode::Ranked);

        model.append(ResultBatch {
            files: vec![file("a", &[1])],
        });
        assert!(!model.files()[0].folded);
    }

    #[test]
    fn test_hits_accumulate_across_batches() {
        let mut model = model(&[1]);
        model.append(ResultBatch {
            files: vec![file("b", &[1, 2, 3])],
        });
        assert_eq!(model.total_hit_count(), 4);
        assert_eq!(model.cursor(), at(0, 0));
        model.finish(SearchStatus::Cancelled);
        assert!(model.is_cancelled());
        assert!(model.state().is_finished());
    }
}
