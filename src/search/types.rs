use crate::config::SearchConfig;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Which front end drives the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Literal substring search, results in traversal order
    #[default]
    Plain,
    /// tf-idf ranked document search, results in score order
    Ranked,
}

/// One search invocation. Immutable once the search starts.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub mode: SearchMode,
    pub config: Arc<SearchConfig>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, mode: SearchMode, config: SearchConfig) -> Self {
        Self {
            query: query.into(),
            mode,
            config: Arc::new(config),
        }
    }

    pub fn plain(query: impl Into<String>, config: SearchConfig) -> Self {
        Self::new(query, SearchMode::Plain, config)
    }

    pub fn ranked(query: impl Into<String>, config: SearchConfig) -> Self {
        Self::new(query, SearchMode::Ranked, config)
    }
}

/// Byte range of one occurrence within the untruncated line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A line containing at least one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// 1-based line number
    pub line_number: usize,
    /// At most `max_line_length` characters of the line
    pub display_text: String,
    /// Byte offset in the full line where `display_text` starts
    pub display_start: usize,
    /// Byte length of the full line (without terminator)
    pub line_len: usize,
    /// Every occurrence, relative to the full line
    pub match_spans: Vec<MatchSpan>,
    /// Whether `display_text` is only part of the line
    pub truncated: bool,
}

impl LineMatch {
    /// Byte offset in the full line where `display_text` ends
    pub fn display_end(&self) -> usize {
        self.display_start + self.display_text.len()
    }

    /// Spans clipped to `display_text`, relative to it. Spans entirely outside
    /// the window are dropped.
    pub fn visible_spans(&self) -> Vec<MatchSpan> {
        let (lo, hi) = (self.display_start, self.display_end());
        self.match_spans
            .iter()
            .filter(|span| span.end > lo && span.start < hi)
            .map(|span| MatchSpan::new(span.start.max(lo) - lo, span.end.min(hi) - lo))
            .collect()
    }

    /// Text was cut before the start of the line
    pub fn cut_before(&self) -> bool {
        self.display_start > 0
    }

    /// Text was cut before the end of the line
    pub fn cut_after(&self) -> bool {
        self.display_end() < self.line_len
    }
}

/// All matches found in one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    /// tf-idf score, ranked mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub matches: Vec<LineMatch>,
    #[serde(skip)]
    pub folded: bool,
}

impl FileResult {
    pub fn new(path: PathBuf, score: Option<f64>, matches: Vec<LineMatch>) -> Self {
        Self {
            path,
            score,
            matches,
            folded: false,
        }
    }

    pub fn hit_count(&self) -> usize {
        self.matches.len()
    }
}

/// Results ready for display, emitted before the search completes
#[derive(Debug, Clone, Default)]
pub struct ResultBatch {
    pub files: Vec<FileResult>,
}

impl ResultBatch {
    pub fn hit_count(&self) -> usize {
        self.files.iter().map(FileResult::hit_count).sum()
    }
}

/// Why a file was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Could not be opened or read
    Unreadable { reason: String },
    /// No candidate encoding decoded it cleanly
    Undecodable,
    /// Decoded text contains NUL
    Binary,
    /// Larger than `max_file_size`
    TooLarge { size: u64 },
    /// The source could not enumerate an entry (permission denied, symlink loop)
    WalkError { reason: String },
}

/// A per-file problem recorded while the search continues
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = self.path.display();
        match &self.kind {
            DiagnosticKind::Unreadable { reason } => write!(f, "{}: unreadable ({})", path, reason),
            DiagnosticKind::Undecodable => {
                write!(f, "{}: unknown or unspecified encoding", path)
            }
            DiagnosticKind::Binary => write!(f, "{}: skipped binary file", path),
            DiagnosticKind::TooLarge { size } => write!(
                f,
                "{}: skipped file due to size ({:.2} MB)",
                path,
                *size as f64 / 1_000_000.0
            ),
            DiagnosticKind::WalkError { reason } => write!(f, "{}: {}", path, reason),
        }
    }
}

/// Counters reported while a search runs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchProgress {
    pub files_searched: usize,
    pub files_matched: usize,
    pub hits: usize,
    pub elapsed: Duration,
}

/// Terminal state of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Completed,
    /// Stopped at `max_hit_count`
    Truncated,
    Cancelled,
    Failed(String),
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStatus::Completed => write!(f, "Search finished"),
            SearchStatus::Truncated => write!(f, "Search truncated (excessive number of hits)"),
            SearchStatus::Cancelled => write!(f, "Search cancelled"),
            SearchStatus::Failed(reason) => write!(f, "Search failed: {}", reason),
        }
    }
}

/// Final report of one search run
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub status: SearchStatus,
    pub progress: SearchProgress,
}

/// Everything the worker sends to the presenter side
#[derive(Debug, Clone)]
pub enum SearchEvent {
    Batch(ResultBatch),
    Diagnostic(Diagnostic),
    Progress(SearchProgress),
    /// Always the last event of a run
    Finished(SearchSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(display_start: usize, display_text: &str, line_len: usize, spans: &[(usize, usize)]) -> LineMatch {
        LineMatch {
            line_number: 1,
            display_text: display_text.to_string(),
            display_start,
            line_len,
            match_spans: spans.iter().map(|&(s, e)| MatchSpan::new(s, e)).collect(),
            truncated: display_start > 0 || display_start + display_text.len() < line_len,
        }
    }

    #[test]
    fn test_visible_spans_untruncated() {
        let m = line(0, "foo bar foo", 11, &[(0, 3), (8, 11)]);
        assert_eq!(m.visible_spans(), vec![MatchSpan::new(0, 3), MatchSpan::new(8, 11)]);
        assert!(!m.cut_before());
        assert!(!m.cut_after());
    }

    #[test]
    fn test_visible_spans_clipped() {
        // Full line "xxfooxxxxfoo", window "fooxx" starting at byte 2
        let m = line(2, "fooxx", 12, &[(2, 5), (9, 12)]);
        assert_eq!(m.visible_spans(), vec![MatchSpan::new(0, 3)]);
        assert!(m.cut_before());
        assert!(m.cut_after());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            path: PathBuf::from("big.log"),
            kind: DiagnosticKind::TooLarge { size: 25_000_000 },
        };
        assert_eq!(d.to_string(), "big.log: skipped file due to size (25.00 MB)");
    }

    #[test]
    fn test_batch_hit_count() {
        let batch = ResultBatch {
            files: vec![
                FileResult::new("a".into(), None, vec![line(0, "a", 1, &[(0, 1)])]),
                FileResult::new(
                    "b".into(),
                    None,
                    vec![line(0, "b", 1, &[(0, 1)]), line(0, "b", 1, &[(0, 1)])],
                ),
            ],
        };
        assert_eq!(batch.hit_count(), 3);
    }
}
