//! The search worker.
//!
//! A search runs on one background thread and talks to its consumer through
//! an mpsc channel of [`SearchEvent`]s. Cancellation is a shared flag checked
//! between files; an in-flight file read is never interrupted. Dropping the
//! receiving side also stops the worker.

use crate::error::{ConfigError, EngineError, ReadError};
use crate::search::filter::{FileFilter, FilterRejection};
use crate::search::ranker::{Document, TfIdfRanker};
use crate::search::scanner::MatchScanner;
use crate::search::source::{FileCandidate, FileWalk, ProjectSource, WalkEntry};
use crate::search::types::{
    Diagnostic, DiagnosticKind, FileResult, ResultBatch, SearchEvent, SearchMode, SearchProgress,
    SearchRequest, SearchStatus, SearchSummary,
};
use crate::utils::encoding::{is_binary, EncodingReader};
use crate::utils::tokenizer::tokenize_query;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Minimum time between two progress events
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Cooperative cancellation flag shared between a worker and its owner
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs searches against a project source
#[derive(Clone)]
pub struct SearchEngine {
    source: Arc<dyn ProjectSource>,
}

impl SearchEngine {
    pub fn new(source: Arc<dyn ProjectSource>) -> Self {
        Self { source }
    }

    /// Start `request` on a background thread
    pub fn run(&self, request: SearchRequest) -> SearchHandle {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let engine = self.clone();
        let cancel_for_thread = cancel.clone();

        let thread = thread::spawn(move || {
            engine.run_blocking(&request, &cancel_for_thread, &mut |event| tx.send(event).is_ok());
        });

        SearchHandle {
            events: rx,
            cancel,
            thread: Some(thread),
        }
    }

    /// Run `request` on the calling thread, feeding events to `sink`.
    ///
    /// `sink` returns `false` when the consumer is gone, which cancels the
    /// search. A run always ends with a final [`SearchEvent::Progress`]
    /// followed by [`SearchEvent::Finished`].
    pub fn run_blocking(
        &self,
        request: &SearchRequest,
        cancel: &CancelToken,
        sink: &mut dyn FnMut(SearchEvent) -> bool,
    ) -> SearchSummary {
        debug!(query = %request.query, mode = ?request.mode, "search started");

        let mut worker = Worker::new(request, cancel, sink);
        let status = match worker.execute(self.source.as_ref()) {
            Ok(status) => status,
            Err(err) => SearchStatus::Failed(err.to_string()),
        };

        let mut progress = worker.progress;
        progress.elapsed = worker.started.elapsed();
        let summary = SearchSummary { status, progress };

        info!(
            status = ?summary.status,
            files_searched = progress.files_searched,
            files_matched = progress.files_matched,
            hits = progress.hits,
            elapsed_ms = progress.elapsed.as_millis() as u64,
            "search finished"
        );

        (worker.sink)(SearchEvent::Progress(progress));
        (worker.sink)(SearchEvent::Finished(summary.clone()));
        summary
    }
}

/// Owner side of a running search
pub struct SearchHandle {
    events: Receiver<SearchEvent>,
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl SearchHandle {
    /// Next event without blocking
    pub fn try_recv(&self) -> Result<SearchEvent, TryRecvError> {
        self.events.try_recv()
    }

    /// Next event, blocking until one arrives or the worker is gone
    pub fn recv(&self) -> Result<SearchEvent, RecvError> {
        self.events.recv()
    }

    /// Next event, waiting at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Result<SearchEvent, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    /// Blocking iterator over the remaining events
    pub fn events(&self) -> mpsc::Iter<'_, SearchEvent> {
        self.events.iter()
    }

    /// Ask the worker to stop at the next file boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Wait for the worker thread to exit
    pub fn join(mut self) {
        self.join_worker();
    }

    /// Cancel, then wait for the worker to exit. Pending events are discarded.
    pub fn cancel_and_wait(mut self) {
        self.cancel();
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("search worker panicked");
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        // Detached workers notice the closed channel on their next send
        self.cancel.cancel();
    }
}

/// Internal failures that turn into `SearchStatus::Failed`
#[derive(Debug, thiserror::Error)]
enum WorkerError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid query: {0}")]
    Query(#[from] regex::Error),
}

struct Worker<'a> {
    request: &'a SearchRequest,
    cancel: &'a CancelToken,
    sink: &'a mut dyn FnMut(SearchEvent) -> bool,
    progress: SearchProgress,
    hit_limit: Option<usize>,
    started: Instant,
    last_progress: Instant,
    disconnected: bool,
}

impl<'a> Worker<'a> {
    fn new(
        request: &'a SearchRequest,
        cancel: &'a CancelToken,
        sink: &'a mut dyn FnMut(SearchEvent) -> bool,
    ) -> Self {
        let now = Instant::now();
        Self {
            request,
            cancel,
            sink,
            progress: SearchProgress::default(),
            hit_limit: request.config.hit_limit(),
            started: now,
            last_progress: now,
            disconnected: false,
        }
    }

    fn execute(&mut self, source: &dyn ProjectSource) -> Result<SearchStatus, WorkerError> {
        let config = &self.request.config;
        let reader = EncodingReader::new(config.resolved_encodings()?);
        let filter = Arc::new(FileFilter::new(config));
        let walk = source.walk(Arc::clone(&filter))?;

        match self.request.mode {
            SearchMode::Plain => self.plain(walk, &filter, &reader),
            SearchMode::Ranked => self.ranked(walk, &filter, &reader),
        }
    }

    /// Scan each file as it is found and emit one batch per matching file
    fn plain(
        &mut self,
        walk: FileWalk<'_>,
        filter: &FileFilter,
        reader: &EncodingReader,
    ) -> Result<SearchStatus, WorkerError> {
        let config = &self.request.config;
        let scanner = MatchScanner::literal(
            &self.request.query,
            config.case_sensitive,
            config.max_line_length,
        )?;

        for entry in walk {
            if self.should_stop() {
                return Ok(SearchStatus::Cancelled);
            }

            if let Some((candidate, text)) = self.load(entry, filter, reader) {
                let matches = scanner.scan(&text);
                if !matches.is_empty() {
                    let file = FileResult::new(candidate.path, None, matches);
                    if let Some(status) = self.emit(file) {
                        return Ok(status);
                    }
                }
            }

            self.maybe_report_progress();
        }

        Ok(SearchStatus::Completed)
    }

    /// Collect token counts for the whole corpus, rank once, then emit files
    /// in rank order with their matching lines
    fn ranked(
        &mut self,
        walk: FileWalk<'_>,
        filter: &FileFilter,
        reader: &EncodingReader,
    ) -> Result<SearchStatus, WorkerError> {
        let query_tokens = tokenize_query(&self.request.query);
        let scanner = MatchScanner::with_terms(&query_tokens, false, self.request.config.max_line_length)?;

        let mut ranker = TfIdfRanker::new();
        for entry in walk {
            if self.should_stop() {
                return Ok(SearchStatus::Cancelled);
            }
            if let Some((candidate, text)) = self.load(entry, filter, reader) {
                ranker.add_document(Document::from_text(candidate.path, &text));
            }
            self.maybe_report_progress();
        }

        let ranked = ranker.rank(&self.request.query);
        debug!(documents = ranker.len(), ranked = ranked.len(), "ranking complete");
        drop(ranker);

        for file in ranked {
            if self.should_stop() {
                return Ok(SearchStatus::Cancelled);
            }

            let matches = match reader.read(&file.path) {
                Ok(decoded) => scanner.scan(&decoded.text),
                Err(err) => {
                    self.record_read_error(err);
                    continue;
                }
            };

            if let Some(status) = self.emit(FileResult::new(file.path, Some(file.score), matches)) {
                return Ok(status);
            }
            self.maybe_report_progress();
        }

        Ok(SearchStatus::Completed)
    }

    /// Filter and decode one walk entry. Skips are recorded as diagnostics.
    fn load(
        &mut self,
        entry: WalkEntry,
        filter: &FileFilter,
        reader: &EncodingReader,
    ) -> Option<(FileCandidate, String)> {
        let candidate = match entry {
            WalkEntry::File(candidate) => candidate,
            WalkEntry::Error { path, reason } => {
                debug!(path = %path.display(), %reason, "walk error");
                self.diagnostic(Diagnostic {
                    path,
                    kind: DiagnosticKind::WalkError { reason },
                });
                return None;
            }
        };

        match filter.check(&candidate.relative, candidate.size, candidate.extension.as_deref()) {
            Ok(()) => {}
            Err(FilterRejection::TooLarge { size }) => {
                debug!(path = %candidate.path.display(), size, "skipping oversized file");
                self.diagnostic(Diagnostic {
                    path: candidate.path,
                    kind: DiagnosticKind::TooLarge { size },
                });
                return None;
            }
            Err(rejection) => {
                trace!(path = %candidate.path.display(), ?rejection, "filtered");
                return None;
            }
        }

        self.progress.files_searched += 1;

        match reader.read(&candidate.path) {
            Ok(decoded) => {
                if self.request.config.skip_binary && is_binary(&decoded.text) {
                    debug!(path = %candidate.path.display(), "skipping binary file");
                    self.diagnostic(Diagnostic {
                        path: candidate.path,
                        kind: DiagnosticKind::Binary,
                    });
                    return None;
                }
                trace!(path = %candidate.path.display(), encoding = decoded.encoding.name(), "decoded");
                Some((candidate, decoded.text))
            }
            Err(err) => {
                self.record_read_error(err);
                None
            }
        }
    }

    fn record_read_error(&mut self, err: ReadError) {
        debug!(error = %err, "skipping file");
        let kind = match &err {
            ReadError::Unreadable { source, .. } => DiagnosticKind::Unreadable {
                reason: source.to_string(),
            },
            ReadError::Undecodable { .. } => DiagnosticKind::Undecodable,
        };
        self.diagnostic(Diagnostic {
            path: err.path().to_path_buf(),
            kind,
        });
    }

    /// Send one file, enforcing the hit ceiling. Returns a terminal status
    /// when the search must stop.
    fn emit(&mut self, mut file: FileResult) -> Option<SearchStatus> {
        if let Some(limit) = self.hit_limit {
            let remaining = limit.saturating_sub(self.progress.hits);
            if file.matches.len() > remaining {
                debug!(limit, "hit limit reached, truncating search");
                if remaining > 0 {
                    file.matches.truncate(remaining);
                    self.send_file(file);
                }
                return Some(SearchStatus::Truncated);
            }
        }

        self.send_file(file);
        self.disconnected.then_some(SearchStatus::Cancelled)
    }

    fn send_file(&mut self, file: FileResult) {
        self.progress.hits += file.hit_count();
        self.progress.files_matched += 1;
        self.send(SearchEvent::Batch(ResultBatch { files: vec![file] }));
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.send(SearchEvent::Diagnostic(diagnostic));
    }

    fn maybe_report_progress(&mut self) {
        if self.last_progress.elapsed() < PROGRESS_INTERVAL {
            return;
        }
        self.last_progress = Instant::now();
        let mut progress = self.progress;
        progress.elapsed = self.started.elapsed();
        self.send(SearchEvent::Progress(progress));
    }

    fn send(&mut self, event: SearchEvent) {
        if !self.disconnected && !(self.sink)(event) {
            debug!("result consumer disconnected");
            self.disconnected = true;
        }
    }

    fn should_stop(&self) -> bool {
        self.disconnected || self.cancel.is_cancelled()
    }
}
