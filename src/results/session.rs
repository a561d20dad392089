//! One result view and the search feeding it.
//!
//! The session is the single owner of its [`ResultModel`]: worker output
//! arrives as channel messages and is applied on the caller's thread, so
//! navigation and appends never race.

use crate::results::model::{OpenTarget, ResultModel};
use crate::search::{
    Diagnostic, FileResult, SearchEngine, SearchEvent, SearchHandle, SearchProgress,
    SearchRequest, SearchStatus, SearchSummary,
};
use std::sync::mpsc::TryRecvError;
use tracing::{debug, warn};

/// Receives result updates. Only `on_finished` is required.
pub trait ResultPresenter {
    /// `files` were just appended to `model`
    fn on_batch(&mut self, _model: &ResultModel, _files: &[FileResult]) {}

    fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {}

    fn on_progress(&mut self, _progress: &SearchProgress) {}

    /// Terminal status; `model` holds whatever was aggregated
    fn on_finished(&mut self, model: &ResultModel, summary: &SearchSummary);
}

/// Commands a presenter sends to its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    NextLine,
    PrevLine,
    NextFile,
    PrevFile,
    /// Fold or unfold the file under the cursor
    ToggleFold,
    OpenSelected,
    Cancel,
}

/// A result model plus at most one running search
pub struct SearchSession {
    engine: SearchEngine,
    model: ResultModel,
    handle: Option<SearchHandle>,
}

impl SearchSession {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            model: ResultModel::new(),
            handle: None,
        }
    }

    pub fn model(&self) -> &ResultModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut ResultModel {
        &mut self.model
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start a new search. A running search is cancelled and joined first,
    /// and the previous results are discarded.
    pub fn start(&mut self, request: SearchRequest) {
        if let Some(previous) = self.handle.take() {
            debug!("cancelling previous search");
            previous.cancel_and_wait();
        }
        self.model.start(request.mode);
        self.handle = Some(self.engine.run(request));
    }

    /// Request cancellation. The terminal status still arrives through
    /// [`pump`](Self::pump) or [`wait`](Self::wait).
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
    }

    /// Apply every event already received, without blocking.
    /// Returns true if anything changed.
    pub fn pump(&mut self, presenter: &mut dyn ResultPresenter) -> bool {
        let mut changed = false;
        while let Some(handle) = &self.handle {
            match handle.try_recv() {
                Ok(event) => {
                    self.apply_event(event, presenter);
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_lost(presenter);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Block until the running search finishes, applying events as they come
    pub fn wait(&mut self, presenter: &mut dyn ResultPresenter) {
        while let Some(handle) = &self.handle {
            match handle.recv() {
                Ok(event) => self.apply_event(event, presenter),
                Err(_) => self.worker_lost(presenter),
            }
        }
    }

    /// Run a navigation command. Returns the target for `OpenSelected`.
    pub fn apply(&mut self, command: NavCommand) -> Option<OpenTarget> {
        match command {
            NavCommand::NextLine => self.model.next_line(),
            NavCommand::PrevLine => self.model.prev_line(),
            NavCommand::NextFile => self.model.next_file(),
            NavCommand::PrevFile => self.model.prev_file(),
            NavCommand::ToggleFold => {
                if let Some(file) = self.model.selected_file() {
                    self.model.toggle_fold(file);
                }
            }
            NavCommand::OpenSelected => return self.model.open_selected(),
            NavCommand::Cancel => self.cancel(),
        }
        None
    }

    fn apply_event(&mut self, event: SearchEvent, presenter: &mut dyn ResultPresenter) {
        match event {
            SearchEvent::Batch(batch) => {
                let first_new = self.model.len();
                self.model.append(batch);
                presenter.on_batch(&self.model, &self.model.files()[first_new..]);
            }
            SearchEvent::Diagnostic(diagnostic) => {
                presenter.on_diagnostic(&diagnostic);
                self.model.push_diagnostic(diagnostic);
            }
            SearchEvent::Progress(progress) => {
                self.model.set_progress(progress);
                presenter.on_progress(&progress);
            }
            SearchEvent::Finished(summary) => {
                self.model.set_progress(summary.progress);
                self.model.finish(summary.status.clone());
                if let Some(handle) = self.handle.take() {
                    handle.join();
                }
                presenter.on_finished(&self.model, &summary);
            }
        }
    }

    /// The worker exited without a terminal event
    fn worker_lost(&mut self, presenter: &mut dyn ResultPresenter) {
        warn!("search worker exited without reporting a status");
        if let Some(handle) = self.handle.take() {
            handle.join();
        }
        let summary = SearchSummary {
            status: SearchStatus::Failed("search worker stopped unexpectedly".into()),
            progress: self.model.progress(),
        };
        self.model.finish(summary.status.clone());
        presenter.on_finished(&self.model, &summary);
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel_and_wait();
        }
    }
}
