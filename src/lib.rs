//! # scour - project text search
//!
//! scour searches a project tree without building an index. Every search
//! walks the live file set, decodes each file under a list of candidate
//! encodings and reports matches incrementally while the walk continues.
//!
//! Two search modes share the same pipeline:
//!
//! - **plain** - literal substring search, results in traversal order
//! - **ranked** - tf-idf document ranking, results by descending score
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`search`] - Traversal, filtering, matching, ranking and the search worker
//! - [`results`] - Result aggregation, fold/navigation state and search sessions
//! - [`config`] - Search configuration (JSON file + defaults)
//! - [`output`] - Result formatting (ripgrep-like text, JSON lines)
//! - `tui` - Interactive terminal result view (`interactive` feature)
//! - [`utils`] - Encoding detection, tokenization, app data paths, progress
//!
//! ## Quick Start
//!
//! ```no_run
//! use scour::config::SearchConfig;
//! use scour::results::{ResultModel, ResultPresenter, SearchSession};
//! use scour::search::{DirectorySource, SearchEngine, SearchRequest, SearchSummary};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! struct Print;
//!
//! impl ResultPresenter for Print {
//!     fn on_finished(&mut self, model: &ResultModel, summary: &SearchSummary) {
//!         for file in model.files() {
//!             for m in &file.matches {
//!                 println!("{}:{}: {}", file.path.display(), m.line_number, m.display_text);
//!             }
//!         }
//!         println!("{}", summary.status);
//!     }
//! }
//!
//! let source = DirectorySource::new(vec![PathBuf::from(".")]);
//! let mut session = SearchSession::new(SearchEngine::new(Arc::new(source)));
//! session.start(SearchRequest::plain("fn main", SearchConfig::default()));
//! session.wait(&mut Print);
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod results;
pub mod search;
#[cfg(feature = "interactive")]
pub mod tui;
pub mod utils;
