//! Search core: traversal, filtering, decoding, matching and ranking.
//!
//! A [`SearchEngine`] runs one [`SearchRequest`] at a time on a worker thread
//! and streams [`SearchEvent`]s back. Plain searches emit files in traversal
//! order as they are scanned; ranked searches read the whole corpus first and
//! then emit files by descending tf-idf score.

pub mod engine;
pub mod filter;
pub mod ranker;
pub mod scanner;
pub mod source;
pub mod types;

pub use engine::{CancelToken, SearchEngine, SearchHandle, PROGRESS_INTERVAL};
pub use filter::{FileFilter, FilterRejection};
pub use ranker::{Document, RankedFile, TfIdfRanker};
pub use scanner::MatchScanner;
pub use source::{DirectorySource, FileCandidate, FileListSource, ProjectSource, WalkEntry};
pub use types::*;
