//! Enumeration of the files to search.
//!
//! [`DirectorySource`] walks project roots with the `ignore` crate. Excluded
//! directories are pruned inside the walker so their subtrees are never
//! listed. Symlink loops are detected by the walker and reported as
//! [`WalkEntry::Error`].

use crate::config::SearchConfig;
use crate::error::EngineError;
use crate::search::filter::FileFilter;
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// A file proposed for searching, with the metadata the filter needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Path used to open the file
    pub path: PathBuf,
    /// Path relative to the search root it was found under
    pub relative: PathBuf,
    pub size: u64,
    /// Extension without the leading dot
    pub extension: Option<String>,
}

impl FileCandidate {
    pub fn new(path: PathBuf, relative: PathBuf, size: u64) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_string());
        Self {
            path,
            relative,
            size,
            extension,
        }
    }
}

/// One step of a traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    File(FileCandidate),
    /// An entry that could not be enumerated; the walk continues
    Error { path: PathBuf, reason: String },
}

pub type FileWalk<'a> = Box<dyn Iterator<Item = WalkEntry> + 'a>;

/// Supplies the files of a project. Implementations must guard against
/// symlink loops themselves.
pub trait ProjectSource: Send + Sync {
    /// Start a lazy traversal. `filter` lets the source prune excluded
    /// directories before descending into them.
    fn walk(&self, filter: Arc<FileFilter>) -> Result<FileWalk<'_>, EngineError>;
}

/// Walks one or more directory trees in file-name order
#[derive(Debug, Clone)]
pub struct DirectorySource {
    roots: Vec<PathBuf>,
    follow_symlinks: bool,
    include_hidden: bool,
    respect_ignore_files: bool,
}

impl DirectorySource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            follow_symlinks: false,
            include_hidden: true,
            respect_ignore_files: false,
        }
    }

    /// Source using the traversal options of `config`
    pub fn from_config(roots: Vec<PathBuf>, config: &SearchConfig) -> Self {
        Self {
            roots,
            follow_symlinks: config.follow_symlinks,
            include_hidden: config.include_hidden,
            respect_ignore_files: config.respect_ignore_files,
        }
    }

    pub fn follow_symlinks(mut self, yes: bool) -> Self {
        self.follow_symlinks = yes;
        self
    }

    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.include_hidden = yes;
        self
    }

    pub fn respect_ignore_files(mut self, yes: bool) -> Self {
        self.respect_ignore_files = yes;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn check_root(root: &Path) -> Result<(), EngineError> {
        let unavailable = |reason: String| EngineError::SourceUnavailable {
            path: root.to_path_buf(),
            reason,
        };

        let meta = fs::metadata(root).map_err(|e| unavailable(e.to_string()))?;
        if meta.is_dir() {
            fs::read_dir(root).map_err(|e| unavailable(e.to_string()))?;
        }
        Ok(())
    }
}

impl ProjectSource for DirectorySource {
    fn walk(&self, filter: Arc<FileFilter>) -> Result<FileWalk<'_>, EngineError> {
        let Some((first, rest)) = self.roots.split_first() else {
            return Err(EngineError::SourceUnavailable {
                path: PathBuf::new(),
                reason: "no search roots given".to_string(),
            });
        };

        for root in &self.roots {
            Self::check_root(root)?;
        }

        let mut builder = WalkBuilder::new(first);
        for root in rest {
            builder.add(root);
        }

        let respect = self.respect_ignore_files;
        builder
            .standard_filters(false)
            .hidden(!self.include_hidden)
            .ignore(respect)
            .parents(respect)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .require_git(false)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                // Never prune a root, only directories below it
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if is_dir && !filter.accept_dir(&entry.file_name().to_string_lossy()) {
                    trace!(path = %entry.path().display(), "pruned excluded directory");
                    return false;
                }
                true
            });

        let roots = self.roots.clone();
        let walk = builder.build().filter_map(move |result| match result {
            Ok(entry) => {
                if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    return None;
                }
                let path = entry.path().to_path_buf();
                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(err) => {
                        return Some(WalkEntry::Error {
                            path,
                            reason: err.to_string(),
                        });
                    }
                };
                let relative = relative_to_roots(&path, &roots);
                Some(WalkEntry::File(FileCandidate::new(path, relative, size)))
            }
            Err(err) => Some(WalkEntry::Error {
                path: error_path(&err).unwrap_or_default(),
                reason: err.to_string(),
            }),
        });

        Ok(Box::new(walk))
    }
}

/// Searches a fixed list of files, in the given order
#[derive(Debug, Clone)]
pub struct FileListSource {
    files: Vec<PathBuf>,
    base: Option<PathBuf>,
}

impl FileListSource {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files, base: None }
    }

    /// Make candidate paths relative to `base` for directory filtering
    pub fn with_base(mut self, base: PathBuf) -> Self {
        self.base = Some(base);
        self
    }
}

impl ProjectSource for FileListSource {
    fn walk(&self, _filter: Arc<FileFilter>) -> Result<FileWalk<'_>, EngineError> {
        let walk = self.files.iter().map(move |path| match fs::metadata(path) {
            Ok(meta) => {
                let relative = match &self.base {
                    Some(base) => path.strip_prefix(base).unwrap_or(path).to_path_buf(),
                    None => path.clone(),
                };
                WalkEntry::File(FileCandidate::new(path.clone(), relative, meta.len()))
            }
            Err(err) => WalkEntry::Error {
                path: path.clone(),
                reason: err.to_string(),
            },
        });
        Ok(Box::new(walk))
    }
}

fn relative_to_roots(path: &Path, roots: &[PathBuf]) -> PathBuf {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path.to_path_buf())
}

fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}
