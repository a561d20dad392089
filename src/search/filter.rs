//! Exclusion rules applied before any file content is read.

use crate::config::SearchConfig;
use rustc_hash::FxHashSet;
use std::path::{Component, Path};

/// Why a candidate was filtered out. Expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRejection {
    ExcludedDir(String),
    ExcludedExtension(String),
    TooLarge { size: u64 },
}

/// Decides whether a path should be traversed or read
#[derive(Debug, Clone)]
pub struct FileFilter {
    excluded_dirs: FxHashSet<String>,
    excluded_extensions: FxHashSet<String>,
    max_file_size: u64,
}

impl FileFilter {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            excluded_dirs: config
                .excluded_dirs
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            excluded_extensions: config
                .excluded_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
        }
    }

    /// `path` is relative to its search root; only its ancestors are checked
    /// against the excluded directory names.
    pub fn accept(&self, path: &Path, size: u64, extension: Option<&str>) -> bool {
        self.check(path, size, extension).is_ok()
    }

    /// Like [`accept`](Self::accept), but says why a file was rejected
    pub fn check(
        &self,
        path: &Path,
        size: u64,
        extension: Option<&str>,
    ) -> Result<(), FilterRejection> {
        if let Some(parent) = path.parent() {
            for component in parent.components() {
                if let Component::Normal(name) = component {
                    let name = name.to_string_lossy();
                    if !self.accept_dir(&name) {
                        return Err(FilterRejection::ExcludedDir(name.into_owned()));
                    }
                }
            }
        }

        if let Some(ext) = extension {
            let ext = ext.trim_start_matches('.').to_lowercase();
            if self.excluded_extensions.contains(&ext) {
                return Err(FilterRejection::ExcludedExtension(ext));
            }
        }

        if size > self.max_file_size {
            return Err(FilterRejection::TooLarge { size });
        }

        Ok(())
    }

    /// Whether a directory with this name may be descended into
    pub fn accept_dir(&self, name: &str) -> bool {
        self.excluded_dirs.is_empty() || !self.excluded_dirs.contains(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> FileFilter {
        FileFilter::new(&SearchConfig {
            excluded_dirs: vec!["node_modules".into(), "Build".into()],
            excluded_extensions: vec!["png".into(), ".LOG".into()],
            max_file_size: 1000,
            ..Default::default()
        })
    }

    #[test]
    fn test_accepts_plain_file() {
        assert!(filter().accept(Path::new("src/main.rs"), 10, Some("rs")));
        assert!(filter().accept(Path::new("README"), 10, None));
    }

    #[test]
    fn test_rejects_excluded_ancestor() {
        let f = filter();
        assert_eq!(
            f.check(Path::new("web/node_modules/lib/index.js"), 10, Some("js")),
            Err(FilterRejection::ExcludedDir("node_modules".into()))
        );
        // Case-insensitive
        assert!(!f.accept(Path::new("build/out.txt"), 10, Some("txt")));
    }

    #[test]
    fn test_file_name_itself_is_not_a_directory() {
        // A file named like an excluded directory is still searched
        assert!(filter().accept(Path::new("docs/build"), 10, None));
    }

    #[test]
    fn test_rejects_extension_case_insensitive() {
        let f = filter();
        assert!(!f.accept(Path::new("img/logo.PNG"), 10, Some("PNG")));
        assert!(!f.accept(Path::new("server.log"), 10, Some("log")));
        assert!(!f.accept(Path::new("server.log"), 10, Some(".log")));
    }

    #[test]
    fn test_rejects_oversized() {
        let f = filter();
        assert!(f.accept(Path::new("a.txt"), 1000, Some("txt")));
        assert_eq!(
            f.check(Path::new("a.txt"), 1001, Some("txt")),
            Err(FilterRejection::TooLarge { size: 1001 })
        );
    }

    #[test]
    fn test_accept_dir() {
        let f = filter();
        assert!(!f.accept_dir("NODE_MODULES"));
        assert!(f.accept_dir("src"));
    }
}
