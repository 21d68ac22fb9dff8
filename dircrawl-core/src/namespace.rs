// Filesystem namespaces mirroring the category tree

use crate::error::{CrawlError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Characters that are not allowed in a directory name on common filesystems.
pub const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turn a category name into a directory name: drop forbidden characters, then
/// trim surrounding whitespace. Applying it twice changes nothing.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect();
    kept.trim().to_string()
}

/// A sanitized name that can stand as its own path segment.
pub fn is_usable_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.chars().all(|c| c == '.')
}

/// Output directory for one node, plus the chain of names that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNamespace {
    path: PathBuf,
    chain: Vec<String>,
}

impl StorageNamespace {
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chain: Vec::new(),
        }
    }

    /// Sub-namespace for an already sanitized segment.
    pub fn child(&self, segment: &str) -> Self {
        let mut chain = self.chain.clone();
        chain.push(segment.to_string());
        Self {
            path: self.path.join(segment),
            chain,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root-to-node names joined with " / ", or "(root)".
    pub fn display_chain(&self) -> String {
        if self.chain.is_empty() {
            "(root)".to_string()
        } else {
            self.chain.join(" / ")
        }
    }

    /// Create the directory (and any missing parents).
    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.path).map_err(|source| CrawlError::Storage {
            path: self.path.clone(),
            source,
        })
    }
}
