//! Output directory listing and baseline snapshots.
//!
//! The execution server never says which files a job wrote, so the
//! client diffs the output directory against a baseline captured before
//! submission. Directory access sits behind [`OutputLister`] so the
//! detector can be driven by an in-memory listing in tests.

use std::collections::BTreeSet;
use std::path::Path;

use adgen_core::types::Timestamp;
use async_trait::async_trait;

/// One matching file in an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// Basename, e.g. `example_00001_.png`.
    pub name: String,
    /// Creation time, or modification time where the filesystem does not
    /// record creation.
    pub created: Timestamp,
}

/// Read access to an output directory.
#[async_trait]
pub trait OutputLister: Send + Sync {
    /// Create `dir` (and parents) if it does not exist.
    async fn ensure_dir(&self, dir: &Path) -> std::io::Result<()>;

    /// Regular files directly inside `dir` whose extension matches
    /// `extension` (case-insensitive), in directory iteration order.
    async fn list(&self, dir: &Path, extension: &str) -> std::io::Result<Vec<ListedFile>>;
}

/// [`OutputLister`] over the real filesystem via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOutputLister;

#[async_trait]
impl OutputLister for FsOutputLister {
    async fn ensure_dir(&self, dir: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(dir).await
    }

    async fn list(&self, dir: &Path, extension: &str) -> std::io::Result<Vec<ListedFile>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));
            if !matches {
                continue;
            }

            // The server may still be writing or renaming; skip entries
            // that vanish between readdir and stat.
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::trace!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            let Ok(created) = metadata.created().or_else(|_| metadata.modified()) else {
                continue;
            };

            files.push(ListedFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                created: Timestamp::from(created),
            });
        }

        Ok(files)
    }
}

/// The set of artifact basenames present at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSetSnapshot {
    names: BTreeSet<String>,
}

impl FileSetSnapshot {
    pub fn from_listing(files: &[ListedFile]) -> Self {
        Self {
            names: files.iter().map(|f| f.name.clone()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Files in `current` that were not present in this snapshot, in
    /// listing order.
    pub fn new_files(&self, current: Vec<ListedFile>) -> Vec<ListedFile> {
        current
            .into_iter()
            .filter(|f| !self.names.contains(&f.name))
            .collect()
    }
}
