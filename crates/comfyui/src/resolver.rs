//! Ordering of newly detected files into the artifacts handed back to
//! the caller.

use std::path::{Path, PathBuf};

use adgen_core::types::Timestamp;

use crate::snapshot::ListedFile;

/// A generated output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub created: Timestamp,
    /// Position within the job's output, oldest first.
    pub ordinal: usize,
}

/// Sort `new_files` by creation time (oldest first) and keep the first
/// `expected`, resolved against `dir`.
///
/// The sort is stable, so files with identical timestamps keep their
/// listing order.
pub fn resolve_artifacts(dir: &Path, mut new_files: Vec<ListedFile>, expected: usize) -> Vec<Artifact> {
    new_files.sort_by_key(|f| f.created);
    new_files
        .into_iter()
        .take(expected)
        .enumerate()
        .map(|(ordinal, f)| Artifact {
            path: absolute(dir.join(&f.name)),
            created: f.created,
            ordinal,
        })
        .collect()
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn listed(name: &str, secs: i64) -> ListedFile {
        ListedFile {
            name: name.to_string(),
            created: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn orders_by_creation_time() {
        let dir = Path::new("/out/flux_examples");
        let artifacts = resolve_artifacts(
            dir,
            vec![listed("c.png", 30), listed("a.png", 10), listed("b.png", 20)],
            3,
        );
        let paths: Vec<_> = artifacts.iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            paths,
            [dir.join("a.png"), dir.join("b.png"), dir.join("c.png")]
        );
        assert_eq!(
            artifacts.iter().map(|a| a.ordinal).collect::<Vec<_>>(),
            [0, 1, 2]
        );
    }

    #[test]
    fn keeps_the_oldest_expected_files() {
        let artifacts = resolve_artifacts(
            Path::new("/out/v"),
            vec![listed("late.mp4", 50), listed("early.mp4", 5)],
            1,
        );
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path, Path::new("/out/v/early.mp4"));
    }

    #[test]
    fn ties_keep_listing_order() {
        let artifacts = resolve_artifacts(
            Path::new("/out"),
            vec![listed("second.png", 7), listed("first.png", 7), listed("zero.png", 1)],
            3,
        );
        let names: Vec<_> = artifacts
            .iter()
            .map(|a| a.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["zero.png", "second.png", "first.png"]);
    }

    #[test]
    fn relative_directories_become_absolute() {
        let artifacts = resolve_artifacts(Path::new("output/x"), vec![listed("a.png", 1)], 1);
        assert!(artifacts[0].path.is_absolute());
        assert!(artifacts[0].path.ends_with("output/x/a.png"));
    }
}
