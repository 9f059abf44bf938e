//! Best-effort debug dumps (AST JSON, rendered HTML).
//!
//! Writes are spawned onto the runtime as soon as an article is collected and
//! keep going while the next article is read. They are joined once at the
//! end of the run; a failed write is logged and counted, never propagated.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinSet;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of all dump writes of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpReport {
    pub written: usize,
    pub failed: usize,
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written, {} failed", self.written, self.failed)
    }
}

/// Background writes owned by one collection run.
///
/// Each target path is written at most once per run.
pub struct DumpTasks {
    tasks: JoinSet<Result<PathBuf, DumpError>>,
    scheduled: HashSet<PathBuf>,
}

impl DumpTasks {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            scheduled: HashSet::new(),
        }
    }

    /// Write `contents` to `path` in the background, creating parent
    /// directories as needed.
    ///
    /// Returns `false` (and writes nothing) when `path` was already
    /// scheduled in this run.
    pub fn spawn_write(&mut self, path: PathBuf, contents: String) -> bool {
        if !self.scheduled.insert(path.clone()) {
            tracing::warn!("Skipping debug dump {:?}: already written in this run", path);
            return false;
        }
        self.tasks.spawn(write_file(path, contents));
        true
    }

    /// Wait for every outstanding write.
    pub async fn join(&mut self) -> DumpReport {
        let mut report = DumpReport::default();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(path)) => {
                    tracing::debug!("Wrote {:?}", path);
                    report.written += 1;
                }
                Ok(Err(err)) => {
                    tracing::warn!("Debug dump failed: {}", err);
                    report.failed += 1;
                }
                Err(err) => {
                    tracing::warn!("Debug dump task did not finish: {}", err);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl Default for DumpTasks {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_file(path: PathBuf, contents: String) -> Result<PathBuf, DumpError> {
    let io_err = |source: std::io::Error| DumpError::Io {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(&path, contents).await.map_err(io_err)?;
    Ok(path)
}

/// `dir/<logical_path><extension>`, keeping the nesting of the logical path.
///
/// Empty, `.` and `..` segments are dropped so the result stays under `dir`.
pub fn dump_path(dir: &Path, logical_path: &str, extension: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    for segment in logical_path
        .split(['/', '\\'])
        .filter(|s| !matches!(*s, "" | "." | ".."))
    {
        path.push(segment);
    }
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(extension);
    path.set_file_name(file_name);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_dump_path_keeps_nesting() {
        let path = dump_path(Path::new("out/ast"), "posts/2024/hello", ".json");
        assert_eq!(path, Path::new("out/ast/posts/2024/hello.json"));
    }

    #[test]
    fn test_dump_path_stays_inside_dir() {
        let path = dump_path(Path::new("out/ast"), "tags/../../../x", ".json");
        assert_eq!(path, Path::new("out/ast/tags/x.json"));
        let path = dump_path(Path::new("out/ast"), "..\\evil", ".json");
        assert_eq!(path, Path::new("out/ast/evil.json"));
    }

    #[tokio::test]
    async fn test_writes_and_creates_parents() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a/b/c.json");

        let mut tasks = DumpTasks::new();
        tasks.spawn_write(target.clone(), "{}".into());
        let report = tasks.join().await;

        assert_eq!(report, DumpReport { written: 1, failed: 0 });
        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_same_target_written_once() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("tags/go.json");

        let mut tasks = DumpTasks::new();
        assert!(tasks.spawn_write(target.clone(), "first".into()));
        assert!(!tasks.spawn_write(target.clone(), "second".into()));
        let report = tasks.join().await;

        assert_eq!(report, DumpReport { written: 1, failed: 0 });
        assert_eq!(fs::read_to_string(&target).unwrap(), "first");
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let dir = tempdir().unwrap();
        // A regular file where a directory is needed
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let mut tasks = DumpTasks::new();
        tasks.spawn_write(blocker.join("nested.html"), "<p></p>".into());
        tasks.spawn_write(dir.path().join("ok.html"), "<p></p>".into());
        let report = tasks.join().await;

        assert_eq!(report, DumpReport { written: 1, failed: 1 });
    }
}
