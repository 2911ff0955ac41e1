//! Core data types for ferrosync
//!
//! Change events produced by the watch backends, the record of a sync
//! attempt, and the immutable settings a watch session runs with.

use chrono::{DateTime, Local};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the version-control metadata directory that is never synced
pub const GIT_DIR: &str = ".git";

/// Name of the ignore file passed to the sync tool as an exclusion list
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Kind of filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChangeKind {
    /// Entry was created
    Created,
    /// Entry content or metadata changed
    Modified,
    /// Entry was removed
    Deleted,
    /// Entry was renamed or moved
    Moved,
}

impl ChangeKind {
    /// Lowercase label used in rendered summaries
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Moved => "moved",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of the entry a change refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntryType {
    /// Regular file (or anything that is not a directory)
    File,
    /// Directory
    Directory,
}

impl EntryType {
    /// Lowercase label used in rendered summaries
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single filesystem notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// What happened
    pub kind: ChangeKind,
    /// Whether the entry is a file or a directory
    pub entry_type: EntryType,
    /// Affected path (the source path for moves)
    pub path: PathBuf,
    /// Destination path for moves, when the backend reports it
    pub dest_path: Option<PathBuf>,
    /// Backend cookie tying together the halves of one rename
    pub tracker: Option<usize>,
    /// When the event was observed
    pub timestamp: DateTime<Local>,
}

impl ChangeEvent {
    /// Create an event stamped with the current local time
    pub fn new(kind: ChangeKind, entry_type: EntryType, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            entry_type,
            path: path.into(),
            dest_path: None,
            tracker: None,
            timestamp: Local::now(),
        }
    }

    /// Attach the destination path of a move
    pub fn with_dest_path(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest_path = Some(dest.into());
        self
    }

    /// Tag the event with the rename cookie reported by the backend
    pub fn with_tracker(mut self, tracker: Option<usize>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Override the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the event touches version-control metadata
    pub fn is_git_internal(&self) -> bool {
        is_git_path(&self.path)
    }

    /// Render the one-line summary stored in the event buffer
    pub fn render(&self) -> String {
        let mut line = format!(
            "{} {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.kind,
            self.entry_type,
            self.path.display()
        );
        if let Some(dest) = &self.dest_path {
            line.push_str(" -> ");
            line.push_str(&dest.display().to_string());
        }
        line
    }
}

/// Check whether `path` has a `.git` component anywhere in it
///
/// Only whole components match: `.gitignore`, `.github` and `repo.git` are
/// ordinary paths.
pub fn is_git_path(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::Normal(name) if name == GIT_DIR))
}

/// Strategy used to observe the source tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WatchStrategy {
    /// OS change notifications (inotify, FSEvents, ReadDirectoryChangesW)
    #[default]
    Native,
    /// Periodic rescans of the tree
    Polling,
}

impl fmt::Display for WatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Polling => f.write_str("polling"),
        }
    }
}

/// Immutable settings for one watch session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    /// Source directory, passed verbatim to the sync tool
    pub source: PathBuf,
    /// Destination specifier (local path or `host:path`)
    pub destination: String,
    /// Poll-loop interval, also the backoff step
    pub duration: Duration,
    /// Upper bound on a single sync run
    pub timeout: Duration,
    /// How changes are observed
    pub strategy: WatchStrategy,
    /// Scan interval for the polling strategy
    pub polling_interval: Duration,
    /// Resolved absolute path of the sync executable
    pub executable: PathBuf,
    /// Extra `--exclude` patterns
    pub excludes: Vec<String>,
}

impl WatchSettings {
    /// Default poll-loop interval
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);
    /// Default sync timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
    /// Default scan interval for the polling strategy
    pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(1000);

    /// Settings with default timings for the given endpoints
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<String>,
        executable: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            duration: Self::DEFAULT_DURATION,
            timeout: Self::DEFAULT_TIMEOUT,
            strategy: WatchStrategy::Native,
            polling_interval: Self::DEFAULT_POLLING_INTERVAL,
            executable: executable.into(),
            excludes: Vec::new(),
        }
    }

    /// Path of the optional ignore file at the source root
    pub fn gitignore_path(&self) -> PathBuf {
        self.source.join(GITIGNORE_FILE)
    }
}

/// Record of one successful sync run
#[derive(Debug, Clone)]
pub struct SyncAttempt {
    /// When the child was spawned
    pub started_at: Instant,
    /// Timeout the run was bounded by
    pub timeout: Duration,
    /// Wall time until the child exited
    pub elapsed: Duration,
    /// Exit code reported by the child
    pub exit_code: i32,
}

impl SyncAttempt {
    /// Whether the run counts as a success
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(".git", true)]
    #[case(".git/HEAD", true)]
    #[case("repo/.git", true)]
    #[case("repo/.git/objects/ab/cdef", true)]
    #[case("/abs/repo/.git/index.lock", true)]
    #[case(".gitignore", false)]
    #[case("repo/.github/workflows/ci.yml", false)]
    #[case("repo/project.git/file", false)]
    #[case("repo/.GIT/config", false)]
    #[case("src/main.rs", false)]
    fn test_is_git_path(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_git_path(Path::new(path)), expected);
    }

    #[test]
    fn test_render_modified_file() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let event = ChangeEvent::new(ChangeKind::Modified, EntryType::File, "./repo/a.txt")
            .with_timestamp(ts);

        assert_eq!(event.render(), "2024-03-09 14:05:07 modified file: ./repo/a.txt");
    }

    #[test]
    fn test_render_move_includes_destination() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let event = ChangeEvent::new(ChangeKind::Moved, EntryType::Directory, "repo/old")
            .with_dest_path("repo/new")
            .with_timestamp(ts);

        assert_eq!(
            event.render(),
            "2024-03-09 14:05:07 moved directory: repo/old -> repo/new"
        );
    }

    #[test]
    fn test_gitignore_path() {
        let settings = WatchSettings::new("./repo", "host:~/projects", "/usr/bin/rsync");
        assert_eq!(settings.gitignore_path(), PathBuf::from("./repo/.gitignore"));
        assert_eq!(settings.duration, Duration::from_millis(300));
        assert_eq!(settings.strategy, WatchStrategy::Native);
    }
}
