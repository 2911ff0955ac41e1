//! Fake sync tools and recording reporters

use ferrosync_types::{Error, SyncAttempt, SyncReporter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

const END_OF_CALL: &str = "::end::";

/// What the fake tool does on a given call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Exit immediately with this code
    Exit(i32),
    /// Sleep this many seconds, replacing the shell so a signal reaches the sleeper
    Sleep(u32),
}

impl FakeBehavior {
    fn script(self) -> String {
        match self {
            Self::Exit(code) => format!("exit {code}"),
            Self::Sleep(secs) => format!("exec sleep {secs}"),
        }
    }
}

/// A shell script standing in for rsync
///
/// Every call appends its arguments to a log, then follows the scripted
/// behavior for that call number. Calls past the end of the script exit 0.
pub struct FakeTool {
    dir: TempDir,
    path: PathBuf,
    log: PathBuf,
}

impl FakeTool {
    /// Tool that always exits 0
    pub fn succeeding() -> Self {
        Self::scripted(&[])
    }

    /// Tool following `behaviors` on its first calls
    pub fn scripted(behaviors: &[FakeBehavior]) -> Self {
        let dir = TempDir::new().expect("Failed to create tool directory");
        let path = dir.path().join("fake-rsync");
        let log = dir.path().join("calls.log");

        let mut arms = String::new();
        for (index, behavior) in behaviors.iter().enumerate() {
            arms.push_str(&format!("  {}) {} ;;\n", index + 1, behavior.script()));
        }

        let script = format!(
            "#!/bin/sh\n\
             printf '%s\\n' \"$@\" >> '{log}'\n\
             echo '{end}' >> '{log}'\n\
             n=$(grep -c '^{end}$' '{log}')\n\
             case $n in\n{arms}  *) exit 0 ;;\nesac\n",
            log = log.display(),
            end = END_OF_CALL,
            arms = arms,
        );
        write_executable(&path, &script);

        Self { dir, path, log }
    }

    /// Path to the executable script
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the script and its log
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Arguments of every call so far, oldest first
    pub fn calls(&self) -> Vec<Vec<String>> {
        let Ok(content) = fs::read_to_string(&self.log) else {
            return Vec::new();
        };

        let mut calls = Vec::new();
        let mut current = Vec::new();
        for line in content.lines() {
            if line == END_OF_CALL {
                calls.push(std::mem::take(&mut current));
            } else {
                current.push(line.to_string());
            }
        }
        calls
    }

    /// Number of calls so far
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[cfg(unix)]
fn write_executable(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, content).expect("Failed to write fake tool");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake tool executable");
}

#[cfg(not(unix))]
fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write fake tool");
}

/// Reporter that keeps everything it is told
#[derive(Debug, Default)]
pub struct RecordingReporter {
    batches: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
    retries: Mutex<Vec<(u32, Duration)>>,
    successes: Mutex<u32>,
}

impl RecordingReporter {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Coalesced summaries, in order
    pub fn batches(&self) -> Vec<String> {
        self.batches.lock().expect("poisoned").clone()
    }

    /// Rendered failure messages, in order
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().expect("poisoned").clone()
    }

    /// Retry announcements as `(attempt, delay)`
    pub fn retries(&self) -> Vec<(u32, Duration)> {
        self.retries.lock().expect("poisoned").clone()
    }

    /// Number of successful syncs
    pub fn successes(&self) -> u32 {
        *self.successes.lock().expect("poisoned")
    }
}

impl SyncReporter for RecordingReporter {
    fn report_batch(&self, summary: &str) {
        self.batches
            .lock()
            .expect("poisoned")
            .push(summary.to_string());
    }

    fn report_failure(&self, error: &Error) {
        self.failures.lock().expect("poisoned").push(error.to_string());
    }

    fn report_retry(&self, attempt: u32, delay: Duration) {
        self.retries.lock().expect("poisoned").push((attempt, delay));
    }

    fn report_success(&self, _attempt: &SyncAttempt) {
        *self.successes.lock().expect("poisoned") += 1;
    }
}

/// Poll `condition` every 20ms until it holds or `timeout` passes
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
