//! Invocation of the external sync tool with a bounded run time

use async_trait::async_trait;
use ferrosync_types::{Error, Result, SyncAttempt, Synchronizer, WatchSettings, GIT_DIR};
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often the child's status is checked
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a terminated child gets to exit before it is killed outright
pub const TERMINATION_GRACE: Duration = Duration::from_secs(10);

/// Flags always passed to the sync tool
pub const BASE_ARGS: &[&str] = &["-avzpur", "--delete", "--force"];

enum Wait {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

/// Runs the sync tool once per call
#[derive(Debug, Clone)]
pub struct SyncInvoker {
    settings: WatchSettings,
    cancel: CancellationToken,
    poll_interval: Duration,
    termination_grace: Duration,
}

impl SyncInvoker {
    /// Create an invoker for `settings`; `cancel` aborts an in-flight run
    pub fn new(settings: WatchSettings, cancel: CancellationToken) -> Self {
        Self {
            settings,
            cancel,
            poll_interval: STATUS_POLL_INTERVAL,
            termination_grace: TERMINATION_GRACE,
        }
    }

    /// Override the grace period between SIGTERM and a hard kill
    pub fn with_termination_grace(mut self, grace: Duration) -> Self {
        self.termination_grace = grace;
        self
    }

    /// Arguments for the sync tool, without the executable itself
    ///
    /// The `.gitignore` lookup happens on every call because the file may be
    /// created while watching.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = BASE_ARGS.iter().map(OsString::from).collect();
        args.push("--exclude".into());
        args.push(GIT_DIR.into());

        for pattern in &self.settings.excludes {
            args.push("--exclude".into());
            args.push(pattern.into());
        }

        let gitignore = self.settings.gitignore_path();
        if gitignore.is_file() {
            args.push("--exclude-from".into());
            args.push(gitignore.into_os_string());
        }

        args.push(self.settings.source.clone().into_os_string());
        args.push(self.settings.destination.clone().into());
        args
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.settings.executable);
        command
            .args(self.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }

    async fn wait_bounded(&self, child: &mut Child, started_at: Instant) -> Result<Wait> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Wait::Exited(status));
            }
            if started_at.elapsed() > self.settings.timeout {
                return Ok(Wait::TimedOut);
            }
            tokio::select! {
                () = self.cancel.cancelled() => return Ok(Wait::Cancelled),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Ask the child to stop and wait for it, escalating to a kill after the grace period
    async fn terminate(&self, child: &mut Child) -> Result<ExitStatus> {
        if let Err(e) = request_termination(child) {
            warn!("Failed to signal sync process: {}", e);
        }
        match tokio::time::timeout(self.termination_grace, child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!(
                    "Sync process ignored termination for {:?}, killing it",
                    self.termination_grace
                );
                child.kill().await?;
                Ok(child.wait().await?)
            }
        }
    }

    async fn run(&self) -> Result<SyncAttempt> {
        let started_at = Instant::now();
        debug!(
            "Running {} {:?}",
            self.settings.executable.display(),
            self.build_args()
        );

        let mut child = self.command().spawn().map_err(|e| Error::Io {
            message: format!(
                "failed to start {}: {}",
                self.settings.executable.display(),
                e
            ),
        })?;

        match self.wait_bounded(&mut child, started_at).await? {
            Wait::Exited(status) if status.success() => {
                let elapsed = started_at.elapsed();
                info!("Sync completed in {:?}", elapsed);
                Ok(SyncAttempt {
                    started_at,
                    timeout: self.settings.timeout,
                    elapsed,
                    exit_code: status.code().unwrap_or(0),
                })
            }
            Wait::Exited(status) => Err(Error::SyncFailed {
                code: status.code(),
            }),
            Wait::TimedOut => {
                let status = self.terminate(&mut child).await?;
                Err(Error::SyncTimeout {
                    timeout: self.settings.timeout,
                    code: status.code(),
                })
            }
            Wait::Cancelled => {
                info!("Terminating in-flight sync on shutdown");
                self.terminate(&mut child).await?;
                Err(Error::Cancelled)
            }
        }
    }
}

#[async_trait]
impl Synchronizer for SyncInvoker {
    async fn attempt_sync(&self) -> Result<SyncAttempt> {
        self.run().await
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // No pid means the child has already been reaped
    match child.id() {
        Some(pid) => kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(std::io::Error::from),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
