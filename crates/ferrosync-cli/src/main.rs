//! ferrosync - watch a directory and mirror it with rsync
//!
//! Every change under the watched tree is collected; once per poll interval
//! the pending changes trigger a single rsync run to the destination, retried
//! with a growing delay until it succeeds.

mod display;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use display::{display_forced_exit, display_interrupted, ConsoleReporter};
use ferrosync_config::{Config, ConfigBuilder, ConfigLoader, LoggingConfig};
use ferrosync_engine::{locate, WatchSession};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Watch PATH and rsync to DEST
#[derive(Parser, Debug)]
#[command(
    name = "ferrosync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watch PATH and rsync to DEST",
    long_about = "Watch PATH and rsync to DEST\n\n\
                  Example: ferrosync ./repo host:~/projects\n\n\
                  Note: A trailing slash on the PATH changes this behavior to avoid\n\
                  creating an additional directory level at the DEST.\n\n\
                  See also: https://linux.die.net/man/1/rsync"
)]
struct Cli {
    /// Directory to watch
    #[arg(required_unless_present = "init_config")]
    path: Option<PathBuf>,

    /// Destination passed to rsync (local path or host:path)
    #[arg(required_unless_present = "init_config")]
    dest: Option<String>,

    /// Poll interval in milliseconds, also the retry backoff step [default: 300]
    #[arg(short, long, value_name = "MS")]
    duration: Option<u64>,

    /// Sync timeout in milliseconds [default: 30000]
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// Use the polling watcher instead of native notifications
    #[arg(long)]
    polling: bool,

    /// rsync executable name or path [default: rsync]
    #[arg(long, value_name = "EXE")]
    rsync: Option<String>,

    /// Extra exclusion pattern passed to rsync (repeatable)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a default configuration file and exit
    #[arg(long, value_name = "FILE", conflicts_with = "config")]
    init_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Layer command-line flags over the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(duration) = self.duration {
            config.watch.duration_ms = duration;
        }
        if let Some(timeout) = self.timeout {
            config.sync.timeout_ms = timeout;
        }
        if self.polling {
            config.watch.polling = true;
        }
        if let Some(rsync) = &self.rsync {
            config.sync.executable.clone_from(rsync);
        }
        config.sync.exclude.extend(self.exclude.iter().cloned());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.init_config {
        ConfigLoader::generate_default_config(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }
    let (Some(path), Some(dest)) = (cli.path.clone(), cli.dest.clone()) else {
        anyhow::bail!("PATH and DEST are required");
    };

    let mut config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    ConfigBuilder::validate(&config)?;

    init_logging(&cli, &config.logging)?;
    info!("ferrosync v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Effective configuration: {:?}", config);

    let executable = locate(&config.sync.executable)?;
    info!("Using sync executable {}", executable.display());

    let settings = config.watch_settings(&path, &dest, executable);
    let cancel = CancellationToken::new();
    let reporter = Arc::new(ConsoleReporter::new(cli.quiet, cli.verbose));

    let mut session = WatchSession::new(settings, reporter, cancel.clone());
    let root = session.start()?;

    if !cli.quiet {
        println!(
            "{} Watching {} and syncing to {}",
            style("⟲").blue().bold(),
            style(root.display()).cyan(),
            style(&dest).cyan()
        );
    }

    tokio::spawn(async move {
        if wait_for_interrupts(tokio::signal::ctrl_c, cancel).await {
            display_forced_exit();
            std::process::exit(130);
        }
    });

    session.run().await?;
    info!("ferrosync stopped");
    Ok(())
}

/// Cancel on the first interrupt; resolve `true` if a second one arrives
///
/// The second interrupt lets the user skip the termination grace period of a
/// sync that is still shutting down.
async fn wait_for_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return false;
    }
    display_interrupted();
    cancel.cancel();
    next_interrupt().await.is_ok()
}

fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
