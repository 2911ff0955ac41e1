//! Console output for the ferrosync CLI

use console::style;
use ferrosync_types::{Error, SyncAttempt, SyncReporter};
use std::time::Duration;

/// Width of the rule a change summary is centred in
pub const RULE_WIDTH: usize = 79;

/// Centre `summary` in a rule of dashes
pub fn rule(summary: &str) -> String {
    format!("{:-^width$}", summary, width = RULE_WIDTH)
}

/// Prints sync progress to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a reporter; `quiet` drops everything but failures
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self { quiet, verbose }
    }
}

impl SyncReporter for ConsoleReporter {
    fn report_batch(&self, summary: &str) {
        if !self.quiet {
            println!("{}", style(rule(summary)).cyan());
        }
    }

    fn report_failure(&self, error: &Error) {
        println!("{} {}", style("✗").red().bold(), style(error).red());
    }

    fn report_retry(&self, attempt: u32, delay: Duration) {
        if self.verbose {
            println!(
                "{} {}",
                style(format!("retry#{attempt}...")).yellow(),
                style(format!("(in {})", format_duration(delay))).dim()
            );
        } else {
            println!("{}", style(format!("retry#{attempt}...")).yellow());
        }
    }

    fn report_success(&self, attempt: &SyncAttempt) {
        if self.verbose && !self.quiet {
            println!(
                "{} Synced in {}",
                style("✓").green(),
                style(format_duration(attempt.elapsed)).blue()
            );
        }
    }
}

/// Print the line shown when Ctrl-C is received
pub fn display_interrupted() {
    println!("{}", style("Interrupted, stopping watcher").yellow());
}

/// Second interrupt: leaving without waiting for the sync to shut down
pub fn display_forced_exit() {
    eprintln!("{}", style("Interrupted again, exiting now").red());
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if duration.as_secs() < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_rule_is_centred() {
        let line = rule("watching /tmp/repo");
        assert_eq!(line.chars().count(), RULE_WIDTH);
        assert!(line.starts_with("------"));
        assert!(line.ends_with("------"));
        assert!(line.contains("watching /tmp/repo"));
    }

    #[test]
    fn test_rule_long_summary_is_untouched() {
        let summary = "x".repeat(100);
        assert_eq!(rule(&summary), summary);
    }

    #[rstest]
    #[case(Duration::ZERO, "0ms")]
    #[case(Duration::from_millis(300), "300ms")]
    #[case(Duration::from_millis(1500), "1.50s")]
    #[case(Duration::from_secs(125), "2m 5s")]
    fn test_format_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }
}
