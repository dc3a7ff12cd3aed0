//! sitecheck CLI - Main Entry Point
//!
//! Runs the declarative check catalog against a static site tree and reports
//! the verdict. Exit codes: 0 all checks passed, 1 at least one check failed
//! or errored, 2 the harness itself could not run.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

mod output;

use sitecheck_harness::{BrowserLaunchConfig, Runner, RunnerConfig};

/// sitecheck - declarative verification for static sites
#[derive(Parser)]
#[command(name = "sitecheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the site under test
    site_root: PathBuf,

    /// Directory of YAML check catalogs
    #[arg(long, default_value = "checks")]
    checks: PathBuf,

    /// Fixture server port (defaults to an ephemeral port)
    #[arg(long)]
    port: Option<u16>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: output::OutputFormat,

    /// Directory for the JSON report and failure screenshots
    #[arg(long, default_value = "sitecheck-results")]
    output: PathBuf,

    /// Budget in seconds for a single behavioral check
    #[arg(long, default_value_t = 30)]
    check_timeout_secs: u64,

    /// Budget in seconds for the whole run; once spent, the in-flight check
    /// is errored and the rest are skipped
    #[arg(long, default_value_t = 300)]
    run_timeout_secs: u64,

    /// Explicit Chrome/Chromium binary for behavioral checks
    #[arg(long, env = "SITECHECK_CHROME")]
    chrome: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let config = RunnerConfig {
        site_root: cli.site_root,
        checks_dir: cli.checks,
        port: cli.port,
        output_dir: cli.output,
        check_timeout: Duration::from_secs(cli.check_timeout_secs),
        run_timeout: Some(Duration::from_secs(cli.run_timeout_secs)),
        browser: BrowserLaunchConfig {
            executable: cli.chrome,
            ..BrowserLaunchConfig::default()
        },
        ..RunnerConfig::default()
    };

    let mut runner = Runner::new(config);
    let report = match runner.run().await {
        Ok(report) => report,
        Err(e) => {
            output::print_error(&format!("Run aborted: {}", e));
            return 2;
        }
    };

    if let Err(e) = runner.write_report(&report) {
        output::print_error(&format!("Could not write report: {}", e));
        return 2;
    }

    output::print_report(&report, cli.format);

    if report.passed() {
        0
    } else {
        1
    }
}
