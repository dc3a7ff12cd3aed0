//! Check runner - executes the expanded catalog and produces the run report
//!
//! Static checks are evaluated on raw markup with no network or browser
//! involved; behavioral checks drive an isolated page handle through their
//! step sequence. Setup failures abort the run, individual check outcomes
//! never do.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, error, info};

use sitecheck_common::check::{CheckKind, Step};
use sitecheck_common::{Catalog, CheckResult, ExpandedCheck, PageSet, Result, RunReport, Status};

use crate::browser::{BrowserLaunchConfig, BrowserSession, PageHandle};
use crate::server::FixtureServer;
use crate::wait::{wait_until, WaitOutcome};

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory containing the site under test
    pub site_root: PathBuf,

    /// Directory of YAML check catalogs
    pub checks_dir: PathBuf,

    /// Fixture server port (None = ephemeral)
    pub port: Option<u16>,

    /// Directory for the JSON report and failure artifacts
    pub output_dir: PathBuf,

    /// Budget for a single behavioral check; overruns are recorded as
    /// errors, not failures, so flaky timing is triaged separately
    pub check_timeout: Duration,

    /// Budget for the whole run. Once spent, the in-flight check is errored,
    /// the remaining checks are skipped, and teardown proceeds.
    pub run_timeout: Option<Duration>,

    /// Poll interval for wait-until assertions
    pub poll_interval: Duration,

    pub browser: BrowserLaunchConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            site_root: PathBuf::from("."),
            checks_dir: PathBuf::from("checks"),
            port: None,
            output_dir: PathBuf::from("sitecheck-results"),
            check_timeout: Duration::from_secs(30),
            run_timeout: Some(Duration::from_secs(300)),
            poll_interval: Duration::from_millis(100),
            browser: BrowserLaunchConfig::default(),
        }
    }
}

/// Orchestrates discovery, fixture server, browser session and check
/// execution for one invocation.
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run the whole catalog. Fatal setup/load errors surface as `Err`;
    /// everything else lands in the report.
    pub async fn run(&mut self) -> Result<RunReport> {
        let started = Instant::now();

        let pages = PageSet::discover(&self.config.site_root)?;
        let checks = Catalog::load_dir(&self.config.checks_dir)?;
        let expanded = Catalog::expand(checks, &pages)?;

        info!(
            "Running {} check(s) across {} page(s)",
            expanded.len(),
            pages.len()
        );

        let mut server = FixtureServer::start(pages.root(), self.config.port).await?;
        server.wait_ready(Duration::from_secs(5)).await?;

        // The engine is only paid for when the catalog needs a live page.
        let browser = if expanded.iter().any(|c| c.check.kind.is_behavioral()) {
            Some(BrowserSession::launch(self.config.browser.clone()).await?)
        } else {
            None
        };

        let deadline = self.config.run_timeout.map(|budget| Instant::now() + budget);

        let mut report = RunReport::new();
        for item in &expanded {
            let Some(budget) = check_budget(deadline, Instant::now(), self.config.check_timeout)
            else {
                let result = CheckResult::error(
                    &item.check.id,
                    &item.page.path,
                    0,
                    "run budget exhausted before this check started".to_string(),
                );
                log_result(&result);
                report.record(result);
                error!("Run budget exhausted; skipping remaining checks");
                break;
            };
            let result = self
                .run_check(item, &pages, browser.as_ref(), server.base_url(), budget)
                .await;
            log_result(&result);
            report.record(result);
        }

        if let Some(session) = browser {
            let _ = session.close().await;
        }
        server.stop().await;

        let report = report.finalize(started.elapsed().as_millis() as u64);
        info!(
            "Run complete: {} passed, {} failed, {} errored ({} ms)",
            report.summary.passed,
            report.summary.failed,
            report.summary.errored,
            report.duration_ms
        );
        Ok(report)
    }

    /// Write the machine-readable report for CI consumption.
    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self.config.output_dir.join("report.json");
        std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
        info!("Report written to {}", path.display());
        Ok(path)
    }

    async fn run_check(
        &self,
        item: &ExpandedCheck,
        pages: &PageSet,
        browser: Option<&BrowserSession>,
        base_url: &str,
        budget: Duration,
    ) -> CheckResult {
        debug!("Running check {} against {}", item.check.id, item.page.path);
        match &item.check.kind {
            CheckKind::BehavioralSequence { steps } => {
                let Some(session) = browser else {
                    return CheckResult::error(
                        &item.check.id,
                        &item.page.path,
                        0,
                        "no browser session available".to_string(),
                    );
                };
                self.run_behavioral(item, steps, session, base_url, budget)
                    .await
            }
            _ => self.run_static(item, pages),
        }
    }

    /// Static checks: read the file once, match, record. Idempotent.
    fn run_static(&self, item: &ExpandedCheck, pages: &PageSet) -> CheckResult {
        let start = Instant::now();
        let content = match pages.read(&item.page) {
            Ok(c) => c,
            Err(e) => {
                return CheckResult::error(
                    &item.check.id,
                    &item.page.path,
                    start.elapsed().as_millis() as u64,
                    format!("could not read page: {e}"),
                )
            }
        };

        let duration = start.elapsed().as_millis() as u64;
        match static_outcome(&item.check.kind, &content, pages) {
            StaticOutcome::Pass => CheckResult::pass(&item.check.id, &item.page.path, duration),
            StaticOutcome::Fail(msg) => {
                CheckResult::fail(&item.check.id, &item.page.path, duration, msg)
            }
            StaticOutcome::Error(msg) => {
                CheckResult::error(&item.check.id, &item.page.path, duration, msg)
            }
        }
    }

    async fn run_behavioral(
        &self,
        item: &ExpandedCheck,
        steps: &[Step],
        session: &BrowserSession,
        base_url: &str,
        budget: Duration,
    ) -> CheckResult {
        let start = Instant::now();
        let page = match session.new_page(base_url).await {
            Ok(p) => p,
            Err(e) => {
                return CheckResult::error(
                    &item.check.id,
                    &item.page.path,
                    start.elapsed().as_millis() as u64,
                    e.to_string(),
                )
            }
        };

        // Only the step sequence is timed; the page handle lives outside the
        // budget so a timed-out check never leaks its tab.
        let outcome = tokio::time::timeout(budget, self.drive(&page, item, steps)).await;
        let duration = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(None)) => CheckResult::pass(&item.check.id, &item.page.path, duration),
            Ok(Ok(Some(message))) => {
                let mut result =
                    CheckResult::fail(&item.check.id, &item.page.path, duration, message);
                if let Some(artifact) = self.capture_artifact(&page, item).await {
                    result = result.with_artifact(artifact);
                }
                result
            }
            Ok(Err(e)) => {
                CheckResult::error(&item.check.id, &item.page.path, duration, e.to_string())
            }
            Err(_) => CheckResult::error(
                &item.check.id,
                &item.page.path,
                duration,
                format!("check exceeded its {:?} budget", budget),
            ),
        };

        page.close().await;
        result
    }

    /// Execute steps strictly in order; the first failing step aborts the
    /// rest and its message names the step index.
    async fn drive(
        &self,
        page: &PageHandle,
        item: &ExpandedCheck,
        steps: &[Step],
    ) -> Result<Option<String>> {
        for (idx, step) in steps.iter().enumerate() {
            let n = idx + 1;
            match step {
                Step::Navigate {} => {
                    if let Err(e) = page.navigate(&item.page.path).await {
                        return Ok(Some(format!("step {n} (navigate): {e}")));
                    }
                }
                Step::Click { selector } => {
                    if let Err(e) = page.click(selector).await {
                        return Ok(Some(format!("step {n} (click {selector}): {e}")));
                    }
                }
                Step::PressKey { selector, key } => {
                    if let Err(e) = page.press_key(selector, key).await {
                        return Ok(Some(format!("step {n} (press {key} on {selector}): {e}")));
                    }
                }
                Step::ScrollIntoView { selector } => {
                    if let Err(e) = page.scroll_into_view(selector).await {
                        return Ok(Some(format!(
                            "step {n} (scroll {selector} into view): {e}"
                        )));
                    }
                }
                Step::Assert {
                    probe,
                    predicate,
                    timeout_ms,
                } => {
                    let budget = Duration::from_millis(*timeout_ms);
                    let outcome = wait_until(budget, self.config.poll_interval, || {
                        let (page, probe, predicate) = (page, probe, predicate);
                        async move {
                            let observed = page.probe(probe).await?;
                            Ok((predicate.matches(&observed), observed))
                        }
                    })
                    .await?;

                    if let WaitOutcome::TimedOut(last) = outcome {
                        return Ok(Some(format!(
                            "step {n} ({}): expected {}, last observed {last}",
                            probe.describe(),
                            predicate.describe()
                        )));
                    }
                }
            }
        }
        Ok(None)
    }

    async fn capture_artifact(&self, page: &PageHandle, item: &ExpandedCheck) -> Option<PathBuf> {
        let dir = self.config.output_dir.join("artifacts");
        if std::fs::create_dir_all(&dir).is_err() {
            return None;
        }
        let name = format!(
            "{}--{}.png",
            item.check.id,
            item.page.path.replace(['/', '.'], "_")
        );
        let path = dir.join(name);
        match page.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                debug!("Could not capture failure screenshot: {}", e);
                None
            }
        }
    }
}

/// Clamp the per-check budget to what remains of the run budget.
///
/// `None` means the run budget is already spent and no further check may
/// start.
fn check_budget(
    deadline: Option<Instant>,
    now: Instant,
    check_timeout: Duration,
) -> Option<Duration> {
    match deadline {
        None => Some(check_timeout),
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(now);
            if remaining.is_zero() {
                None
            } else {
                Some(check_timeout.min(remaining))
            }
        }
    }
}

fn log_result(result: &CheckResult) {
    match result.status {
        Status::Pass => {
            info!(
                "✓ {} [{}] ({} ms)",
                result.check_id, result.page, result.duration_ms
            );
        }
        Status::Fail => {
            error!(
                "✗ {} [{}] - {}",
                result.check_id,
                result.page,
                result.message.as_deref().unwrap_or("assertion failed")
            );
        }
        Status::Error => {
            error!(
                "⚠ {} [{}] - {}",
                result.check_id,
                result.page,
                result.message.as_deref().unwrap_or("check errored")
            );
        }
    }
}

enum StaticOutcome {
    Pass,
    Fail(String),
    Error(String),
}

/// Evaluate a static check kind against raw markup.
fn static_outcome(kind: &CheckKind, content: &str, pages: &PageSet) -> StaticOutcome {
    match kind {
        CheckKind::StaticPattern { pattern } => {
            let re = match Regex::new(pattern) {
                Ok(re) => re,
                Err(e) => return StaticOutcome::Error(format!("invalid pattern: {e}")),
            };
            match re.find(content) {
                Some(_) => StaticOutcome::Pass,
                None => StaticOutcome::Fail(format!("pattern `{pattern}` not found")),
            }
        }

        CheckKind::DomPresence { selector } => {
            let sel = match Selector::parse(selector) {
                Ok(s) => s,
                Err(e) => return StaticOutcome::Error(format!("invalid selector: {e}")),
            };
            let doc = Html::parse_document(content);
            match doc.select(&sel).next() {
                Some(_) => StaticOutcome::Pass,
                None => {
                    StaticOutcome::Fail(format!("no element matches selector `{selector}`"))
                }
            }
        }

        CheckKind::DomAttribute {
            selector,
            attribute,
            predicate,
        } => {
            let sel = match Selector::parse(selector) {
                Ok(s) => s,
                Err(e) => return StaticOutcome::Error(format!("invalid selector: {e}")),
            };
            let doc = Html::parse_document(content);
            let mut matched = 0usize;
            // Every matching element must satisfy the predicate.
            for element in doc.select(&sel) {
                matched += 1;
                let observed = match element.value().attr(attribute) {
                    Some(v) => serde_json::Value::String(v.to_string()),
                    None => serde_json::Value::Null,
                };
                if !predicate.matches(&observed) {
                    return StaticOutcome::Fail(format!(
                        "attribute `{attribute}` on match {matched} of `{selector}` is {observed}, expected {}",
                        predicate.describe()
                    ));
                }
            }
            if matched == 0 {
                StaticOutcome::Fail(format!("no element matches selector `{selector}`"))
            } else {
                StaticOutcome::Pass
            }
        }

        CheckKind::InternalLinks {} => {
            let re = match Regex::new(r#"href="([^"]+)""#) {
                Ok(re) => re,
                Err(e) => return StaticOutcome::Error(format!("internal regex: {e}")),
            };
            let mut broken = Vec::new();
            for cap in re.captures_iter(content) {
                let href = &cap[1];
                if href.starts_with("http")
                    || href.starts_with('#')
                    || href.starts_with("mailto:")
                    || href.starts_with("tel:")
                {
                    continue;
                }
                // Drop fragments before resolving against the tree.
                let target = href.split('#').next().unwrap_or(href);
                if !target.is_empty() && !pages.resolves(target) {
                    broken.push(href.to_string());
                }
            }
            if broken.is_empty() {
                StaticOutcome::Pass
            } else {
                StaticOutcome::Fail(format!("broken internal link(s): {}", broken.join(", ")))
            }
        }

        CheckKind::BehavioralSequence { .. } => {
            StaticOutcome::Error("behavioral check routed to static runner".to_string())
        }
    }
}
