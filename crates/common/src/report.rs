//! Run results and report aggregation
//!
//! `CheckResult`s are appended in execution order and never mutated; the
//! verdict is decided only at `finalize`, which freezes the summary counts
//! and the per-page breakdown.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one check against one page.
///
/// `Error` is distinct from `Fail` so timeouts and infrastructure problems
/// can be triaged separately from real assertion regressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    pub page: String,
    pub status: Status,

    /// Diagnostic message for failed/errored checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub duration_ms: u64,

    /// Captured artifact, e.g. a failure screenshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl CheckResult {
    pub fn pass(check_id: &str, page: &str, duration_ms: u64) -> Self {
        Self {
            check_id: check_id.to_string(),
            page: page.to_string(),
            status: Status::Pass,
            message: None,
            duration_ms,
            artifact: None,
        }
    }

    pub fn fail(check_id: &str, page: &str, duration_ms: u64, message: String) -> Self {
        Self {
            check_id: check_id.to_string(),
            page: page.to_string(),
            status: Status::Fail,
            message: Some(message),
            duration_ms,
            artifact: None,
        }
    }

    pub fn error(check_id: &str, page: &str, duration_ms: u64, message: String) -> Self {
        Self {
            check_id: check_id.to_string(),
            page: page.to_string(),
            status: Status::Error,
            message: Some(message),
            duration_ms,
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, path: PathBuf) -> Self {
        self.artifact = Some(path);
        self
    }
}

/// Per-page totals in the finalized report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

/// Ordered collection of results plus the finalized summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub summary: Summary,
    pub per_page: BTreeMap<String, PageSummary>,
    pub results: Vec<CheckResult>,

    #[serde(skip)]
    finalized: bool,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            duration_ms: 0,
            summary: Summary::default(),
            per_page: BTreeMap::new(),
            results: Vec::new(),
            finalized: false,
        }
    }

    /// Append a result in execution order. Has no effect once finalized.
    pub fn record(&mut self, result: CheckResult) {
        if !self.finalized {
            self.results.push(result);
        }
    }

    /// Compute totals and freeze the report. The verdict (`passed()`) is
    /// meaningful only after this point.
    pub fn finalize(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self.summary = Summary {
            total: self.results.len(),
            ..Summary::default()
        };

        for result in &self.results {
            let page = self.per_page.entry(result.page.clone()).or_default();
            match result.status {
                Status::Pass => {
                    self.summary.passed += 1;
                    page.passed += 1;
                }
                Status::Fail => {
                    self.summary.failed += 1;
                    page.failed += 1;
                }
                Status::Error => {
                    self.summary.errored += 1;
                    page.errored += 1;
                }
            }
        }

        self.finalized = true;
        self
    }

    /// True only when every check passed.
    pub fn passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.errored == 0
    }

    /// Results that need a diagnostic line in the run output.
    pub fn problems(&self) -> impl Iterator<Item = &CheckResult> {
        self.results
            .iter()
            .filter(|r| r.status != Status::Pass)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
