//! Check catalog loading and expansion
//!
//! Catalogs are YAML files holding a list of checks. At load time every
//! `all_pages` wildcard is expanded into one concrete check per discovered
//! page and every explicit target is validated against the page set, so a
//! typo in a target fails the run before any browser launches.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::check::{Check, CheckKind, Target};
use crate::error::{Error, Result};
use crate::page::{Page, PageSet};

/// One catalog file: a named list of checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub checks: Vec<Check>,
}

/// A check bound to exactly one concrete page.
#[derive(Debug, Clone)]
pub struct ExpandedCheck {
    pub page: Page,
    pub check: Check,
}

impl Catalog {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| Error::CatalogParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load every `*.yaml`/`*.yml` catalog under a directory, in path order.
    ///
    /// A missing directory or one yielding zero checks is fatal: a run with
    /// nothing to verify must not report success.
    pub fn load_dir(dir: &Path) -> Result<Vec<Check>> {
        if !dir.is_dir() {
            return Err(Error::ChecksDirNotFound(dir.to_path_buf()));
        }

        let mut entries: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        entries.sort();

        let mut checks = Vec::new();
        for path in entries {
            let catalog = Self::from_file(&path)?;
            debug!("Loaded {} check(s) from {}", catalog.checks.len(), path.display());
            checks.extend(catalog.checks);
        }

        if checks.is_empty() {
            return Err(Error::NoChecks(dir.to_path_buf()));
        }
        Ok(checks)
    }

    /// Expand wildcard targets and validate explicit ones.
    ///
    /// The result is ordered by (page path, check id) so run order is
    /// reproducible regardless of catalog file layout.
    pub fn expand(checks: Vec<Check>, pages: &PageSet) -> Result<Vec<ExpandedCheck>> {
        let mut expanded = Vec::new();

        for check in checks {
            validate(&check)?;
            match &check.target {
                Target::AllPages => {
                    for page in pages.pages() {
                        expanded.push(ExpandedCheck {
                            page: page.clone(),
                            check: check.clone(),
                        });
                    }
                }
                Target::Page(path) => {
                    let page = pages.get(path).ok_or_else(|| Error::UnknownTarget {
                        check_id: check.id.clone(),
                        page: path.clone(),
                    })?;
                    expanded.push(ExpandedCheck {
                        page: page.clone(),
                        check: check.clone(),
                    });
                }
            }
        }

        expanded.sort_by(|a, b| {
            (&a.page.path, &a.check.id).cmp(&(&b.page.path, &b.check.id))
        });
        Ok(expanded)
    }
}

/// Reject malformed checks at load time rather than mid-run.
fn validate(check: &Check) -> Result<()> {
    match &check.kind {
        CheckKind::StaticPattern { pattern } => {
            Regex::new(pattern).map_err(|e| Error::InvalidCheck {
                check_id: check.id.clone(),
                reason: format!("invalid pattern: {e}"),
            })?;
        }
        CheckKind::BehavioralSequence { steps } if steps.is_empty() => {
            return Err(Error::InvalidCheck {
                check_id: check.id.clone(),
                reason: "behavioral sequence has no steps".to_string(),
            });
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pages(files: &[&str]) -> (tempfile::TempDir, PageSet) {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(dir.path().join(f), "<html></html>").unwrap();
        }
        let set = PageSet::discover(dir.path()).unwrap();
        (dir, set)
    }

    #[test]
    fn test_wildcard_expands_to_one_check_per_page() {
        let (_dir, set) = pages(&["index.html", "contact.html", "videos.html"]);
        let checks = Catalog::from_yaml(
            r#"
checks:
  - id: footer
    target: all_pages
    kind: static_pattern
    pattern: '<footer'
"#,
        )
        .unwrap()
        .checks;

        let expanded = Catalog::expand(checks, &set).unwrap();
        assert_eq!(expanded.len(), 3);
        assert!(expanded.iter().all(|e| e.check.id == "footer"));
    }

    #[test]
    fn test_expansion_order_is_deterministic() {
        let (_dir, set) = pages(&["videos.html", "index.html"]);
        let checks = Catalog::from_yaml(
            r#"
checks:
  - id: b-check
    target: all_pages
    kind: dom_presence
    selector: header
  - id: a-check
    target: all_pages
    kind: dom_presence
    selector: footer
"#,
        )
        .unwrap()
        .checks;

        let expanded = Catalog::expand(checks, &set).unwrap();
        let order: Vec<_> = expanded
            .iter()
            .map(|e| (e.page.path.as_str(), e.check.id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("index.html", "a-check"),
                ("index.html", "b-check"),
                ("videos.html", "a-check"),
                ("videos.html", "b-check"),
            ]
        );
    }

    #[test]
    fn test_unknown_target_fails_load() {
        let (_dir, set) = pages(&["index.html"]);
        let checks = Catalog::from_yaml(
            r#"
checks:
  - id: typo
    target: a-porpos.html
    kind: dom_presence
    selector: footer
"#,
        )
        .unwrap()
        .checks;

        let err = Catalog::expand(checks, &set).unwrap_err();
        match err {
            Error::UnknownTarget { check_id, page } => {
                assert_eq!(check_id, "typo");
                assert_eq!(page, "a-porpos.html");
            }
            other => panic!("expected UnknownTarget, got {other}"),
        }
    }

    #[test]
    fn test_invalid_regex_fails_load() {
        let (_dir, set) = pages(&["index.html"]);
        let checks = Catalog::from_yaml(
            r#"
checks:
  - id: broken
    target: index.html
    kind: static_pattern
    pattern: '(['
"#,
        )
        .unwrap()
        .checks;

        assert!(matches!(
            Catalog::expand(checks, &set).unwrap_err(),
            Error::InvalidCheck { .. }
        ));
    }

    #[test]
    fn test_empty_behavioral_sequence_fails_load() {
        let (_dir, set) = pages(&["index.html"]);
        let checks = Catalog::from_yaml(
            r#"
checks:
  - id: empty
    target: index.html
    kind: behavioral_sequence
    steps: []
"#,
        )
        .unwrap()
        .checks;

        assert!(matches!(
            Catalog::expand(checks, &set).unwrap_err(),
            Error::InvalidCheck { .. }
        ));
    }

    #[test]
    fn test_missing_checks_dir_is_an_error() {
        let err = Catalog::load_dir(Path::new("/no/such/checks")).unwrap_err();
        assert!(matches!(err, Error::ChecksDirNotFound(_)));
    }

    #[test]
    fn test_empty_checks_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoChecks(_)));
    }

    #[test]
    fn test_catalog_with_no_checks_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.yaml"), "checks: []\n").unwrap();
        let err = Catalog::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoChecks(_)));
    }

    #[test]
    fn test_load_dir_merges_files_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.yaml"),
            "checks:\n  - id: two\n    target: all_pages\n    kind: dom_presence\n    selector: footer\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.yaml"),
            "checks:\n  - id: one\n    target: all_pages\n    kind: dom_presence\n    selector: header\n",
        )
        .unwrap();

        let checks = Catalog::load_dir(dir.path()).unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].id, "one");
        assert_eq!(checks[1].id, "two");
    }
}
