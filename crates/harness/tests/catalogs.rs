//! Structural checks on the catalogs shipped under `checks/`.
//!
//! The catalogs are data, so regressions there are invisible to the type
//! system; these tests pin the parts of the site contract the YAML must
//! keep expressing.

use std::fs;
use std::path::Path;

use sitecheck_common::check::{Axis, CheckKind, Probe, Step};
use sitecheck_common::{Catalog, Check, PageSet};

fn shipped_checks() -> Vec<Check> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../checks");
    Catalog::load_dir(&dir).unwrap()
}

fn behavioral_steps<'a>(checks: &'a [Check], id: &str) -> &'a [Step] {
    let check = checks
        .iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| panic!("check {id} missing from shipped catalogs"));
    let CheckKind::BehavioralSequence { steps } = &check.kind else {
        panic!("check {id} is not behavioral");
    };
    steps
}

#[test]
fn test_shipped_catalogs_load_and_expand() {
    let checks = shipped_checks();

    let dir = tempfile::tempdir().unwrap();
    for f in [
        "index.html",
        "videos.html",
        "articles.html",
        "ecosysteme.html",
        "a-propos.html",
        "a-propos-en.html",
        "contact.html",
    ] {
        fs::write(dir.path().join(f), "<html></html>").unwrap();
    }
    let pages = PageSet::discover(dir.path()).unwrap();

    let expanded = Catalog::expand(checks, &pages).unwrap();
    assert!(!expanded.is_empty());
}

#[test]
fn test_lazy_load_swap_asserts_empty_src_before_scroll() {
    let checks = shipped_checks();
    let steps = behavioral_steps(&checks, "lazy-load-swap");

    let scroll_idx = steps
        .iter()
        .position(|s| matches!(s, Step::ScrollIntoView { .. }))
        .expect("lazy-load-swap must scroll the image into view");
    let absent_idx = steps
        .iter()
        .position(|s| {
            matches!(
                s,
                Step::Assert {
                    probe: Probe::Attribute { name, .. },
                    predicate,
                    ..
                } if name == "src" && predicate.absent
            )
        })
        .expect("lazy-load-swap must assert src is unset before the swap");

    // The before-state comes before the trigger.
    assert!(absent_idx < scroll_idx);

    assert!(steps.iter().any(|s| matches!(
        s,
        Step::Assert {
            probe: Probe::Attribute {
                equals_attribute: Some(other),
                ..
            },
            ..
        } if other == "data-src"
    )));
}

#[test]
fn test_both_carousels_are_exercised() {
    let checks = shipped_checks();
    for id in ["carousel-buttons", "ecosysteme-carousel-buttons"] {
        let steps = behavioral_steps(&checks, id);
        assert!(
            steps
                .iter()
                .any(|s| matches!(s, Step::Assert { probe: Probe::ScrollOffset { .. }, .. })),
            "{id} must observe the carousel scroll offset"
        );
    }
}

#[test]
fn test_back_to_top_covers_opacity_and_vertical_scroll() {
    let checks = shipped_checks();
    let steps = behavioral_steps(&checks, "back-to-top");

    assert!(steps.iter().any(|s| matches!(
        s,
        Step::Assert {
            probe: Probe::ComputedStyle { property, .. },
            ..
        } if property == "opacity"
    )));
    assert!(steps.iter().any(|s| matches!(
        s,
        Step::Assert {
            probe: Probe::ScrollOffset { axis: Axis::Y, .. },
            ..
        }
    )));
}

#[test]
fn test_footer_and_form_checks_present() {
    let checks = shipped_checks();
    for id in [
        "social-link-youtube",
        "social-link-linkedin",
        "social-link-twitter",
        "newsletter-form-action",
        "newsletter-form-method",
        "newsletter-email-input",
        "lazy-media-alt",
    ] {
        assert!(
            checks.iter().any(|c| c.id == id),
            "check {id} missing from shipped catalogs"
        );
    }
}
