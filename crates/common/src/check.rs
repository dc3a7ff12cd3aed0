//! Declarative check model
//!
//! A `Check` is pure data parsed from a YAML catalog: an id, a target page
//! (or the all-pages wildcard), and a typed expectation. Static kinds are
//! evaluated against raw markup; `behavioral_sequence` drives a live page
//! through an ordered list of steps.

use serde::{Deserialize, Serialize};

/// Which page(s) a check applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Target {
    /// Expanded at load time into one check per discovered page.
    AllPages,
    /// A single page, by path relative to the site root.
    Page(String),
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        if s == "all_pages" {
            Target::AllPages
        } else {
            Target::Page(s)
        }
    }
}

impl From<Target> for String {
    fn from(t: Target) -> Self {
        match t {
            Target::AllPages => "all_pages".to_string(),
            Target::Page(p) => p,
        }
    }
}

/// A named, typed assertion against one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    /// Unique id, used in the report and for run ordering
    pub id: String,

    /// Page path or `all_pages`
    pub target: Target,

    #[serde(flatten)]
    pub kind: CheckKind,
}

/// The typed expectation of a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    /// A regex that must match the raw file content.
    StaticPattern { pattern: String },

    /// A CSS selector that must match at least one element in the markup.
    DomPresence { selector: String },

    /// An attribute assertion on the first element matching the selector.
    DomAttribute {
        selector: String,
        attribute: String,
        #[serde(flatten)]
        predicate: Predicate,
    },

    /// Every relative `href` in the page resolves to a file in the site tree.
    InternalLinks {},

    /// An ordered sequence of browser steps run against the live page.
    BehavioralSequence { steps: Vec<Step> },
}

impl CheckKind {
    /// Behavioral checks need a browser session; everything else is evaluated
    /// on raw markup.
    pub fn is_behavioral(&self) -> bool {
        matches!(self, CheckKind::BehavioralSequence { .. })
    }
}

/// A single step in a behavioral sequence.
///
/// Steps execute strictly in order. `Assert` steps evaluate their probe with
/// a wait-until-or-timeout loop; a probe that never satisfies its predicate
/// within `timeout_ms` fails the check at that step and aborts the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to the check's target page.
    Navigate {},

    /// Click an element.
    Click { selector: String },

    /// Focus an element and press a key on it.
    PressKey { selector: String, key: String },

    /// Scroll an element into the viewport.
    ScrollIntoView { selector: String },

    /// Probe the page until the predicate holds or the budget elapses.
    Assert {
        #[serde(flatten)]
        probe: Probe,

        #[serde(flatten)]
        predicate: Predicate,

        #[serde(default = "default_assert_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_assert_timeout_ms() -> u64 {
    5000
}

/// What to observe on the live page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "probe", rename_all = "snake_case")]
pub enum Probe {
    /// An element attribute value (null when absent).
    ///
    /// With `equals_attribute` set, the probe instead yields whether the
    /// attribute equals another attribute on the same element — used for the
    /// lazy-loading `src == data-src` swap.
    Attribute {
        selector: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equals_attribute: Option<String>,
    },

    /// Whether an element's class list contains a class.
    ClassContains { selector: String, class: String },

    /// An element's trimmed inner text.
    Text { selector: String },

    /// A computed style property of an element.
    ComputedStyle { selector: String, property: String },

    /// An element's scroll offset along one axis.
    ScrollOffset {
        selector: String,
        #[serde(default)]
        axis: Axis,
    },

    /// A localStorage value (null when absent).
    Storage { key: String },

    /// `typeof` of a window global, e.g. `function` for a loaded library.
    Global { name: String },
}

impl Probe {
    /// Short description used in step diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Probe::Attribute { selector, name, .. } => format!("attribute {name} of {selector}"),
            Probe::ClassContains { selector, class } => format!("class '{class}' on {selector}"),
            Probe::Text { selector } => format!("text of {selector}"),
            Probe::ComputedStyle { selector, property } => {
                format!("computed {property} of {selector}")
            }
            Probe::ScrollOffset { selector, axis } => {
                format!("scroll {axis:?} offset of {selector}")
            }
            Probe::Storage { key } => format!("localStorage['{key}']"),
            Probe::Global { name } => format!("typeof window.{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    X,
    Y,
}

/// Expected outcome of a probe (or of a `dom_attribute` check).
///
/// Fields are combined with AND; a predicate with no fields set means
/// "present" (non-null), which is the common case for attribute existence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Predicate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,

    /// The probed value must be null/absent.
    #[serde(default)]
    pub absent: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_than: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than: Option<f64>,
}

impl Predicate {
    /// Evaluate against a probed JSON value.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        if self.absent {
            return value.is_null();
        }

        if let Some(expected) = &self.equals {
            if !json_eq(expected, value) {
                return false;
            }
        }

        if let Some(needle) = &self.contains {
            match value.as_str() {
                Some(s) if s.contains(needle.as_str()) => {}
                _ => return false,
            }
        }

        if let Some(min) = self.greater_than {
            match as_f64(value) {
                Some(n) if n > min => {}
                _ => return false,
            }
        }

        if let Some(max) = self.less_than {
            match as_f64(value) {
                Some(n) if n < max => {}
                _ => return false,
            }
        }

        // No constraints at all: require presence.
        if self.equals.is_none()
            && self.contains.is_none()
            && self.greater_than.is_none()
            && self.less_than.is_none()
        {
            return !value.is_null();
        }

        true
    }

    /// Human-readable form for diagnostics.
    pub fn describe(&self) -> String {
        if self.absent {
            return "absent".to_string();
        }
        let mut parts = Vec::new();
        if let Some(v) = &self.equals {
            parts.push(format!("== {v}"));
        }
        if let Some(s) = &self.contains {
            parts.push(format!("contains '{s}'"));
        }
        if let Some(n) = self.greater_than {
            parts.push(format!("> {n}"));
        }
        if let Some(n) = self.less_than {
            parts.push(format!("< {n}"));
        }
        if parts.is_empty() {
            parts.push("present".to_string());
        }
        parts.join(" and ")
    }
}

/// Numeric probes come back as JSON numbers, but computed styles arrive as
/// strings like `"0.5"` or `"320px"`; accept both.
fn as_f64(value: &serde_json::Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    value
        .as_str()
        .map(|s| s.trim_end_matches("px"))
        .and_then(|s| s.trim().parse().ok())
}

fn json_eq(expected: &serde_json::Value, actual: &serde_json::Value) -> bool {
    if expected == actual {
        return true;
    }
    // Tolerate number-vs-numeric-string mismatches (scrollLeft, opacity).
    match (as_f64(expected), as_f64(actual)) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => false,
    }
}
