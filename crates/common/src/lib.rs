//! Shared data model for sitecheck
//!
//! Everything in this crate is plain data: discovered pages, declarative
//! checks, the expanded catalog, and run results. The harness crate owns all
//! I/O beyond reading page files.

pub mod catalog;
pub mod check;
pub mod error;
pub mod page;
pub mod report;

pub use catalog::{Catalog, ExpandedCheck};
pub use check::{Check, CheckKind, Predicate, Probe, Step, Target};
pub use error::{Error, Result};
pub use page::{Language, Page, PageSet};
pub use report::{CheckResult, RunReport, Status};
