//! sitecheck harness
//!
//! Runtime half of sitecheck: serves the site tree over local HTTP, drives a
//! headless Chromium session, and executes the expanded check catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Runner                              │
//! │   ├── PageSet::discover(site_root)                     │
//! │   ├── Catalog::load_dir + expand  (fatal on typos)     │
//! │   ├── FixtureServer::start(root, port) -> base_url     │
//! │   ├── BrowserSession::launch() -> isolated PageHandles │
//! │   └── per check: static match | behavioral steps       │
//! │                         └── RunReport                  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Setup failures (port bind, engine launch) abort the run; individual check
//! failures are recorded and never interrupt sibling checks.

pub mod browser;
pub mod runner;
pub mod server;
pub mod wait;

pub use browser::{BrowserLaunchConfig, BrowserSession, PageHandle};
pub use runner::{Runner, RunnerConfig};
pub use server::FixtureServer;
