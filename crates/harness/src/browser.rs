//! Browser session management over the Chrome DevTools Protocol
//!
//! One headless Chromium process serves the whole run; every check gets a
//! fresh `PageHandle` whose origin storage is wiped before use, so theme and
//! language state cannot leak between checks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::storage::ClearDataForOriginParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use sitecheck_common::check::{Axis, Probe};
use sitecheck_common::{Error, Result};

/// Launch options for the headless engine.
#[derive(Debug, Clone)]
pub struct BrowserLaunchConfig {
    pub window_width: u32,
    pub window_height: u32,

    /// Budget for the engine process to come up and attach.
    pub launch_timeout: Duration,

    /// Explicit Chrome/Chromium binary; `None` lets chromiumoxide detect one.
    pub executable: Option<PathBuf>,
}

impl Default for BrowserLaunchConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            launch_timeout: Duration::from_secs(30),
            executable: None,
        }
    }
}

/// Owns the browser process and the CDP event handler task.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch headless Chromium. A missing binary or a hung launch surfaces
    /// as `EngineLaunch`, which is fatal for the run.
    pub async fn launch(config: BrowserLaunchConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.window_width, config.window_height)
            .no_sandbox();
        if let Some(exe) = &config.executable {
            builder = builder.chrome_executable(exe);
        }
        let browser_config = builder.build().map_err(Error::EngineLaunch)?;

        let (browser, mut handler) =
            match tokio::time::timeout(config.launch_timeout, Browser::launch(browser_config))
                .await
            {
                Ok(Ok(pair)) => pair,
                Ok(Err(e)) => return Err(Error::EngineLaunch(e.to_string())),
                Err(_) => {
                    return Err(Error::EngineLaunch(format!(
                        "engine did not come up within {:?}",
                        config.launch_timeout
                    )))
                }
            };

        // The handler stream must be driven for the whole session lifetime.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Browser engine launched");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a fresh page for one check, with the fixture origin's storage
    /// cleared. The handle is exclusively owned by that check.
    pub async fn new_page(&self, base_url: &str) -> Result<PageHandle> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(to_browser_err)?;

        let handle = PageHandle {
            page,
            base_url: base_url.trim_end_matches('/').to_string(),
        };
        handle.clear_origin_storage().await?;
        Ok(handle)
    }

    /// Shut the engine down, tolerant of pages left open.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.map_err(to_browser_err)?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        info!("Browser engine closed");
        Ok(())
    }
}

/// An isolated page context, owned by exactly one in-flight check.
pub struct PageHandle {
    page: Page,
    base_url: String,
}

impl PageHandle {
    /// Wipe cookies and storage for the fixture origin.
    async fn clear_origin_storage(&self) -> Result<()> {
        let params = ClearDataForOriginParams::builder()
            .origin(self.base_url.clone())
            .storage_types("all")
            .build()
            .map_err(Error::Browser)?;
        self.page.execute(params).await.map_err(to_browser_err)?;
        Ok(())
    }

    /// Navigate to a page path relative to the fixture origin.
    pub async fn navigate(&self, path: &str) -> Result<()> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("navigate {}", url);
        self.page.goto(url).await.map_err(to_browser_err)?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(to_browser_err)?;
        Ok(())
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(to_browser_err)?;
        element.click().await.map_err(to_browser_err)?;
        Ok(())
    }

    /// Focus an element and press a key on it.
    pub async fn press_key(&self, selector: &str, key: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(to_browser_err)?;
        element.focus().await.map_err(to_browser_err)?;
        element.press_key(key).await.map_err(to_browser_err)?;
        Ok(())
    }

    pub async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(to_browser_err)?;
        element.scroll_into_view().await.map_err(to_browser_err)?;
        Ok(())
    }

    /// Evaluate a probe and return its observed JSON value.
    pub async fn probe(&self, probe: &Probe) -> Result<serde_json::Value> {
        let js = probe_js(probe);
        self.page
            .evaluate(js)
            .await
            .map_err(to_browser_err)?
            .into_value()
            .map_err(|e| Error::Browser(e.to_string()))
    }

    /// Capture a full-page screenshot, used as the failure artifact.
    pub async fn screenshot(&self, output: &Path) -> Result<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), output)
            .await
            .map_err(to_browser_err)?;
        Ok(())
    }

    /// Return the handle to the session for disposal.
    pub async fn close(self) {
        let _ = self.page.close().await;
    }
}

fn to_browser_err(e: chromiumoxide::error::CdpError) -> Error {
    Error::Browser(e.to_string())
}

/// Build the JavaScript expression for a probe.
///
/// Every expression yields JSON: a missing element probes as `null`, and an
/// empty `src`-style attribute is normalized to `null` so "absent" predicates
/// cover both spellings of an unset attribute.
pub fn probe_js(probe: &Probe) -> String {
    match probe {
        Probe::Attribute {
            selector,
            name,
            equals_attribute: None,
        } => format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
             const v = el.getAttribute({name}); return v === '' ? null : v; }})()",
            sel = js_str(selector),
            name = js_str(name),
        ),
        Probe::Attribute {
            selector,
            name,
            equals_attribute: Some(other),
        } => format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
             return el.getAttribute({name}) === el.getAttribute({other}); }})()",
            sel = js_str(selector),
            name = js_str(name),
            other = js_str(other),
        ),
        Probe::ClassContains { selector, class } => format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? el.classList.contains({class}) : null; }})()",
            sel = js_str(selector),
            class = js_str(class),
        ),
        Probe::Text { selector } => format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? el.innerText.trim() : null; }})()",
            sel = js_str(selector),
        ),
        Probe::ComputedStyle { selector, property } => format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? getComputedStyle(el).getPropertyValue({prop}) : null; }})()",
            sel = js_str(selector),
            prop = js_str(property),
        ),
        Probe::ScrollOffset { selector, axis } => {
            let field = match axis {
                Axis::X => "scrollLeft",
                Axis::Y => "scrollTop",
            };
            format!(
                "(() => {{ const el = document.querySelector({sel}); \
                 return el ? el.{field} : null; }})()",
                sel = js_str(selector),
            )
        }
        Probe::Storage { key } => format!(
            "window.localStorage.getItem({key})",
            key = js_str(key),
        ),
        Probe::Global { name } => format!(
            "typeof window[{name}]",
            name = js_str(name),
        ),
    }
}

/// JSON-encode a string so it is safe to splice into JavaScript.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).expect("strings always serialize")
}
