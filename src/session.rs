//! Scoped headless Chromium session.
//!
//! The pipeline talks to the browser only through [`DiagramPage`], so the
//! export logic can be exercised without launching Chromium.

use crate::error::{ExportError, Result};
use crate::geometry::{BoundingBox, Canvas, RasterViewport};
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::protocol::cdp::DOM;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Interval between network-idle checks.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra Chromium flags for running headless inside containers.
const CHROME_ARGS: [&str; 3] = ["--no-sandbox", "--disable-setuid-sandbox", "--disable-gpu"];

/// Browser-side operations the export pipeline depends on.
#[cfg_attr(test, mockall::automock)]
pub trait DiagramPage {
    /// Navigates to `url` and blocks until the network has gone quiet.
    fn open(&self, url: &str) -> Result<()>;

    /// Blocks until `selector` matches an element.
    fn wait_for_selector(&self, selector: &str) -> Result<()>;

    /// Freezes the diagram, re-origins it around its content box padded by
    /// `padding`, and clears the page background. Returns the raw content box.
    fn fit_to_content(&self, selector: &str, padding: f64) -> Result<BoundingBox>;

    /// Prints the page to a single-page PDF sized to `canvas`.
    fn print_pdf(&self, canvas: &Canvas) -> Result<Vec<u8>>;

    /// Captures the element matched by `selector` as a transparent PNG.
    fn capture_png(&self, selector: &str, viewport: &RasterViewport) -> Result<Vec<u8>>;
}

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Explicit Chromium executable; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    /// Upper bound for the network-idle wait after navigation.
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// A running headless browser and the single tab used for the export.
///
/// Dropping the session kills the browser process; [`BrowserSession::close`]
/// does the same explicitly so the release shows up in the logs.
pub struct BrowserSession {
    browser: Browser,
    tab: Arc<Tab>,
    idle_timeout: Duration,
}

impl BrowserSession {
    /// Launches Chromium and opens a fresh tab.
    pub fn launch(config: &SessionConfig) -> Result<Self> {
        let args: Vec<&OsStr> = CHROME_ARGS.iter().map(OsStr::new).collect();
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(config.chrome_path.clone())
            .args(args)
            .build()
            .map_err(|e| ExportError::BrowserLaunch(e.to_string()))?;

        let browser =
            Browser::new(options).map_err(|e| ExportError::BrowserLaunch(format!("{:#}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ExportError::BrowserLaunch(format!("{:#}", e)))?;

        info!("Browser session started");
        Ok(Self {
            browser,
            tab,
            idle_timeout: config.idle_timeout,
        })
    }

    /// Acquires a session, runs `f` against it, and releases the session on
    /// every exit path.
    pub fn scoped<T>(config: &SessionConfig, f: impl FnOnce(&BrowserSession) -> Result<T>) -> Result<T> {
        let session = Self::launch(config)?;
        let result = f(&session);
        session.close();
        result
    }

    /// Shuts the browser down.
    pub fn close(self) {
        if let Err(e) = self.tab.close(false) {
            debug!("Tab close failed during shutdown: {:#}", e);
        }
        drop(self.browser);
        info!("Browser session closed");
    }

    /// OS process id of the browser, if it is still tracked.
    pub fn process_id(&self) -> Option<u32> {
        self.browser.get_process_id()
    }

    /// Navigates and blocks until the main frame reports `networkIdle`
    /// (no connections in flight for 500 ms), bounded by the idle timeout.
    fn navigate_until_idle(&self, url: &str) -> Result<()> {
        let watch = Arc::new(Mutex::new(IdleWatch::default()));
        let main_frame = self.tab.get_target_id().clone();

        let listener = {
            let watch = Arc::clone(&watch);
            move |event: &Event| {
                if let Event::PageLifecycleEvent(lifecycle) = event {
                    if lifecycle.params.frame_id == main_frame {
                        if let Ok(mut watch) = watch.lock() {
                            watch.observe(&lifecycle.params.name);
                        }
                    }
                }
            }
        };

        self.tab
            .call_method(Page::SetLifecycleEventsEnabled { enabled: true })
            .map_err(|e| ExportError::Navigation(format!("{:#}", e)))?;
        let handle = self
            .tab
            .add_event_listener(Arc::new(listener))
            .map_err(|e| ExportError::Navigation(format!("{:#}", e)))?;

        let result = self.navigate_and_wait(url, &watch);

        if let Err(e) = self.tab.remove_event_listener(&handle) {
            debug!("Removing lifecycle listener failed: {:#}", e);
        }
        result
    }

    fn navigate_and_wait(&self, url: &str, watch: &Mutex<IdleWatch>) -> Result<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| ExportError::Navigation(format!("{:#}", e)))?;

        let deadline = Instant::now() + self.idle_timeout;
        loop {
            let idle = watch.lock().map(|w| w.is_idle()).unwrap_or(false);
            if idle {
                debug!("Network idle");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ExportError::Navigation(format!(
                    "page did not reach network idle within {:?}",
                    self.idle_timeout
                )));
            }
            std::thread::sleep(IDLE_POLL_INTERVAL);
        }
    }
}

/// Tracks main-frame lifecycle events for one navigation.
///
/// `init` starts a new document and clears any earlier idle state; the
/// browser emits `networkIdle` once no request has been in flight for 500 ms.
#[derive(Debug, Default)]
struct IdleWatch {
    document_started: bool,
    idle: bool,
}

impl IdleWatch {
    fn observe(&mut self, name: &str) {
        match name {
            "init" => {
                self.document_started = true;
                self.idle = false;
            }
            "networkIdle" if self.document_started => self.idle = true,
            _ => {}
        }
    }

    fn is_idle(&self) -> bool {
        self.idle
    }
}

impl DiagramPage for BrowserSession {
    fn open(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.navigate_until_idle(url)
    }

    fn wait_for_selector(&self, selector: &str) -> Result<()> {
        self.tab
            .wait_for_element(selector)
            .map(|_| ())
            .map_err(|e| ExportError::SelectorTimeout {
                selector: selector.to_string(),
                message: format!("{:#}", e),
            })
    }

    fn fit_to_content(&self, selector: &str, padding: f64) -> Result<BoundingBox> {
        let script = fit_script(selector, padding)?;
        let result = self
            .tab
            .evaluate(&script, false)
            .map_err(|e| ExportError::Measurement(format!("{:#}", e)))?;

        let json = result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ExportError::Measurement(format!("element `{}` not found in page", selector))
            })?;
        let bbox: BoundingBox = serde_json::from_str(json)
            .map_err(|e| ExportError::Measurement(format!("unexpected bounding box {json}: {e}")))?;

        debug!(
            x = bbox.x,
            y = bbox.y,
            width = bbox.width,
            height = bbox.height,
            "Measured content box"
        );
        Ok(bbox)
    }

    fn print_pdf(&self, canvas: &Canvas) -> Result<Vec<u8>> {
        let (paper_width, paper_height) = canvas.paper_size_inches();
        let options = PrintToPdfOptions {
            print_background: Some(true),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            page_ranges: Some("1".to_string()),
            ..Default::default()
        };

        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| ExportError::Render(format!("{:#}", e)))
    }

    fn capture_png(&self, selector: &str, viewport: &RasterViewport) -> Result<Vec<u8>> {
        self.tab
            .call_method(device_metrics(viewport))
            .map_err(|e| ExportError::Render(format!("{:#}", e)))?;

        if let Err(e) = self.tab.call_method(Emulation::SetDefaultBackgroundColorOverride {
            color: Some(DOM::RGBA {
                r: 0,
                g: 0,
                b: 0,
                a: Some(0.0),
            }),
        }) {
            warn!("Transparent background override rejected: {:#}", e);
        }

        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| ExportError::Render(format!("{:#}", e)))?;
        element
            .capture_screenshot(CaptureScreenshotFormatOption::Png)
            .map_err(|e| ExportError::Render(format!("{:#}", e)))
    }
}

/// Desktop device metrics sized to the raster viewport.
fn device_metrics(viewport: &RasterViewport) -> Emulation::SetDeviceMetricsOverride {
    Emulation::SetDeviceMetricsOverride {
        width: viewport.width,
        height: viewport.height,
        device_scale_factor: viewport.device_scale_factor,
        mobile: false,
        scale: None,
        screen_width: None,
        screen_height: None,
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    }
}

/// Builds the in-page fit script. The whole mutation runs as one evaluation;
/// it yields the raw `getBBox()` as a JSON string, or `null` when the element
/// is missing.
fn fit_script(selector: &str, padding: f64) -> Result<String> {
    let selector = serde_json::to_string(selector)
        .map_err(|e| ExportError::Measurement(e.to_string()))?;
    Ok(format!(
        r#"(() => {{
  const svg = document.querySelector({selector});
  if (!svg) return null;
  svg.style.transition = "none";
  const box = svg.getBBox();
  const padding = {padding};
  const width = box.width + padding * 2;
  const height = box.height + padding * 2;
  svg.setAttribute("viewBox", `${{box.x - padding}} ${{box.y - padding}} ${{width}} ${{height}}`);
  svg.style.width = `${{width}}px`;
  svg.style.height = `${{height}}px`;
  document.body.style.background = "transparent";
  document.body.style.margin = "0";
  document.body.style.padding = "0";
  return JSON.stringify({{ x: box.x, y: box.y, width: box.width, height: box.height }});
}})()"#
    ))
}
