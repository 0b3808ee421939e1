//! Chrome DevTools Protocol capture backend

use crate::capture::{CaptureEngine, ImageFormat};
use crate::document::{Document, LayoutReport, LayoutState, LAYOUT_STATE_PROBE};
use crate::{Error, RenderOptions, Result, Viewport};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often the layout progress is polled
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Quality used for lossy formats
const LOSSY_QUALITY: u32 = 90;

/// Headless Chrome backend (uses the `headless_chrome` crate)
///
/// Launches one Chrome process with a window the size of the canvas and
/// drives a single tab through it. Dropping the value kills the process.
pub struct CdpCapture {
    browser: Browser,
    tab: Arc<Tab>,
    viewport: Viewport,
}

impl CdpCapture {
    fn layout_state(&self) -> Result<LayoutState> {
        let eval = self
            .tab
            .evaluate(LAYOUT_STATE_PROBE, false)
            .map_err(|e| Error::LoadError(format!("Failed to read layout state: {}", e)))?;

        match eval.value {
            Some(serde_json::Value::String(raw)) => LayoutState::from_probe(&raw),
            _ => Ok(LayoutState::default()),
        }
    }
}

impl From<ImageFormat> for Page::CaptureScreenshotFormatOption {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => Page::CaptureScreenshotFormatOption::Png,
            ImageFormat::Jpeg => Page::CaptureScreenshotFormatOption::Jpeg,
            ImageFormat::Webp => Page::CaptureScreenshotFormatOption::Webp,
        }
    }
}

impl CaptureEngine for CdpCapture {
    fn launch(options: &RenderOptions) -> Result<Self>
    where
        Self: Sized,
    {
        let canvas = options.canvas;

        // Configure headless Chrome launch options
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(!options.disable_sandbox)
            .window_size(Some((canvas.width, canvas.height)))
            .path(options.browser_path.clone())
            .launch_timeout(Duration::from_millis(options.timeout_ms))
            .idle_browser_timeout(Duration::from_millis(options.timeout_ms))
            .args(vec![OsStr::new("--hide-scrollbars")])
            .build()
            .map_err(|e| Error::LaunchError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::LaunchError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::LaunchError(format!("Failed to create tab: {}", e)))?;

        debug!(
            "launched headless chrome ({}x{}, sandbox: {})",
            canvas.width, canvas.height, !options.disable_sandbox
        );

        Ok(Self {
            browser,
            tab,
            viewport: canvas,
        })
    }

    fn load_document(&mut self, document: &Document, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);

        self.tab
            .navigate_to(&document.data_url())
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        Ok(())
    }

    fn wait_for_layout(&mut self, timeout: Duration) -> Result<LayoutReport> {
        let started = Instant::now();
        loop {
            let state = self.layout_state()?;
            if let Some(err) = state.error {
                return Err(Error::LayoutError(err));
            }
            if state.done {
                debug!("layout finished after {:?}", started.elapsed());
                return Ok(state.into());
            }
            if started.elapsed() >= timeout {
                return Err(Error::Timeout(timeout.as_millis() as u64));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn resize(&mut self, viewport: Viewport, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);
        self.tab
            .call_method(Emulation::SetDeviceMetricsOverride {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: 1.0,
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
            })
            .map_err(|e| Error::CaptureError(format!("Failed to resize viewport: {}", e)))?;

        // The clip below still pins the captured area to exactly the canvas.
        self.viewport = viewport;
        Ok(())
    }

    fn capture(&mut self, format: ImageFormat, timeout: Duration) -> Result<Vec<u8>> {
        self.tab.set_default_timeout(timeout);

        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.viewport.width as f64,
            height: self.viewport.height as f64,
            scale: 1.0,
        };
        let quality = match format {
            ImageFormat::Png => None,
            ImageFormat::Jpeg | ImageFormat::Webp => Some(LOSSY_QUALITY),
        };

        self.tab
            .capture_screenshot(format.into(), quality, Some(clip), true)
            .map_err(|e| Error::CaptureError(format!("Screenshot failed: {}", e)))
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the child process.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
