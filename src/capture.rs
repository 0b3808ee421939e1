//! Capture orchestration: drive a rendering environment through one
//! load / layout / screenshot cycle and write the image to disk.

use crate::document::{Document, LayoutReport};
use crate::{Error, RenderOptions, Result, Viewport};
use log::{debug, warn};
use std::path::Path;
use std::time::{Duration, Instant};

/// Raster format of the captured image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Pick a format from the file extension. Unknown or missing extensions
    /// fall back to PNG.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("jpg") | Some("jpeg") => ImageFormat::Jpeg,
            Some("webp") => ImageFormat::Webp,
            _ => ImageFormat::Png,
        }
    }
}

/// A rendering environment able to lay out and capture a word-cloud document
///
/// Implementations own an external resource (typically a browser process).
/// [`capture_to_file`] guarantees `close` is called once `launch` succeeded;
/// implementations should additionally release the resource on `Drop` so a
/// panic does not leak it.
pub trait CaptureEngine {
    /// Start the rendering environment, giving up after `options.timeout_ms`
    fn launch(options: &RenderOptions) -> Result<Self>
    where
        Self: Sized;

    /// Load the document, giving up after `timeout`
    fn load_document(&mut self, document: &Document, timeout: Duration) -> Result<()>;

    /// Block until the page reports the layout finished, or `timeout` elapses
    fn wait_for_layout(&mut self, timeout: Duration) -> Result<LayoutReport>;

    /// Resize the visible area to the canvas
    fn resize(&mut self, viewport: Viewport, timeout: Duration) -> Result<()>;

    /// Capture the visible area as encoded image bytes
    fn capture(&mut self, format: ImageFormat, timeout: Duration) -> Result<Vec<u8>>;

    /// Shut the environment down
    fn close(self) -> Result<()>;
}

/// Run `f` against a freshly launched engine and close it afterwards,
/// whatever `f` returned.
///
/// If both `f` and `close` fail, the error from `f` is returned and the close
/// failure is logged.
pub fn with_session<C, T, F>(options: &RenderOptions, f: F) -> Result<T>
where
    C: CaptureEngine,
    F: FnOnce(&mut C) -> Result<T>,
{
    let mut engine = C::launch(options)?;
    let outcome = f(&mut engine);
    let closed = engine.close();

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("failed to close rendering environment after error: {}", close_err);
            Err(e)
        }
    }
}

/// Tracks the overall time budget of one capture.
struct Budget {
    deadline: Instant,
    total_ms: u64,
}

impl Budget {
    fn new(total_ms: u64) -> Self {
        let now = Instant::now();
        // Absurdly large budgets saturate to a day instead of overflowing.
        let deadline = now
            .checked_add(Duration::from_millis(total_ms))
            .unwrap_or(now + Duration::from_secs(24 * 60 * 60));
        Self { deadline, total_ms }
    }

    /// Time left, capped at `cap`. Errors once the budget is spent.
    fn remaining(&self, cap: Duration) -> Result<Duration> {
        let left = self.deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(Error::Timeout(self.total_ms));
        }
        Ok(left.min(cap))
    }
}

/// Launch `C`, render `document` and write the capture to `path`.
///
/// Every step after launch gets whatever is left of `options.timeout_ms`; a
/// launch that overruns the budget fails the first step with a timeout.
/// The file is written once, replacing whatever was there.
pub fn capture_to_file<C: CaptureEngine>(
    document: &Document,
    options: &RenderOptions,
    path: &Path,
) -> Result<LayoutReport> {
    let budget = Budget::new(options.timeout_ms);
    let format = ImageFormat::from_path(path);
    let layout_cap = Duration::from_millis(options.layout_timeout_ms);

    with_session::<C, _, _>(options, |engine| {
        engine.load_document(document, budget.remaining(Duration::MAX)?)?;
        debug!("document loaded");

        let report = engine.wait_for_layout(budget.remaining(layout_cap)?)?;
        if !report.dropped.is_empty() {
            warn!(
                "{} words did not fit on the {}x{} canvas: {}",
                report.dropped.len(),
                options.canvas.width,
                options.canvas.height,
                report.dropped.join(", ")
            );
        }

        engine.resize(options.canvas, budget.remaining(Duration::MAX)?)?;
        let bytes = engine.capture(format, budget.remaining(Duration::MAX)?)?;
        if bytes.is_empty() {
            return Err(Error::CaptureError("renderer returned an empty image".into()));
        }

        std::fs::write(path, &bytes).map_err(|source| Error::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("wrote {} bytes as {:?}", bytes.len(), format);
        Ok(report)
    })
}
