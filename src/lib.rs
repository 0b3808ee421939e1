//! RFox Word Cloud
//!
//! Renders word-frequency lists into word-cloud images. Words are tallied,
//! their frequencies log-scaled onto a font-size range, and the result is
//! handed to the d3-cloud layout inside a headless browser which draws the
//! cloud and captures it to an image file.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Pluggable capture**: any [`CaptureEngine`] can stand in for the browser
//! - **Bounded**: every wait on the browser has a timeout, and the browser is
//!   always torn down once launched
//!
//! # Example
//!
//! ```no_run
//! use rfcloud::{RenderOptions, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RenderOptions {
//!     canvas: Viewport { width: 1024, height: 512 },
//!     disable_sandbox: true,
//!     ..Default::default()
//! };
//!
//! rfcloud::generate(vec!["sun", "sun", "moon"], true, "cloud.png", &options)?;
//! # Ok(())
//! # }
//! ```

use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, ErrorKind, Result};

pub mod capture;
pub mod document;
pub mod input;
pub mod scale;

pub use capture::{CaptureEngine, ImageFormat};
pub use document::{Document, LayoutReport, LayoutScripts};
pub use input::{FrequencyEntry, FrequencyTable, Words};
pub use scale::{ScaledWord, SizeRange};

#[cfg(feature = "cdp")]
pub mod cdp;

// Async-friendly entry point (worker-thread backed)
#[cfg(feature = "cdp")]
pub mod async_api;

#[cfg(feature = "cdp")]
pub use async_api::generate as generate_async;

/// Output path used when the caller does not choose one
pub const DEFAULT_SAVE_PATH: &str = "wordcloud.png";

/// Options controlling how the cloud is sized, styled and captured
///
/// Every field has a default, and the struct deserializes from JSON with
/// missing fields taking those defaults:
///
/// ```
/// let opts: rfcloud::RenderOptions = serde_json::from_str(r#"{"font": "Georgia"}"#).unwrap();
/// assert_eq!(opts.font, "Georgia");
/// assert_eq!(opts.max_size, 100.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Font size of the least frequent word when normalizing
    pub min_size: f64,
    /// Font size of the most frequent word when normalizing
    pub max_size: f64,
    /// CSS background color of the page
    pub background_color: String,
    /// CSS font family used for measuring and drawing words
    pub font: String,
    /// Spacing around each word, in pixels
    pub padding: f64,
    /// Canvas (and captured image) dimensions
    pub canvas: Viewport,
    /// Explicit browser executable; `None` lets the backend locate one
    pub browser_path: Option<PathBuf>,
    /// Launch the browser without its sandbox (needed in many containers)
    pub disable_sandbox: bool,
    /// Rotation angles in degrees; each word picks one at random
    pub rotations: Vec<f64>,
    /// Colors cycled over placed words; `None` uses d3's category10 scheme
    pub palette: Option<Vec<String>>,
    /// Seed for the layout's random source; `None` is non-deterministic
    pub seed: Option<u32>,
    /// Script URLs for the layout library
    pub scripts: LayoutScripts,
    /// Maximum wait for the layout to signal completion, in milliseconds
    pub layout_timeout_ms: u64,
    /// Maximum duration of the whole capture, launch to teardown, in milliseconds
    pub timeout_ms: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            min_size: 10.0,
            max_size: 100.0,
            background_color: "#f0f0f0".to_string(),
            font: "Impact".to_string(),
            padding: 5.0,
            canvas: Viewport::default(),
            browser_path: None,
            disable_sandbox: false,
            rotations: vec![0.0, 90.0],
            palette: None,
            seed: None,
            scripts: LayoutScripts::default(),
            layout_timeout_ms: 10000,
            timeout_ms: 30000,
        }
    }
}

impl RenderOptions {
    pub fn size_range(&self) -> SizeRange {
        SizeRange {
            min: self.min_size,
            max: self.max_size,
        }
    }

    /// Reject options that cannot produce a sensible render.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(Error::ConfigError(msg));

        if !self.min_size.is_finite() || !self.max_size.is_finite() || self.min_size < 0.0 {
            return bad(format!(
                "sizes must be finite and non-negative (min {}, max {})",
                self.min_size, self.max_size
            ));
        }
        if self.min_size > self.max_size {
            return bad(format!(
                "min_size {} is larger than max_size {}",
                self.min_size, self.max_size
            ));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return bad(format!("padding must be finite and non-negative, got {}", self.padding));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return bad(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            ));
        }
        if self.rotations.is_empty() || self.rotations.iter().any(|r| !r.is_finite()) {
            return bad("rotations must be a non-empty set of finite angles".into());
        }
        if matches!(&self.palette, Some(p) if p.is_empty()) {
            return bad("palette must contain at least one color".into());
        }
        if self.layout_timeout_ms == 0 || self.timeout_ms == 0 {
            return bad("timeouts must be greater than zero".into());
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
        }
    }
}

/// Render `words` into an image at `save_path` using headless Chrome.
///
/// `words` may be text, a token list, a [`FrequencyTable`], or an untyped
/// `serde_json::Value`. With `normalize` the frequencies are log-scaled onto
/// `[min_size, max_size]`; without it they are used as font sizes directly.
#[cfg(feature = "cdp")]
pub fn generate<W>(
    words: W,
    normalize: bool,
    save_path: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<()>
where
    W: TryInto<Words>,
    Error: From<W::Error>,
{
    generate_with::<cdp::CdpCapture, W>(words, normalize, save_path, options).map(|_| ())
}

/// [`generate`] over an arbitrary capture backend, returning what the layout
/// reported.
///
/// Input and options are validated before the backend is launched.
pub fn generate_with<C, W>(
    words: W,
    normalize: bool,
    save_path: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<LayoutReport>
where
    C: CaptureEngine,
    W: TryInto<Words>,
    Error: From<W::Error>,
{
    let words: Words = words.try_into()?;
    options.validate()?;

    let table = words.into_table();
    let scaled = scale::scale(&table, normalize, options.size_range());
    debug!(
        "{} distinct words, {} to render (normalize: {})",
        table.len(),
        scaled.len(),
        normalize
    );

    let document = Document::build(scaled, options)?;
    debug!("document digest {}", document.digest());

    let save_path = save_path.as_ref();
    let report = capture::capture_to_file::<C>(&document, options, save_path)?;
    info!(
        "wrote {} ({} words placed, {} dropped)",
        save_path.display(),
        report.placed,
        report.dropped.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.min_size, 10.0);
        assert_eq!(options.max_size, 100.0);
        assert_eq!(options.background_color, "#f0f0f0");
        assert_eq!(options.font, "Impact");
        assert_eq!(options.padding, 5.0);
        assert_eq!(options.canvas, Viewport { width: 800, height: 400 });
        assert!(options.browser_path.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options() {
        let cases = [
            RenderOptions { min_size: 50.0, max_size: 10.0, ..Default::default() },
            RenderOptions { max_size: f64::NAN, ..Default::default() },
            RenderOptions { padding: -1.0, ..Default::default() },
            RenderOptions { canvas: Viewport { width: 0, height: 400 }, ..Default::default() },
            RenderOptions { rotations: vec![], ..Default::default() },
            RenderOptions { palette: Some(vec![]), ..Default::default() },
            RenderOptions { layout_timeout_ms: 0, ..Default::default() },
        ];
        for options in cases {
            let err = options.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{:?}", options);
        }
    }

    #[test]
    fn test_options_from_json() {
        let options: RenderOptions = serde_json::from_str(
            r#"{"canvas": {"width": 1024, "height": 512}, "seed": 9, "palette": ["red"]}"#,
        )
        .unwrap();
        assert_eq!(options.canvas.width, 1024);
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.palette, Some(vec!["red".to_string()]));
        assert_eq!(options.min_size, 10.0);

        assert!(serde_json::from_str::<RenderOptions>(r#"{"colour": "red"}"#).is_err());
    }
}
