//! HTML document generation for the external cloud layout.
//!
//! The document is fully self-describing: the scaled words and every render
//! option are embedded as a single JSON object, the d3 and d3-cloud scripts are
//! loaded from [`LayoutScripts`], and the page publishes its progress on
//! `window.__rfcloud` so a capture backend can tell when drawing has finished.

use crate::scale::ScaledWord;
use crate::{RenderOptions, Result};
use base64::Engine as Base64Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Expression evaluated by capture backends to read the layout progress.
/// Returns a JSON string, or `null` before the page has initialized.
pub const LAYOUT_STATE_PROBE: &str = "JSON.stringify(window.__rfcloud || null)";

/// Where the layout library scripts are loaded from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutScripts {
    /// URL of d3 (v5 API: `d3.select`, `d3.schemeCategory10`)
    pub d3: String,
    /// URL of d3-cloud (`d3.layout.cloud`)
    pub cloud: String,
}

impl Default for LayoutScripts {
    fn default() -> Self {
        Self {
            d3: "https://cdn.jsdelivr.net/npm/d3@5".to_string(),
            cloud: "https://cdn.jsdelivr.net/npm/d3-cloud".to_string(),
        }
    }
}

/// Everything the in-page script needs, serialized as one object.
#[derive(Serialize)]
struct PageConfig<'a> {
    words: &'a [ScaledWord],
    width: u32,
    height: u32,
    padding: f64,
    font: &'a str,
    background: &'a str,
    rotations: &'a [f64],
    palette: Option<&'a [String]>,
    seed: Option<u32>,
}

/// A generated word-cloud page
#[derive(Debug, Clone)]
pub struct Document {
    html: String,
    words: Vec<ScaledWord>,
}

impl Document {
    /// Build the page for `words` with the given options.
    pub fn build(words: Vec<ScaledWord>, options: &RenderOptions) -> Result<Self> {
        let config = PageConfig {
            words: &words,
            width: options.canvas.width,
            height: options.canvas.height,
            padding: options.padding,
            font: &options.font,
            background: &options.background_color,
            rotations: &options.rotations,
            palette: options.palette.as_deref(),
            seed: options.seed,
        };

        let html = TEMPLATE
            .replace("{{D3_SRC}}", &attr_escape(&options.scripts.d3))
            .replace("{{CLOUD_SRC}}", &attr_escape(&options.scripts.cloud))
            .replace("{{D3_SRC_JSON}}", &attr_escape(&script_json(&options.scripts.d3)?))
            .replace("{{CLOUD_SRC_JSON}}", &attr_escape(&script_json(&options.scripts.cloud)?))
            .replace("{{CONFIG}}", &script_json(&config)?);

        Ok(Self { html, words })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// The scaled words embedded in this document
    pub fn words(&self) -> &[ScaledWord] {
        &self.words
    }

    /// `data:` URL that loads this document without touching the filesystem
    pub fn data_url(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(self.html.as_bytes());
        format!("data:text/html;charset=utf-8;base64,{}", b64)
    }

    /// Hex SHA-256 of the markup
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.html.as_bytes()))
    }
}

/// Serialize to JSON that is safe to embed in a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

fn attr_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Progress published by the page on `window.__rfcloud`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutState {
    pub done: bool,
    pub placed: usize,
    pub dropped: Vec<String>,
    pub error: Option<String>,
}

impl LayoutState {
    /// Parse the string returned by [`LAYOUT_STATE_PROBE`]. A page that has
    /// not initialized yet reads as the default (not done) state.
    pub fn from_probe(raw: &str) -> Result<Self> {
        let state: Option<LayoutState> = serde_json::from_str(raw)?;
        Ok(state.unwrap_or_default())
    }
}

/// What the layout engine reported once drawing finished
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutReport {
    /// Number of words placed on the canvas
    pub placed: usize,
    /// Words the layout could not fit
    pub dropped: Vec<String>,
}

impl From<LayoutState> for LayoutReport {
    fn from(state: LayoutState) -> Self {
        Self {
            placed: state.placed,
            dropped: state.dropped,
        }
    }
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Word Cloud</title>
<style>
html, body { margin: 0; padding: 0; overflow: hidden; }
svg { display: block; }
</style>
<script>
window.__rfcloud = { done: false, placed: 0, dropped: [], error: null };
window.addEventListener('error', function (event) {
    if (!window.__rfcloud.error) {
        window.__rfcloud.error = String(event.message || 'uncaught page error');
    }
});
</script>
<script src="{{D3_SRC}}" onerror="window.__rfcloud.error = 'failed to load ' + {{D3_SRC_JSON}}"></script>
<script src="{{CLOUD_SRC}}" onerror="window.__rfcloud.error = 'failed to load ' + {{CLOUD_SRC_JSON}}"></script>
</head>
<body>
<script>
(function () {
    var config = {{CONFIG}};
    var state = window.__rfcloud;
    if (state.error) return;
    if (typeof d3 === 'undefined' || !d3.layout || !d3.layout.cloud) {
        state.error = 'cloud layout library is not available';
        return;
    }

    document.body.style.background = config.background;
    document.body.style.width = config.width + 'px';
    document.body.style.height = config.height + 'px';

    var random = Math.random;
    if (config.seed !== null) {
        var s = config.seed >>> 0;
        random = function () {
            s = (s + 0x6D2B79F5) >>> 0;
            var t = s;
            t = Math.imul(t ^ (t >>> 15), t | 1);
            t ^= t + Math.imul(t ^ (t >>> 7), t | 61);
            return ((t ^ (t >>> 14)) >>> 0) / 4294967296;
        };
    }
    var palette = config.palette || d3.schemeCategory10;

    function draw(placed) {
        d3.select('body').append('svg')
            .attr('width', config.width)
            .attr('height', config.height)
            .append('g')
            .attr('transform', 'translate(' + config.width / 2 + ',' + config.height / 2 + ')')
            .selectAll('text')
            .data(placed)
            .enter().append('text')
            .style('font-size', function (d) { return d.size + 'px'; })
            .style('font-family', config.font)
            .style('fill', function (d, i) { return palette[i % palette.length]; })
            .attr('text-anchor', 'middle')
            .attr('transform', function (d) {
                return 'translate(' + [d.x, d.y] + ')rotate(' + d.rotate + ')';
            })
            .text(function (d) { return d.text; });

        var kept = {};
        placed.forEach(function (w) { kept[w.text] = true; });
        state.placed = placed.length;
        state.dropped = config.words
            .filter(function (w) { return !kept[w.text]; })
            .map(function (w) { return w.text; });
        state.done = true;
    }

    try {
        d3.layout.cloud()
            .size([config.width, config.height])
            .words(config.words.map(function (w) { return { text: w.text, size: w.size }; }))
            .padding(config.padding)
            .rotate(function () {
                return config.rotations[Math.floor(random() * config.rotations.length)];
            })
            .font(config.font)
            .fontSize(function (d) { return d.size; })
            .random(random)
            .on('end', draw)
            .start();
    } catch (e) {
        state.error = String(e);
    }
})();
</script>
</body>
</html>
"#;
