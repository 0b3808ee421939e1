//! End-to-end tests through headless Chrome.
//!
//! The layout library is replaced by small stub scripts served from a local
//! tiny_http server so these tests do not depend on the network, except
//! `test_generate_with_cdn_scripts` which uses the real d3-cloud.
#![cfg(feature = "cdp")]

use rfcloud::{ErrorKind, LayoutScripts, RenderOptions};
use tiny_http::{Header, Response, Server};

const STUB_D3: &str = r#"
(function () {
    var chain = {};
    ['append', 'attr', 'style', 'selectAll', 'data', 'enter', 'text'].forEach(function (k) {
        chain[k] = function () { return chain; };
    });
    window.d3 = {
        schemeCategory10: ['#1f77b4', '#ff7f0e'],
        select: function () { return chain; },
        layout: {}
    };
})();
"#;

/// Places every word except the last and fires "end" asynchronously.
const STUB_CLOUD: &str = r#"
d3.layout.cloud = function () {
    var words = [], handlers = {};
    var api = {};
    ['size', 'padding', 'rotate', 'font', 'fontSize', 'random'].forEach(function (k) {
        api[k] = function () { return api; };
    });
    api.words = function (w) { words = w; return api; };
    api.on = function (name, fn) { handlers[name] = fn; return api; };
    api.start = function () {
        var placed = words.slice(0, Math.max(words.length - 1, 0));
        setTimeout(function () { handlers.end(placed); }, 10);
        return api;
    };
    return api;
};
"#;

/// Never signals completion.
const STALLING_CLOUD: &str = r#"
d3.layout.cloud = function () {
    var api = {};
    ['size', 'words', 'padding', 'rotate', 'font', 'fontSize', 'random', 'on', 'start'].forEach(function (k) {
        api[k] = function () { return api; };
    });
    return api;
};
"#;

/// Serve the stub scripts; returns the base URL.
fn start_script_server() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let body = match request.url() {
                "/d3.js" => Some(STUB_D3),
                "/cloud.js" => Some(STUB_CLOUD),
                "/stall.js" => Some(STALLING_CLOUD),
                _ => None,
            };
            let resp = match body {
                Some(js) => Response::from_string(js).with_header(
                    "Content-Type: application/javascript"
                        .parse::<Header>()
                        .unwrap(),
                ),
                None => Response::from_string("Not Found").with_status_code(404),
            };
            let _ = request.respond(resp);
        }
    });

    base
}

fn options_with(base: &str, cloud: &str) -> RenderOptions {
    RenderOptions {
        disable_sandbox: true,
        scripts: LayoutScripts {
            d3: format!("{}/d3.js", base),
            cloud: format!("{}/{}", base, cloud),
        },
        layout_timeout_ms: 2000,
        timeout_ms: 20000,
        ..Default::default()
    }
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_generate_writes_png() {
    let base = start_script_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.png");

    let report = rfcloud::generate_with::<rfcloud::cdp::CdpCapture, _>(
        vec!["sun", "sun", "moon"],
        true,
        &out,
        &options_with(&base, "cloud.js"),
    )
    .expect("generate failed");

    assert_eq!(report.placed, 1);
    assert_eq!(report.dropped, vec!["moon".to_string()]);

    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"), "not a PNG");
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_stalled_layout_times_out() {
    let base = start_script_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("stalled.png");

    let started = std::time::Instant::now();
    let err = rfcloud::generate("a b c", true, &out, &options_with(&base, "stall.js")).unwrap_err();

    assert!(matches!(err, rfcloud::Error::Timeout(_)), "got {:?}", err);
    assert_eq!(err.kind(), ErrorKind::DocumentLoad);
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
    assert!(!out.exists());
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_missing_layout_script_is_layout_error() {
    let base = start_script_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing.png");

    let err = rfcloud::generate("a b", true, &out, &options_with(&base, "nope.js")).unwrap_err();
    assert!(matches!(err, rfcloud::Error::LayoutError(_)), "got {:?}", err);
    assert!(!out.exists());
}

#[test]
#[ignore] // Requires Chrome and network access to the d3 CDN
fn test_generate_with_cdn_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cloud.png");
    let options = RenderOptions {
        disable_sandbox: true,
        seed: Some(42),
        ..Default::default()
    };

    rfcloud::generate(vec!["sun", "sun", "moon"], true, &out, &options).expect("generate failed");
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_generate_async() {
    let base = start_script_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("async.png");

    let report = rfcloud::generate_async("alpha beta beta", true, out.clone(), options_with(&base, "cloud.js"))
        .await
        .expect("async generate failed");
    assert_eq!(report.placed, 1);
    assert!(out.exists());
}
