use crate::{cdp, generate_with, Error, LayoutReport, RenderOptions, Result, Words};
use std::path::PathBuf;
use std::thread;
use tokio::sync::oneshot;

/// Async-friendly [`generate`](crate::generate), backed by a dedicated worker thread.
///
/// The browser session is blocking and not `Send`, so the whole pipeline runs
/// on its own thread and the result is delivered back over a oneshot channel.
/// Accepts the same inputs as the blocking call, including untyped
/// `serde_json::Value`s; an unsupported shape fails before a worker starts.
/// Dropping the returned future does not cancel the render; the worker still
/// finishes (bounded by `options.timeout_ms`) and tears the browser down.
pub async fn generate<W>(
    words: W,
    normalize: bool,
    save_path: impl Into<PathBuf>,
    options: RenderOptions,
) -> Result<LayoutReport>
where
    W: TryInto<Words>,
    Error: From<W::Error>,
{
    let words: Words = words.try_into()?;
    let save_path = save_path.into();
    let (tx, rx) = oneshot::channel();

    thread::Builder::new()
        .name("rfcloud-render".into())
        .spawn(move || {
            let res = generate_with::<cdp::CdpCapture, Words>(words, normalize, &save_path, &options);
            let _ = tx.send(res);
        })
        .map_err(|e| Error::LaunchError(format!("Failed to spawn render worker: {}", e)))?;

    rx.await
        .map_err(|e| Error::LaunchError(format!("Render worker canceled: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_options_fail_before_launch() {
        let options = RenderOptions {
            min_size: 20.0,
            max_size: 5.0,
            browser_path: Some("/nonexistent/chrome-binary".into()),
            ..Default::default()
        };
        let err = generate("a b", true, "unused.png", options).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[tokio::test]
    async fn json_input_is_checked_before_the_worker_starts() {
        let options = RenderOptions {
            browser_path: Some("/nonexistent/chrome-binary".into()),
            ..Default::default()
        };
        let err = generate(serde_json::json!(42), true, "unused.png", options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInputType(_)), "got {:?}", err);
    }
}
