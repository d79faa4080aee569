use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::{BrowserPage, FrameRef};
use crate::error::ScrapeError;

/// One pass over every frame, returning the first that contains `selector`.
///
/// Lookup errors are treated as "not present": during a postback the frames
/// are torn down and scripts fail until the new documents load.
pub async fn find_frame(page: &dyn BrowserPage, selector: &str) -> Option<FrameRef> {
    find_in_any(page, |frame| async move {
        Ok(page.exists(frame, selector).await?.then_some(()))
    })
    .await
    .map(|(frame, ())| frame)
}

/// Runs a read-only `check` against each frame in order and returns the
/// first frame where it yields a value. Check errors count as misses.
pub async fn find_in_any<T, F, Fut>(page: &dyn BrowserPage, mut check: F) -> Option<(FrameRef, T)>
where
    F: FnMut(FrameRef) -> Fut,
    Fut: Future<Output = Result<Option<T>, ScrapeError>>,
{
    let frames = page.frames().await.ok()?;
    for frame in frames {
        match check(frame).await {
            Ok(Some(value)) => return Some((frame, value)),
            Ok(None) => {}
            Err(e) => tracing::debug!(frame = frame.0, error = %e, "frame check failed"),
        }
    }
    None
}

/// Polls all frames for `selector` until it appears or `timeout` elapses.
///
/// # Errors
///
/// Returns [`ScrapeError::ElementNotFound`] when the deadline passes.
pub async fn locate(
    page: &dyn BrowserPage,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<FrameRef, ScrapeError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(frame) = find_frame(page, selector).await {
            return Ok(frame);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(ScrapeError::ElementNotFound {
                selector: selector.to_owned(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}
