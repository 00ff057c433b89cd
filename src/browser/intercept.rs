//! Network event bookkeeping shared by CDP sessions
//!
//! Kept free of chromiumoxide types so the event ordering rules can be tested
//! with plain streams.

use super::error::BrowserError;
use super::session::ResponseMatcher;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Finished request ids remembered while their response event is still pending
const EARLY_FINISH_CAPACITY: usize = 256;

/// How long the page must stay without in-flight requests to count as idle
pub const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait for the first matching response whose body the matcher accepts
///
/// `responses` yields `(request id, url)` per received response and `finished`
/// yields the id of every request whose body is complete. A body is read once
/// both events for a matching id have been seen, in either order. Returns
/// `None` when both streams end first.
pub async fn capture_first<Id, R, F, B, Fut>(
    mut responses: R,
    mut finished: F,
    matcher: &ResponseMatcher,
    mut read_body: B,
) -> Option<Value>
where
    Id: PartialEq,
    R: Stream<Item = (Id, String)> + Unpin,
    F: Stream<Item = Id> + Unpin,
    B: FnMut(Id) -> Fut,
    Fut: Future<Output = Result<Value, BrowserError>>,
{
    let mut matched: Vec<Id> = Vec::new();
    let mut finished_early: VecDeque<Id> = VecDeque::new();

    loop {
        let ready = tokio::select! {
            biased;

            Some((id, url)) = responses.next() => {
                if !matcher.matches(&url) {
                    continue;
                }
                debug!(url = %url, "matched response");
                match finished_early.iter().position(|done| *done == id) {
                    Some(pos) => {
                        finished_early.remove(pos);
                        id
                    }
                    None => {
                        matched.push(id);
                        continue;
                    }
                }
            }
            Some(id) = finished.next() => {
                match matched.iter().position(|m| *m == id) {
                    Some(pos) => matched.swap_remove(pos),
                    None => {
                        if finished_early.len() == EARLY_FINISH_CAPACITY {
                            finished_early.pop_front();
                        }
                        finished_early.push_back(id);
                        continue;
                    }
                }
            }
            else => return None,
        };

        match read_body(ready).await {
            Ok(body) if matcher.accepts(&body) => return Some(body),
            Ok(_) => debug!("matched response carried an error payload"),
            Err(e) => warn!(error = %e, "failed to read matched response"),
        }
    }
}

/// Wait until no request has been in flight for `quiet`, or `max` has passed
pub async fn wait_for_idle(in_flight: &AtomicUsize, quiet: Duration, max: Duration) {
    let deadline = Instant::now() + max;
    let mut idle_since: Option<Instant> = None;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        if in_flight.load(Ordering::SeqCst) == 0 {
            let since = *idle_since.get_or_insert(now);
            if now.duration_since(since) >= quiet {
                return;
            }
        } else {
            idle_since = None;
        }
        tokio::time::sleep(IDLE_POLL_INTERVAL.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::stream;
    use serde_json::json;
    use std::sync::Arc;

    const API_URL: &str = "https://www.zhihu.com/api/v4/search_v3?q=rust";

    fn matcher() -> ResponseMatcher {
        ResponseMatcher::new(r"api/v4/search_v3\?").unwrap()
    }

    async fn body_for(id: u32) -> Result<Value, BrowserError> {
        Ok(json!({ "data": [], "id": id }))
    }

    #[tokio::test]
    async fn test_both_events_buffered_before_polling() {
        for _ in 0..200 {
            let (response_tx, responses) = mpsc::unbounded();
            let (finished_tx, finished) = mpsc::unbounded();
            response_tx.unbounded_send((7u32, API_URL.to_string())).unwrap();
            finished_tx.unbounded_send(7u32).unwrap();
            drop(response_tx);
            drop(finished_tx);

            let body = capture_first(responses, finished, &matcher(), body_for).await;
            assert_eq!(body, Some(json!({ "data": [], "id": 7 })));
        }
    }

    #[tokio::test]
    async fn test_finish_seen_before_response() {
        let (response_tx, responses) = mpsc::unbounded();
        let finished = stream::iter(vec![3u32, 7]);

        let capture = tokio::spawn(async move {
            capture_first(responses, finished, &matcher(), body_for).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        response_tx
            .unbounded_send((3u32, "https://static.zhimg.com/app.js".to_string()))
            .unwrap();
        response_tx.unbounded_send((7u32, API_URL.to_string())).unwrap();

        assert_eq!(capture.await.unwrap(), Some(json!({ "data": [], "id": 7 })));
    }

    #[tokio::test]
    async fn test_error_payload_keeps_waiting() {
        let responses = stream::iter(vec![(1u32, API_URL.to_string()), (2, API_URL.to_string())]);
        let finished = stream::iter(vec![1u32, 2]);
        let read = |id: u32| async move {
            if id == 1 {
                Ok(json!({ "error": { "code": 10003 } }))
            } else {
                body_for(id).await
            }
        };

        let body = capture_first(responses, finished, &matcher(), read).await;
        assert_eq!(body, Some(json!({ "data": [], "id": 2 })));
    }

    #[tokio::test]
    async fn test_streams_ending_without_match() {
        let responses = stream::iter(vec![(1u32, "https://www.zhihu.com/".to_string())]);
        let finished = stream::iter(vec![1u32]);
        assert_eq!(capture_first(responses, finished, &matcher(), body_for).await, None);
    }

    #[tokio::test]
    async fn test_wait_for_idle_returns_once_quiet() {
        let in_flight = AtomicUsize::new(0);
        let start = std::time::Instant::now();
        wait_for_idle(&in_flight, Duration::from_millis(50), Duration::from_secs(5)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_wait_for_idle_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(2));
        let start = std::time::Instant::now();
        wait_for_idle(&in_flight, Duration::from_millis(50), Duration::from_millis(150)).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_wait_for_idle_follows_requests_finishing() {
        let in_flight = Arc::new(AtomicUsize::new(1));
        let counter = in_flight.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            counter.store(0, Ordering::SeqCst);
        });

        let start = std::time::Instant::now();
        wait_for_idle(&in_flight, Duration::from_millis(50), Duration::from_secs(5)).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(2));
    }
}
