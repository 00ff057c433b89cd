//! Headless Chromium sessions over CDP

use super::error::BrowserError;
use super::intercept::{capture_first, wait_for_idle, NETWORK_QUIET_WINDOW};
use super::session::{
    BrowserLauncher, BrowserSession, InteractionScript, LaunchOptions, ResponseMatcher,
    SessionCookie,
};
use super::stealth::LAUNCH_FLAGS;
use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig, Page};
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Launches a local Chrome/Chromium per session
#[derive(Debug, Default, Clone)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    pub fn new() -> Self {
        Self
    }
}

/// Command-line arguments for a launch
pub fn launch_args(options: &LaunchOptions) -> Vec<String> {
    let mut args: Vec<String> = LAUNCH_FLAGS.iter().map(|flag| flag.to_string()).collect();
    if let Some(ref ua) = options.user_agent {
        args.push(format!("--user-agent={ua}"));
    }
    args.extend(options.extra_args.iter().cloned());
    args
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let mut builder = CdpBrowserConfig::builder();

        // chromiumoxide runs headless unless with_head() is set
        if !options.headless {
            builder = builder.with_head();
        }

        builder = builder
            .user_data_dir(&options.profile_dir)
            .window_size(options.window_width, options.window_height)
            .viewport(Viewport {
                width: options.window_width,
                height: options.window_height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .request_timeout(options.request_timeout);

        if let Some(ref path) = options.chrome_path {
            builder = builder.chrome_executable(path);
        }

        for arg in launch_args(options) {
            builder = builder.arg(arg);
        }

        let config = builder.build().map_err(|e| {
            BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
        })?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(BrowserError::LaunchFailed(format!("failed to open page: {e}")));
            }
        };

        debug!(profile = %options.profile_dir.display(), "browser launched");

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler,
            listener: None,
            tracker: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }))
    }
}

/// A launched browser and its single page
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    listener: Option<JoinHandle<()>>,
    /// Counts requests sent but not yet finished or failed
    tracker: Option<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl ChromeSession {
    /// Follow request lifecycles so `settle` can wait for the network to go quiet
    async fn track_in_flight(&mut self) -> Result<(), BrowserError> {
        if self.tracker.is_some() {
            return Ok(());
        }
        let mut sent = self.page.event_listener::<EventRequestWillBeSent>().await?;
        let mut finished = self.page.event_listener::<EventLoadingFinished>().await?;
        let mut failed = self.page.event_listener::<EventLoadingFailed>().await?;
        let in_flight = self.in_flight.clone();

        self.tracker = Some(tokio::spawn(async move {
            let mut pending: HashSet<String> = HashSet::new();
            loop {
                // A request is always sent before it finishes or fails
                tokio::select! {
                    biased;

                    Some(event) = sent.next() => {
                        pending.insert(event.request_id.inner().clone());
                    }
                    Some(event) = finished.next() => {
                        pending.remove(event.request_id.inner());
                    }
                    Some(event) = failed.next() => {
                        pending.remove(event.request_id.inner());
                    }
                    else => break,
                }
                in_flight.store(pending.len(), Ordering::SeqCst);
            }
        }));
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        for task in [self.listener.take(), self.tracker.take()].into_iter().flatten() {
            task.abort();
        }
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn install_init_script(&mut self, script: &str) -> Result<(), BrowserError> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .map_err(|e| BrowserError::InitScript(e.to_string()))?;
        Ok(())
    }

    async fn set_cookies(&mut self, cookies: &[SessionCookie]) -> Result<(), BrowserError> {
        let params = cookies
            .iter()
            .map(|cookie| {
                CookieParam::builder()
                    .name(cookie.name.clone())
                    .value(cookie.value.clone())
                    .domain(cookie.domain.clone())
                    .path(cookie.path.clone())
                    .build()
                    .map_err(BrowserError::InvalidCookie)
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.page.set_cookies(params).await?;
        Ok(())
    }

    async fn watch_responses(
        &mut self,
        matcher: ResponseMatcher,
    ) -> Result<oneshot::Receiver<Value>, BrowserError> {
        self.page.execute(EnableParams::default()).await?;
        let responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await?
            .map(|event| (event.request_id.clone(), event.response.url.clone()));
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await?
            .map(|event| event.request_id.clone());
        self.track_in_flight().await?;

        let page = self.page.clone();
        let (tx, rx) = oneshot::channel();

        let listener = tokio::spawn(async move {
            let read = |request_id: RequestId| {
                let page = page.clone();
                async move { read_json_body(&page, request_id).await }
            };
            if let Some(body) = capture_first(responses, finished, &matcher, read).await {
                let _ = tx.send(body);
            }
        });

        if let Some(previous) = self.listener.replace(listener) {
            previous.abort();
        }
        Ok(rx)
    }

    async fn settle(&mut self, max: Duration) -> Result<(), BrowserError> {
        if self.tracker.is_none() {
            tokio::time::sleep(max).await;
            return Ok(());
        }
        wait_for_idle(&self.in_flight, NETWORK_QUIET_WINDOW.min(max), max).await;
        debug!(
            in_flight = self.in_flight.load(Ordering::SeqCst),
            "network settled"
        );
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationFailed(format!("{url}: {e}"))),
            Err(_) => Err(BrowserError::Timeout(format!(
                "navigation to {url} exceeded {timeout:?}"
            ))),
        }
    }

    async fn interact(
        &mut self,
        script: &InteractionScript,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        let input = loop {
            match self.page.find_element(script.input_selector.as_str()).await {
                Ok(element) => break element,
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
                }
                Err(e) => {
                    return Err(BrowserError::ElementNotFound(format!(
                        "{}: {e}",
                        script.input_selector
                    )))
                }
            }
        };

        let failed = |e: chromiumoxide::error::CdpError| BrowserError::InteractionFailed(e.to_string());
        input.focus().await.map_err(failed)?;
        input
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(failed)?;
        input.type_str(&script.keyword).await.map_err(failed)?;
        input.press_key("Enter").await.map_err(failed)?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        let mut this = self;
        for task in [this.listener.take(), this.tracker.take()].into_iter().flatten() {
            task.abort();
        }
        let closed = this.browser.close().await;
        if let Err(e) = this.browser.wait().await {
            warn!(error = %e, "failed waiting for browser process");
        }
        this.handler.abort();
        closed?;
        Ok(())
    }
}

async fn read_json_body(page: &Page, request_id: RequestId) -> Result<Value, BrowserError> {
    let response = page.execute(GetResponseBodyParams::new(request_id)).await?;
    let body = &response.result;

    let text = if body.base64_encoded {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&body.body)
            .map_err(|e| BrowserError::ResponseUnreadable(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| BrowserError::ResponseUnreadable(e.to_string()))?
    } else {
        body.body.clone()
    };

    serde_json::from_str(&text).map_err(|e| BrowserError::ResponseUnreadable(e.to_string()))
}
