//! One-shot browser runs with guaranteed teardown

use super::cookies::parse_cookie_string;
use super::error::BrowserError;
use super::session::{
    BrowserLauncher, BrowserSession, InteractionScript, LaunchOptions, ResponseMatcher,
};
use super::stealth::STEALTH_SCRIPT;
use crate::config::BrowserSettings;
use crate::providers::RequestSpec;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn};

const PROFILE_PREFIX: &str = "multisearch-profile-";

/// Runs the automated transport: every call gets its own browser process and
/// profile directory, both released before `run` returns
#[derive(Clone)]
pub struct SessionRunner {
    launcher: Arc<dyn BrowserLauncher>,
    settings: BrowserSettings,
}

impl SessionRunner {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: BrowserSettings) -> Self {
        Self { launcher, settings }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Capture the first accepted response matching `matcher`, or fail
    pub async fn run(
        &self,
        request: &RequestSpec,
        interaction: Option<&InteractionScript>,
        matcher: &ResponseMatcher,
        timeout: Duration,
    ) -> Result<Value, BrowserError> {
        let start = Instant::now();
        let profile = tempfile::Builder::new()
            .prefix(PROFILE_PREFIX)
            .tempdir()?;
        let options = self.launch_options(request, profile.path());

        let outcome = match self.launcher.launch(&options).await {
            Ok(mut session) => {
                let outcome = self
                    .drive(session.as_mut(), request, interaction, matcher, timeout)
                    .await;
                if let Err(e) = session.close().await {
                    warn!(error = %e, "browser did not shut down cleanly");
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let profile_path = profile.path().to_path_buf();
        if let Err(e) = profile.close() {
            warn!(path = %profile_path.display(), error = %e, "failed to remove browser profile");
        }

        match &outcome {
            Ok(_) => info!(
                url = %request.url,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "captured in-page response"
            ),
            Err(e) => warn!(
                url = %request.url,
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "browser run failed"
            ),
        }
        outcome
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        request: &RequestSpec,
        interaction: Option<&InteractionScript>,
        matcher: &ResponseMatcher,
        timeout: Duration,
    ) -> Result<Value, BrowserError> {
        // Must precede navigation so the overrides exist before page scripts run
        session.install_init_script(STEALTH_SCRIPT).await?;

        if let Some(raw) = request.cookies.as_deref() {
            let cookies = parse_cookie_string(raw, &request.url);
            if !cookies.is_empty() {
                debug!(count = cookies.len(), "replaying session cookies");
                session.set_cookies(&cookies).await?;
            }
        }

        let mut pending = session.watch_responses(matcher.clone()).await?;

        session
            .navigate(&request.url, self.settings.navigation_timeout())
            .await?;
        session.settle(self.settings.settle_delay()).await?;

        match pending.try_recv() {
            Ok(payload) => {
                debug!("response arrived during navigation");
                return Ok(payload);
            }
            Err(TryRecvError::Closed) => return Err(BrowserError::ListenerClosed),
            Err(TryRecvError::Empty) => {}
        }

        if let Some(script) = interaction {
            debug!(selector = %script.input_selector, "navigation was not enough, typing query");
            session.interact(script, timeout).await?;
        }

        match tokio::time::timeout(timeout, pending).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(_)) => Err(BrowserError::ListenerClosed),
            Err(_) => Err(BrowserError::Timeout(format!(
                "no response matching {matcher} within {timeout:?}"
            ))),
        }
    }

    fn launch_options(&self, request: &RequestSpec, profile_dir: &Path) -> LaunchOptions {
        LaunchOptions {
            profile_dir: profile_dir.to_path_buf(),
            chrome_path: self.settings.chrome_path.clone(),
            headless: self.settings.headless,
            user_agent: request.header_value("User-Agent").map(str::to_string),
            window_width: self.settings.window_width,
            window_height: self.settings.window_height,
            request_timeout: self.settings.navigation_timeout(),
            extra_args: self.settings.extra_args.clone(),
        }
    }
}
