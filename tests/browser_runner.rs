//! Integration tests for the one-shot browser runner.
//!
//! A scripted launcher stands in for Chromium so the session protocol and the
//! teardown guarantees can be checked without a browser binary.

use async_trait::async_trait;
use multisearch_rs::browser::{
    BrowserError, BrowserLauncher, BrowserSession, InteractionScript, LaunchOptions,
    ResponseMatcher, SessionCookie, SessionRunner, STEALTH_SCRIPT,
};
use multisearch_rs::config::BrowserSettings;
use multisearch_rs::providers::zhihu::{ZhihuWeb, SEARCH_API_PATTERN};
use multisearch_rs::providers::{Provider, ProviderName, RequestSpec};
use multisearch_rs::SearchQuery;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Launch,
    InitScript,
    Cookies,
    Watch,
    Navigate,
    Settle,
    Interact,
}

/// When the fake page fires its API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Never,
    OnNavigate,
    OnInteract,
}

/// What the fake browser saw, shared with the test
#[derive(Default)]
struct Journal {
    launched: AtomicUsize,
    closed: AtomicUsize,
    profiles: Mutex<Vec<(PathBuf, bool)>>,
    user_agent: Mutex<Option<String>>,
    steps: Mutex<Vec<Step>>,
    cookies: Mutex<Vec<SessionCookie>>,
    init_script: Mutex<Option<String>>,
    settle_max: Mutex<Option<Duration>>,
}

impl Journal {
    fn steps(&self) -> Vec<Step> {
        self.steps.lock().unwrap().clone()
    }

    fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn profile(&self) -> (PathBuf, bool) {
        self.profiles.lock().unwrap()[0].clone()
    }
}

struct FakeLauncher {
    journal: Arc<Journal>,
    fail_at: Option<Step>,
    delivery: Delivery,
    payload: Value,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.journal
            .profiles
            .lock()
            .unwrap()
            .push((options.profile_dir.clone(), options.profile_dir.is_dir()));
        *self.journal.user_agent.lock().unwrap() = options.user_agent.clone();

        if self.fail_at == Some(Step::Launch) {
            return Err(BrowserError::LaunchFailed("no chrome here".into()));
        }
        self.journal.launched.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(FakeSession {
            journal: self.journal.clone(),
            fail_at: self.fail_at,
            delivery: self.delivery,
            payload: self.payload.clone(),
            sender: None,
        }))
    }
}

struct FakeSession {
    journal: Arc<Journal>,
    fail_at: Option<Step>,
    delivery: Delivery,
    payload: Value,
    sender: Option<oneshot::Sender<Value>>,
}

impl FakeSession {
    fn enter(&self, step: Step) -> bool {
        self.journal.steps.lock().unwrap().push(step);
        self.fail_at == Some(step)
    }

    fn deliver(&mut self, when: Delivery) {
        if self.delivery == when {
            if let Some(sender) = self.sender.take() {
                let _ = sender.send(self.payload.clone());
            }
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn install_init_script(&mut self, script: &str) -> Result<(), BrowserError> {
        if self.enter(Step::InitScript) {
            return Err(BrowserError::InitScript("rejected".into()));
        }
        *self.journal.init_script.lock().unwrap() = Some(script.to_string());
        Ok(())
    }

    async fn set_cookies(&mut self, cookies: &[SessionCookie]) -> Result<(), BrowserError> {
        if self.enter(Step::Cookies) {
            return Err(BrowserError::InvalidCookie("rejected".into()));
        }
        self.journal.cookies.lock().unwrap().extend_from_slice(cookies);
        Ok(())
    }

    async fn watch_responses(
        &mut self,
        _matcher: ResponseMatcher,
    ) -> Result<oneshot::Receiver<Value>, BrowserError> {
        if self.enter(Step::Watch) {
            return Err(BrowserError::Cdp("network domain unavailable".into()));
        }
        let (tx, rx) = oneshot::channel();
        self.sender = Some(tx);
        Ok(rx)
    }

    async fn navigate(&mut self, _url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        if self.enter(Step::Navigate) {
            return Err(BrowserError::NavigationFailed("net::ERR_CONNECTION_RESET".into()));
        }
        self.deliver(Delivery::OnNavigate);
        Ok(())
    }

    async fn settle(&mut self, max: Duration) -> Result<(), BrowserError> {
        if self.enter(Step::Settle) {
            return Err(BrowserError::Timeout("network never settled".into()));
        }
        *self.journal.settle_max.lock().unwrap() = Some(max);
        Ok(())
    }

    async fn interact(
        &mut self,
        script: &InteractionScript,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        if self.enter(Step::Interact) {
            return Err(BrowserError::ElementNotFound(script.input_selector.clone()));
        }
        self.deliver(Delivery::OnInteract);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.journal.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn fast_settings() -> BrowserSettings {
    BrowserSettings {
        settle_delay_ms: 0,
        navigation_timeout_ms: 1_000,
        response_timeout_ms: 200,
        ..BrowserSettings::default()
    }
}

fn feed() -> Value {
    json!({
        "data": [
            {
                "type": "search_result",
                "object": {
                    "type": "answer",
                    "id": 11,
                    "question": {"id": 22, "name": "Rust 怎么样"},
                    "excerpt": "很好"
                }
            },
            {
                "type": "search_result",
                "object": {"type": "article", "id": 33, "title": "Rust 笔记", "excerpt": "x"}
            }
        ]
    })
}

fn runner(fail_at: Option<Step>, delivery: Delivery) -> (SessionRunner, Arc<Journal>) {
    let journal = Arc::new(Journal::default());
    let launcher = FakeLauncher {
        journal: journal.clone(),
        fail_at,
        delivery,
        payload: feed(),
    };
    (SessionRunner::new(Arc::new(launcher), fast_settings()), journal)
}

fn request() -> RequestSpec {
    RequestSpec::get(
        "https://www.zhihu.com/search",
        [("type", "content"), ("q", "rust")],
    )
    .unwrap()
    .header("User-Agent", "Mozilla/5.0 test")
    .cookies("z_c0=token; _xsrf=abc")
}

fn matcher() -> ResponseMatcher {
    ResponseMatcher::new(SEARCH_API_PATTERN).unwrap()
}

fn script() -> InteractionScript {
    InteractionScript::new("input[type='search']", "rust")
}

fn assert_released(journal: &Journal) {
    assert_eq!(journal.launched(), journal.closed());
    let (profile, existed) = journal.profile();
    assert!(existed, "profile directory should exist during launch");
    assert!(!profile.exists(), "profile directory should be removed");
}

#[tokio::test]
async fn payload_during_navigation_skips_interaction() {
    let (runner, journal) = runner(None, Delivery::OnNavigate);

    let payload = runner
        .run(&request(), Some(&script()), &matcher(), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(payload, feed());
    assert_eq!(
        journal.steps(),
        vec![
            Step::InitScript,
            Step::Cookies,
            Step::Watch,
            Step::Navigate,
            Step::Settle
        ]
    );
    assert_eq!(journal.launched(), 1);
    assert_released(&journal);
}

#[tokio::test]
async fn interaction_fires_the_api_call() {
    let (runner, journal) = runner(None, Delivery::OnInteract);

    let payload = runner
        .run(&request(), Some(&script()), &matcher(), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(payload, feed());
    assert_eq!(journal.steps().last(), Some(&Step::Interact));
    assert_released(&journal);
}

#[tokio::test]
async fn stealth_script_cookies_and_user_agent_are_applied() {
    let (runner, journal) = runner(None, Delivery::OnNavigate);
    runner
        .run(&request(), None, &matcher(), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(
        journal.init_script.lock().unwrap().as_deref(),
        Some(STEALTH_SCRIPT)
    );
    assert_eq!(
        journal.user_agent.lock().unwrap().as_deref(),
        Some("Mozilla/5.0 test")
    );

    let cookies = journal.cookies.lock().unwrap().clone();
    assert_eq!(cookies.len(), 2);
    assert_eq!(cookies[0].name, "z_c0");
    assert_eq!(cookies[0].value, "token");
    assert!(cookies.iter().all(|c| c.domain == ".zhihu.com" && c.path == "/"));
}

#[tokio::test]
async fn settle_is_bounded_by_configured_delay() {
    let journal = Arc::new(Journal::default());
    let launcher = FakeLauncher {
        journal: journal.clone(),
        fail_at: None,
        delivery: Delivery::OnNavigate,
        payload: feed(),
    };
    let settings = BrowserSettings {
        settle_delay_ms: 750,
        ..fast_settings()
    };
    SessionRunner::new(Arc::new(launcher), settings)
        .run(&request(), None, &matcher(), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(
        *journal.settle_max.lock().unwrap(),
        Some(Duration::from_millis(750))
    );
}

#[tokio::test]
async fn requests_without_cookies_skip_cookie_replay() {
    let (runner, journal) = runner(None, Delivery::OnNavigate);
    let mut request = request();
    request.cookies = None;

    runner
        .run(&request, None, &matcher(), Duration::from_secs(1))
        .await
        .unwrap();

    assert!(!journal.steps().contains(&Step::Cookies));
}

#[tokio::test]
async fn unmatched_response_times_out_and_still_tears_down() {
    let (runner, journal) = runner(None, Delivery::Never);
    let started = std::time::Instant::now();

    let err = runner
        .run(&request(), Some(&script()), &matcher(), Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, BrowserError::Timeout(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(journal.launched(), 1);
    assert_released(&journal);
}

#[tokio::test]
async fn every_failing_step_releases_browser_and_profile() {
    for step in [
        Step::Launch,
        Step::InitScript,
        Step::Cookies,
        Step::Watch,
        Step::Navigate,
        Step::Settle,
        Step::Interact,
    ] {
        let (runner, journal) = runner(Some(step), Delivery::OnInteract);

        let result = runner
            .run(&request(), Some(&script()), &matcher(), Duration::from_secs(1))
            .await;

        assert!(result.is_err(), "{step:?} should fail the run");
        assert_released(&journal);
        let expected_launches = if step == Step::Launch { 0 } else { 1 };
        assert_eq!(journal.launched(), expected_launches, "{step:?}");
    }
}

#[tokio::test]
async fn zhihu_web_turns_captured_payload_into_records() {
    let (runner, journal) = runner(None, Delivery::OnInteract);
    let provider = ZhihuWeb::new(runner, Some("z_c0=token".into())).unwrap();
    let query = SearchQuery::new("rust", 1, Vec::new()).unwrap();

    let records = provider.search(&query).await;

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.source == ProviderName::ZhihuWeb));
    assert_eq!(records[0].link, "https://www.zhihu.com/question/22/answer/11");
    assert_eq!(records[1].link, "https://zhuanlan.zhihu.com/p/33");
    assert_released(&journal);
}

#[tokio::test]
async fn zhihu_web_failure_contributes_nothing() {
    let (runner, journal) = runner(Some(Step::Navigate), Delivery::OnNavigate);
    let provider = ZhihuWeb::new(runner, None).unwrap();
    let query = SearchQuery::new("rust", 3, Vec::new()).unwrap();

    assert!(provider.search(&query).await.is_empty());
    assert_eq!(journal.closed(), 1);
    assert!(journal.cookies.lock().unwrap().is_empty());
}
