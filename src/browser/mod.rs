//! Browser session runner for automated providers
//!
//! Each run launches an isolated headless Chromium, injects anti-automation
//! overrides, replays session cookies, navigates, optionally types the query,
//! and waits for a matching in-page API response. The browser and its profile
//! directory are released on every exit path.

mod chrome;
mod cookies;
mod error;
mod intercept;
mod runner;
mod session;
mod stealth;

pub use chrome::{launch_args, ChromeLauncher, ChromeSession};
pub use cookies::{cookie_domain, parse_cookie_string};
pub use error::BrowserError;
pub use intercept::{capture_first, wait_for_idle, NETWORK_QUIET_WINDOW};
pub use runner::SessionRunner;
pub use session::{
    BrowserLauncher, BrowserSession, InteractionScript, LaunchOptions, ResponseMatcher,
    SessionCookie,
};
pub use stealth::{LAUNCH_FLAGS, STEALTH_SCRIPT};
