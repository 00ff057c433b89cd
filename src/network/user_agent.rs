//! User agent pool and default request headers
//!
//! Both are built once per process and only ever read afterwards.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;

/// Desktop browser user agents that the providers serve full result pages to
static USER_AGENTS: Lazy<Vec<String>> = Lazy::new(|| {
    let chrome_versions = ["120.0.0.0", "121.0.0.0", "122.0.0.0", "123.0.0.0", "124.0.0.0"];
    let os_strings = [
        "Windows NT 10.0; Win64; x64",
        "Macintosh; Intel Mac OS X 10_15_7",
        "X11; Linux x86_64",
    ];

    let mut agents = Vec::new();
    for os in os_strings {
        for version in chrome_versions {
            agents.push(format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
                os, version
            ));
        }
    }
    agents.push(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0"
            .to_string(),
    );
    agents
});

/// Header template sent with every plain request
///
/// Accept-Encoding is left to reqwest so it can decode what it asked for.
static DEFAULT_HEADERS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("Accept", accept_html()),
        ("Accept-Language", accept_language()),
        ("Connection", "keep-alive"),
        ("Cache-Control", "max-age=0"),
    ]
});

/// Pick a user agent from the pool
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| USER_AGENTS_FALLBACK.to_string())
}

const USER_AGENTS_FALLBACK: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Default header template
pub fn default_headers() -> &'static [(&'static str, &'static str)] {
    &DEFAULT_HEADERS
}

/// Standard accept header for HTML requests
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8"
}

/// Standard accept header for JSON requests
pub fn accept_json() -> &'static str {
    "application/json, text/plain, */*"
}

/// Accept-Language preferring simplified Chinese, which all providers serve
pub fn accept_language() -> &'static str {
    "zh-CN,zh;q=0.9,en;q=0.8"
}
