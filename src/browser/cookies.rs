//! Session cookie string parsing

use super::session::SessionCookie;
use tracing::warn;

/// Cookie domain for a target URL: `www.zhihu.com` becomes `.zhihu.com`
pub fn cookie_domain(target_url: &str) -> Option<String> {
    let url = url::Url::parse(target_url).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.parse::<std::net::IpAddr>().is_ok() || !host.contains('.') {
        return Some(host.to_string());
    }
    Some(format!(".{host}"))
}

/// Split a `name=value; name=value` string into cookies scoped to the target
///
/// Parts without `=` or with an empty name are skipped.
pub fn parse_cookie_string(raw: &str, target_url: &str) -> Vec<SessionCookie> {
    let Some(domain) = cookie_domain(target_url) else {
        warn!(url = target_url, "cannot scope cookies, target URL has no host");
        return Vec::new();
    };

    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let Some((name, value)) = part.split_once('=') else {
                warn!(cookie = part, "skipping cookie without '='");
                return None;
            };
            let name = name.trim();
            if name.is_empty() {
                warn!("skipping cookie with empty name");
                return None;
            }
            Some(SessionCookie {
                name: name.to_string(),
                value: value.trim().to_string(),
                domain: domain.clone(),
                path: "/".to_string(),
            })
        })
        .collect()
}
