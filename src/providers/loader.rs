//! Provider loader for initializing providers from configuration

use super::registry::ProviderRegistry;
use super::traits::{Provider, ProviderName, TransportMode};
use super::{baidu, bing, zhihu};
use crate::browser::{BrowserLauncher, SessionRunner};
use crate::config::Settings;
use crate::network::HttpClient;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Slack added on top of the browser's own timeouts
const AUTOMATED_GRACE: Duration = Duration::from_secs(5);

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Build the registry of every enabled provider
    pub fn load(
        settings: &Settings,
        client: &HttpClient,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Result<ProviderRegistry> {
        let runner = SessionRunner::new(launcher, settings.browser.clone());
        let mut registry = ProviderRegistry::new();

        for name in ProviderName::ALL {
            if settings.is_disabled(name) {
                info!("Skipping disabled provider: {}", name);
                continue;
            }

            match Self::create_provider(name, settings, client, &runner) {
                Ok(provider) => {
                    let timeout = Self::timeout(settings, provider.as_ref());
                    info!(
                        provider = %name,
                        transport = ?provider.transport(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Loaded provider"
                    );
                    registry.register(provider, timeout);
                }
                Err(e) => {
                    warn!("Failed to load provider {}: {}", name, e);
                }
            }
        }

        if settings.credentials.zhihu_cookie.is_none() && registry.contains(ProviderName::Zhihu) {
            warn!("ZHIHU_COOKIE is not set, the zhihu provider will return no results");
        }

        info!("Loaded {} providers", registry.len());
        Ok(registry)
    }

    /// Create a provider instance by name
    fn create_provider(
        name: ProviderName,
        settings: &Settings,
        client: &HttpClient,
        runner: &SessionRunner,
    ) -> Result<Arc<dyn Provider>> {
        let base_url = settings.base_url(name);
        let cookie = settings.credentials.zhihu_cookie.clone();

        let provider: Arc<dyn Provider> = match name {
            ProviderName::Baidu => {
                let provider = baidu::Baidu::new(client.clone())?;
                Arc::new(match base_url {
                    Some(url) => provider.with_base_url(url),
                    None => provider,
                })
            }
            ProviderName::Bing => {
                let provider = bing::Bing::new(client.clone())?;
                Arc::new(match base_url {
                    Some(url) => provider.with_base_url(url),
                    None => provider,
                })
            }
            ProviderName::Zhihu => {
                let provider = zhihu::Zhihu::new(client.clone(), cookie);
                Arc::new(match base_url {
                    Some(url) => provider.with_base_url(url),
                    None => provider,
                })
            }
            ProviderName::ZhihuWeb => {
                let provider = zhihu::ZhihuWeb::new(runner.clone(), cookie)?;
                Arc::new(match base_url {
                    Some(url) => provider.with_base_url(url),
                    None => provider,
                })
            }
        };

        Ok(provider)
    }

    /// Outer time bound for one provider search
    ///
    /// Automated runs may spend the response timeout twice: once waiting for the
    /// input element, once waiting for the captured response.
    fn timeout(settings: &Settings, provider: &dyn Provider) -> Duration {
        if let Some(timeout) = settings
            .get_provider(provider.name())
            .and_then(|p| p.timeout)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|timeout| !timeout.is_zero())
        {
            return timeout;
        }

        match provider.transport() {
            TransportMode::Plain => settings.outgoing.timeout(),
            TransportMode::Automated => {
                let browser = &settings.browser;
                browser.navigation_timeout()
                    + browser.settle_delay()
                    + browser.response_timeout() * 2
                    + AUTOMATED_GRACE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ChromeLauncher;
    use crate::config::ProviderConfig;

    fn load(settings: &Settings) -> ProviderRegistry {
        let client = HttpClient::with_settings(&settings.outgoing).unwrap();
        ProviderLoader::load(settings, &client, Arc::new(ChromeLauncher::new())).unwrap()
    }

    #[test]
    fn test_load_defaults() {
        let registry = load(&Settings::default());
        assert_eq!(registry.names(), ProviderName::ALL.to_vec());
        assert_eq!(
            registry.timeout_for(ProviderName::Baidu),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            registry.timeout_for(ProviderName::ZhihuWeb),
            Some(Duration::from_secs(30 + 1 + 20 + 5))
        );
    }

    #[test]
    fn test_load_respects_disabled_and_timeouts() {
        let mut settings = Settings::default();
        settings.providers = vec![
            ProviderConfig {
                disabled: true,
                ..ProviderConfig::new(ProviderName::Bing)
            },
            ProviderConfig {
                timeout: Some(2.5),
                ..ProviderConfig::new(ProviderName::Zhihu)
            },
        ];

        let registry = load(&settings);
        assert!(!registry.contains(ProviderName::Bing));
        assert_eq!(
            registry.timeout_for(ProviderName::Zhihu),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_unusable_timeouts_fall_back_to_defaults() {
        let mut settings = Settings::default();
        settings.outgoing.request_timeout = -1.0;
        settings.providers = vec![
            ProviderConfig {
                timeout: Some(f64::NAN),
                ..ProviderConfig::new(ProviderName::Bing)
            },
            ProviderConfig {
                timeout: Some(f64::INFINITY),
                ..ProviderConfig::new(ProviderName::Zhihu)
            },
        ];

        let registry = load(&settings);
        for name in [ProviderName::Baidu, ProviderName::Bing, ProviderName::Zhihu] {
            assert_eq!(
                registry.timeout_for(name),
                Some(Duration::from_secs(10)),
                "{name}"
            );
        }
    }
}
