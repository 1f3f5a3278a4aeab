//! Blocking HTTP client with retries and a response cache
//!
//! All REST providers go through [`HttpClient::get`]. Successful responses
//! are written to the [`ResponseCache`] when one is configured; offline runs
//! answer exclusively from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::cache::{cache_key, ResponseCache};
use crate::error::NegFeatError;

/// Longest pause between two attempts
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub timeout_secs: u64,
    /// Attempts after the first one
    pub retries: u32,
    /// Base delay, doubled per attempt
    pub backoff_ms: u64,
    pub user_agent: String,
    /// Serve only from the cache
    pub offline: bool,
    pub cache_dir: Option<PathBuf>,
    /// Zero keeps entries forever
    pub cache_ttl_hours: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            retries: 5,
            backoff_ms: 500,
            user_agent: format!("ferro-negfeat/{}", env!("CARGO_PKG_VERSION")),
            offline: false,
            cache_dir: None,
            cache_ttl_hours: 24,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), NegFeatError> {
        if self.timeout_secs == 0 {
            return Err(NegFeatError::invalid_parameter("timeout", "must be >= 1 second"));
        }
        Ok(())
    }
}

/// A response body and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    pub from_cache: bool,
    pub retrieved_at: DateTime<Utc>,
}

impl Fetched {
    pub fn json(&self) -> Result<serde_json::Value, NegFeatError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Delay before retry number `attempt` (0-based)
///
/// A server-supplied `Retry-After` wins; otherwise the base delay doubles
/// per attempt. Both are capped at [`MAX_BACKOFF_MS`].
pub fn backoff_delay(backoff_ms: u64, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
    let ms = match retry_after_secs {
        Some(secs) => secs.saturating_mul(1000),
        None => backoff_ms.saturating_mul(1u64 << attempt.min(20)),
    };
    Duration::from_millis(ms.min(MAX_BACKOFF_MS))
}

fn full_url(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", url, query.join("&"))
}

/// Shared HTTP client
pub struct HttpClient {
    config: ClientConfig,
    cache: Option<ResponseCache>,
    #[cfg(feature = "remote")]
    agent: ureq::Agent,
}

impl HttpClient {
    /// Build a client, creating the cache directory if one is configured
    pub fn new(config: ClientConfig) -> Result<Self, NegFeatError> {
        config.validate()?;
        let cache = match &config.cache_dir {
            Some(dir) => Some(ResponseCache::new(dir, config.cache_ttl_hours)?),
            None => None,
        };
        #[cfg(feature = "remote")]
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build();
        Ok(Self {
            config,
            cache,
            #[cfg(feature = "remote")]
            agent,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_offline(&self) -> bool {
        self.config.offline
    }

    /// GET a resource
    ///
    /// Returns `Ok(None)` when the server answers 400 or 404, which REST
    /// endpoints use for unknown identifiers.
    ///
    /// # Errors
    ///
    /// - [`NegFeatError::CacheMiss`] offline with no cached entry
    /// - [`NegFeatError::ProviderUnavailable`] once retries are exhausted
    pub fn get(
        &self,
        provider: &str,
        url: &str,
        params: &[(&str, &str)],
        accept: &str,
    ) -> Result<Option<Fetched>, NegFeatError> {
        let key = cache_key(url, params, accept);
        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.get(&key, self.config.offline) {
                log::debug!("cache hit for {}", entry.url);
                return Ok(Some(Fetched {
                    body: entry.body,
                    from_cache: true,
                    retrieved_at: entry.saved_at,
                }));
            }
        }
        let shown = full_url(url, params);
        if self.config.offline {
            return Err(NegFeatError::CacheMiss { key: shown });
        }

        let body = match self.fetch_remote(provider, url, params, accept)? {
            Some(body) => body,
            None => return Ok(None),
        };
        let mut retrieved_at = Utc::now();
        if let Some(cache) = &self.cache {
            match cache.put(&key, &shown, &body) {
                Ok(entry) => retrieved_at = entry.saved_at,
                Err(e) => log::warn!("could not cache response for {}: {}", shown, e),
            }
        }
        Ok(Some(Fetched {
            body,
            from_cache: false,
            retrieved_at,
        }))
    }

    #[cfg(feature = "remote")]
    fn fetch_remote(
        &self,
        provider: &str,
        url: &str,
        params: &[(&str, &str)],
        accept: &str,
    ) -> Result<Option<String>, NegFeatError> {
        let shown = full_url(url, params);
        let mut attempt = 0u32;
        loop {
            let mut request = self.agent.get(url).set("Accept", accept);
            for (key, value) in params {
                request = request.query(key, value);
            }
            log::debug!("GET {} (attempt {})", shown, attempt + 1);

            let retry_after = match request.call() {
                Ok(response) => {
                    return response.into_string().map(Some).map_err(|e| {
                        NegFeatError::provider(
                            provider,
                            format!("failed to read response from {}: {}", shown, e),
                        )
                    });
                }
                Err(ureq::Error::Status(400, _)) | Err(ureq::Error::Status(404, _)) => {
                    log::debug!("{} returned not found", shown);
                    return Ok(None);
                }
                Err(ureq::Error::Status(code, response)) if code == 429 || code >= 500 => {
                    if attempt >= self.config.retries {
                        return Err(NegFeatError::provider(
                            provider,
                            format!("{} returned HTTP {} after {} attempts", shown, code, attempt + 1),
                        ));
                    }
                    log::warn!("{} returned HTTP {}, retrying", shown, code);
                    response
                        .header("Retry-After")
                        .and_then(|value| value.trim().parse::<u64>().ok())
                }
                Err(ureq::Error::Status(code, _)) => {
                    return Err(NegFeatError::provider(
                        provider,
                        format!("{} returned HTTP {}", shown, code),
                    ));
                }
                Err(ureq::Error::Transport(transport)) => {
                    if attempt >= self.config.retries {
                        return Err(NegFeatError::provider(
                            provider,
                            format!("request to {} failed: {}", shown, transport),
                        ));
                    }
                    log::warn!("request to {} failed ({}), retrying", shown, transport);
                    None
                }
            };
            std::thread::sleep(backoff_delay(self.config.backoff_ms, attempt, retry_after));
            attempt += 1;
        }
    }

    #[cfg(not(feature = "remote"))]
    fn fetch_remote(
        &self,
        provider: &str,
        url: &str,
        params: &[(&str, &str)],
        _accept: &str,
    ) -> Result<Option<String>, NegFeatError> {
        Err(NegFeatError::provider(
            provider,
            format!(
                "cannot fetch {}: remote feature not enabled",
                full_url(url, params)
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn offline_client(dir: &TempDir) -> HttpClient {
        HttpClient::new(ClientConfig {
            offline: true,
            cache_dir: Some(dir.path().to_path_buf()),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(500, 0, None), Duration::from_millis(500));
        assert_eq!(backoff_delay(500, 2, None), Duration::from_millis(2000));
        assert_eq!(backoff_delay(500, 12, None), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_backoff_prefers_retry_after() {
        assert_eq!(backoff_delay(500, 0, Some(3)), Duration::from_secs(3));
        assert_eq!(backoff_delay(500, 0, Some(600)), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_offline_without_cache_always_misses() {
        let client = HttpClient::new(ClientConfig {
            offline: true,
            ..ClientConfig::default()
        })
        .unwrap();
        assert!(matches!(
            client.get("ensembl", "https://rest.ensembl.org/info/data", &[], "application/json"),
            Err(NegFeatError::CacheMiss { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_offline_miss() {
        let dir = TempDir::new().unwrap();
        let client = offline_client(&dir);
        let err = client
            .get("ensembl", "https://rest.ensembl.org/lookup/id/ENSG1", &[], "application/json")
            .unwrap_err();
        match err {
            NegFeatError::CacheMiss { key } => assert!(key.contains("lookup/id/ENSG1")),
            other => panic!("expected cache miss, got {:?}", other),
        }
    }

    #[test]
    fn test_offline_hit() {
        let dir = TempDir::new().unwrap();
        let url = "https://rest.ensembl.org/info/assembly/homo_sapiens/17";
        let cache = ResponseCache::new(dir.path(), 24).unwrap();
        cache
            .put(&cache_key(url, &[], "application/json"), url, r#"{"length": 83257441}"#)
            .unwrap();

        let client = offline_client(&dir);
        let fetched = client
            .get("ensembl", url, &[], "application/json")
            .unwrap()
            .unwrap();
        assert!(fetched.from_cache);
        assert_eq!(fetched.json().unwrap()["length"], 83257441);
    }

    #[test]
    fn test_full_url() {
        assert_eq!(full_url("u", &[]), "u");
        assert_eq!(
            full_url("u", &[("feature", "repeat"), ("x", "1")]),
            "u?feature=repeat&x=1"
        );
    }
}
