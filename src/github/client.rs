use crate::error::ClientError;
use crate::github::cache::{cache_key, CachedResponse, RequestOptions, ResponseCache};
use crate::github::rate_limiter::{RateLimit, RateLimiter};
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const GITHUB_API_URL: &str = "https://api.github.com";
const SEARCH_PREFIX: &str = "/search/";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub cache_dir: PathBuf,
    pub reuse_cache: bool,
    pub general_limit: RateLimit,
    pub search_limit: RateLimit,
}

impl ClientConfig {
    pub fn new(token: impl ToString, cache_dir: impl Into<PathBuf>, reuse_cache: bool) -> Self {
        Self {
            base_url: GITHUB_API_URL.to_string(),
            token: token.to_string(),
            cache_dir: cache_dir.into(),
            reuse_cache,
            general_limit: RateLimit::GENERAL,
            search_limit: RateLimit::SEARCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
    pub headers: IndexMap<String, String>,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn has_next_page(&self) -> bool {
        self.headers
            .get("link")
            .is_some_and(|link| link.contains("rel=\"next\""))
    }
}

impl From<CachedResponse> for ApiResponse {
    fn from(cached: CachedResponse) -> Self {
        Self {
            status: 200,
            data: cached.data,
            headers: cached.headers,
        }
    }
}

/// GitHub REST client that consults the response cache before dispatching
/// and throttles dispatches through a general and a search budget.
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    reuse_cache: bool,
    cache: ResponseCache,
    general: RateLimiter,
    search: RateLimiter,
}

impl GithubClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("token {}", config.token))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            reuse_cache: config.reuse_cache,
            cache: ResponseCache::load(&config.cache_dir),
            general: RateLimiter::new(config.general_limit),
            search: RateLimiter::new(config.search_limit),
        })
    }

    pub async fn get(
        &self,
        endpoint: &str,
        options: Option<&RequestOptions>,
    ) -> Result<ApiResponse, ClientError> {
        let key = cache_key(endpoint, options);
        if self.reuse_cache {
            if let Some(cached) = self.cache.get(&key).await {
                debug!(%key, "Re-using cached API response");
                return Ok(cached.into());
            }
        }

        self.limiter(endpoint).acquire().await;
        info!(%endpoint, options = ?options.map(|o| &o.params), "Fetching from GitHub API");

        let mut request = self.http.get(self.url(endpoint));
        if let Some(options) = options {
            request = request.query(&options.query());
        }
        let response = request.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect::<IndexMap<_, _>>();
        let body = response.text().await?;

        if status != 200 {
            warn!(%endpoint, status, "GitHub API answered with a non-success status");
            let data = serde_json::from_str(&body).unwrap_or(Value::String(body));
            return Ok(ApiResponse {
                status,
                data,
                headers,
            });
        }

        let data: Value = serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let cached = CachedResponse { data, headers };
        match self.cache.store(&key, cached.clone()).await {
            Ok(path) => debug!(%key, file = %path.display(), "Cached API response"),
            Err(e) => warn!(%key, error = %e, "Failed to persist API response"),
        }
        Ok(cached.into())
    }

    /// Turns an absolute API URL, as found in payload links, into an endpoint.
    pub fn endpoint(&self, url: &str) -> String {
        url.strip_prefix(&self.base_url)
            .or_else(|| url.strip_prefix(GITHUB_API_URL))
            .unwrap_or(url)
            .to_string()
    }

    /// Logs how much of the core and search quotas is used. Never cached.
    pub async fn log_rate_limits(&self) {
        let response = match self.http.get(self.url("/rate_limit")).send().await {
            Ok(response) => response.json::<Value>().await,
            Err(e) => Err(e),
        };
        match response {
            Ok(limits) => {
                let core = &limits["resources"]["core"];
                let search = &limits["resources"]["search"];
                info!(
                    used = %core["used"],
                    limit = %core["limit"],
                    reset = %core["reset"],
                    "GitHub core rate limit"
                );
                info!(
                    used = %search["used"],
                    limit = %search["limit"],
                    reset = %search["reset"],
                    "GitHub search rate limit"
                );
            }
            Err(e) => warn!(error = %e, "Failed to read GitHub rate limits"),
        }
    }

    fn limiter(&self, endpoint: &str) -> &RateLimiter {
        if endpoint.starts_with(SEARCH_PREFIX) {
            &self.search
        } else {
            &self.general
        }
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }
}
