// API client module: a small blocking HTTP client shared by the Vultr and
// Cloudflare endpoints. Every response is normalized into a JSON mapping so
// the validators in `validate` can treat both providers the same way.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use indicatif::{ProgressBar, ProgressStyle};

/// The two REST backends the tool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Vultr,
    Cloudflare,
}

impl Provider {
    pub fn base_url(self) -> &'static str {
        match self {
            Provider::Vultr => "https://api.vultr.com/v2/",
            Provider::Cloudflare => "https://api.cloudflare.com/client/v4/",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Provider::Vultr => "vultr",
            Provider::Cloudflare => "cloudflare",
        }
    }
}

/// Failures that happen before a provider produced an HTTP response.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    #[error("API token for {provider} is not a valid header value")]
    InvalidToken { provider: &'static str },

    #[error("{method} {url} failed")]
    Transport {
        method: Method,
        url: String,
        transient: bool,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Whether repeating the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport { transient: true, .. })
    }
}

/// Bounded retry for idempotent requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

/// Blocking client bound to one provider's base URL and bearer token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    provider: Provider,
    base_url: String,
    retry: RetryPolicy,
    print_summary: bool,
}

impl ApiClient {
    /// Build a client for `provider` that authenticates with `token`.
    pub fn new(provider: Provider, token: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .default_headers(auth_headers(provider, token)?)
            .timeout(timeout)
            .build()
            .map_err(ApiError::Build)?;
        Ok(ApiClient {
            client,
            provider,
            base_url: provider.base_url().to_string(),
            retry: RetryPolicy::default(),
            print_summary: false,
        })
    }

    /// Point the client at a different base URL (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Print a one-line `METHOD path -> status` summary after each call.
    pub fn with_response_summary(mut self, enabled: bool) -> Self {
        self.print_summary = enabled;
        self
    }

    pub fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None)
    }

    pub fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(body))
    }

    pub fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, Some(body))
    }

    pub fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, Some(body))
    }

    pub fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None)
    }

    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        // Only GET is safe to repeat.
        let attempts = if method == Method::GET {
            self.retry.max_attempts.max(1)
        } else {
            1
        };
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.send_once(&method, &url, body) {
                Ok((status, _)) if attempt < attempts && is_retryable_status(status) => {
                    warn!(provider = self.provider.name(), %method, %url, status, attempt, "retrying request");
                }
                Ok((status, text)) => {
                    if self.print_summary {
                        println!("{} {} -> {}", method, path, status);
                    }
                    debug!(provider = self.provider.name(), %method, %url, status, "response received");
                    return Ok(process_response(status, &text));
                }
                Err(err) if attempt < attempts && err.is_transient() => {
                    warn!(provider = self.provider.name(), %method, %url, attempt, error = %err, "retrying request");
                }
                Err(err) => return Err(err),
            }
            thread::sleep(backoff);
            backoff *= 2;
            attempt += 1;
        }
    }

    fn send_once(&self, method: &Method, url: &str, body: Option<&Value>) -> Result<(u16, String), ApiError> {
        let mut req: RequestBuilder = self.client.request(method.clone(), url);
        if let Some(body) = body {
            req = req.json(body);
        }

        // indicatif hides the spinner on its own when stderr is not a terminal.
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("{} {}", method, url));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = req
            .send()
            .and_then(|res| {
                let status = res.status().as_u16();
                res.text().map(|text| (status, text))
            })
            .map_err(|source| ApiError::Transport {
                method: method.clone(),
                url: url.to_string(),
                transient: source.is_timeout() || source.is_connect(),
                source,
            });
        spinner.finish_and_clear();
        result
    }
}

/// Helper to build the Authorization and Content-Type header map.
fn auth_headers(provider: Provider, token: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ApiError::InvalidToken { provider: provider.name() })?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Normalize a status code and raw body into the mapping every endpoint
/// consumes.
///
/// 2xx yields the parsed body; a body that is not JSON becomes
/// `{info, status}`; anything else is wrapped as `{error, error_detail}`.
pub fn process_response(status: u16, body: &str) -> Value {
    let output = serde_json::from_str::<Value>(body)
        .unwrap_or_else(|_| json!({ "info": "No response body.", "status": status }));
    if (200..300).contains(&status) {
        output
    } else {
        json!({ "error": status, "error_detail": output })
    }
}
