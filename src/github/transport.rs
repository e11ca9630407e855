use super::rate_limit::{sleep_until_reset, RateLimitStatus};
use crate::display;
use crate::error::{OrglangError, Result};
use crate::signal::{self, Interrupt};
use async_trait::async_trait;
use chrono::Utc;
use octocrab::Octocrab;
use serde::Deserialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `/orgs/acme/repos?per_page=100`.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub rate_limit: Option<RateLimitStatus>,
    /// Raw `Link` header, if any.
    pub link: Option<String>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one request and reports what came back, whatever the status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Live transport on top of octocrab, which owns authentication and the
/// connection pool.
pub struct OctocrabTransport {
    octocrab: Octocrab,
}

impl OctocrabTransport {
    pub fn new(token: &str, base_url: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = base_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| OrglangError::Config(format!("Invalid API URL {url}: {e}")))?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| OrglangError::GitHub(e.to_string()))?;
        Ok(Self { octocrab })
    }
}

#[async_trait]
impl Transport for OctocrabTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let response = match request.method {
            Method::Get => self.octocrab._get(request.path.as_str()).await?,
            Method::Post => {
                self.octocrab
                    ._post(request.path.as_str(), request.body.as_ref())
                    .await?
            }
        };

        let status = response.status().as_u16();
        let (rate_limit, link) = {
            let headers = response.headers();
            let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
            (
                RateLimitStatus::from_headers(
                    header("x-ratelimit-limit"),
                    header("x-ratelimit-remaining"),
                    header("x-ratelimit-reset"),
                ),
                header("link").map(str::to_owned),
            )
        };
        let body = self.octocrab.body_to_string(response).await?;

        Ok(ApiResponse {
            status,
            body,
            rate_limit,
            link,
        })
    }
}

/// Wraps a transport so that an exhausted quota turns into a wait followed by
/// the same request again, and any other non-2xx status into an error.
pub struct RateLimited<T> {
    inner: T,
    last_seen: Mutex<Option<RateLimitStatus>>,
    /// Called once per wait; a resolved future ends the wait with `Interrupted`.
    interrupt: fn() -> Interrupt,
}

impl<T> RateLimited<T> {
    pub fn new(inner: T) -> Self {
        Self::with_interrupt(inner, signal::ctrl_c)
    }

    pub fn with_interrupt(inner: T, interrupt: fn() -> Interrupt) -> Self {
        Self {
            inner,
            last_seen: Mutex::new(None),
            interrupt,
        }
    }

    /// Most recent quota status seen in any response.
    pub fn last_seen(&self) -> Option<RateLimitStatus> {
        self.last_seen.lock().ok().and_then(|guard| *guard)
    }

    fn record(&self, status: RateLimitStatus) {
        if let Ok(mut guard) = self.last_seen.lock() {
            *guard = Some(status);
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for RateLimited<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        loop {
            tracing::debug!(method = ?request.method, path = %request.path, "sending request");
            let response = self.inner.send(request).await?;

            if let Some(status) = response.rate_limit {
                self.record(status);
                if status.is_exhausted() {
                    if let Some(wait) = status.wait_from(Utc::now()) {
                        display::warn(&format!(
                            "Rate limit exceeded. Waiting {}s until {}...",
                            wait.as_secs_f64().ceil(),
                            status.describe_reset()
                        ));
                        sleep_until_reset(wait, (self.interrupt)()).await?;
                        continue;
                    }
                }
            }

            if !response.is_success() {
                return Err(OrglangError::Api {
                    status: response.status,
                    message: error_message(&response.body),
                });
            }
            return Ok(response);
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// GitHub error bodies carry a `message`; fall back to a trimmed raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => err.message,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        }
    }
}
