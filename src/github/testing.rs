//! In-memory transport for exercising the client without a network.

use super::rate_limit::RateLimitStatus;
use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{OrglangError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub type RequestLog = Arc<Mutex<Vec<ApiRequest>>>;

/// Replays canned responses in order and records every request it sees.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    log: RequestLog,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<ApiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> RequestLog {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.log.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OrglangError::GitHub(format!("no scripted response for {}", request.path)))
    }
}

/// Replays `inner`, except that any request whose path contains `trigger`
/// fails as if Ctrl-C had been pressed during a rate-limit wait.
pub struct InterruptOn {
    pub trigger: &'static str,
    pub inner: ScriptedTransport,
}

#[async_trait]
impl Transport for InterruptOn {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        if request.path.contains(self.trigger) {
            return Err(OrglangError::Interrupted);
        }
        self.inner.send(request).await
    }
}

pub fn json_response(body: serde_json::Value) -> ApiResponse {
    ApiResponse {
        status: 200,
        body: body.to_string(),
        rate_limit: Some(RateLimitStatus {
            limit: Some(5000),
            remaining: 4999,
            reset: 0,
        }),
        link: None,
    }
}

pub fn with_next(mut response: ApiResponse, next_url: &str) -> ApiResponse {
    response.link = Some(format!(
        r#"<{next_url}>; rel="next", <https://api.github.com/orgs/acme/repos?page=99>; rel="last""#
    ));
    response
}

pub fn error_response(status: u16, message: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: serde_json::json!({ "message": message }).to_string(),
        ..ApiResponse::default()
    }
}
