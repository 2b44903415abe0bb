//! HTTP backends the session sends requests through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::debug;

use crate::error::Result;
use crate::protocol::{HttpRequest, HttpResponse, Method};

/// Sends one HTTP exchange. Never follows redirects: a 302 from the modem is
/// a signal the session has to see.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-based backend.
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a backend whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method == Method::Post {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;
        debug!(status = status_code, len = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status_code,
            url,
            headers,
            body,
        })
    }
}
