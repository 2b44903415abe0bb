//! Transport session: one cookie jar, one rotating token, one device.
//!
//! Requests through a session are strictly sequential. The token sent with a
//! request is always the one captured from the previous response, so a
//! session takes `&mut self` for every exchange and is never shared between
//! concurrent callers.

mod backend;
mod interceptor;

pub use backend::{HttpBackend, ReqwestBackend};
pub use interceptor::{RedirectRecord, SessionState, TokenInterceptor};

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{
    HttpRequest, HttpResponse, Params, RequestEnvelope, CONTENT_TYPE_BINARY, CONTENT_TYPE_FORM,
    MAX_REDIRECTS,
};

/// Whether a GET follows redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Follow up to [`MAX_REDIRECTS`] hops.
    Follow,
    /// Return the first response as is.
    Stop,
}

/// Authenticated HTTP session with the modem.
pub struct Session<B> {
    backend: B,
    base_url: Url,
    state: SessionState,
    referer: Option<String>,
}

impl<B: HttpBackend> Session<B> {
    /// Create a session for the device at `host` (IP or hostname).
    pub fn new(backend: B, host: &str) -> Result<Self> {
        let base_url = Url::parse(&format!("http://{host}/"))?;
        Ok(Self {
            backend,
            base_url,
            state: SessionState::default(),
            referer: None,
        })
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current anti-replay token.
    pub fn token(&self) -> Option<&str> {
        self.state.token()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Put a cookie in the jar (used for `SID` after login).
    pub fn install_cookie(&mut self, name: &str, value: &str) {
        self.state.set_cookie(name, value);
    }

    /// Drop a cookie from the jar (used for `SID` after logout).
    pub fn remove_cookie(&mut self, name: &str) {
        self.state.remove_cookie(name);
    }

    /// GET `path`, updating the referer to the URL finally reached.
    pub async fn get(&mut self, path: &str, redirects: RedirectPolicy) -> Result<HttpResponse> {
        let mut url = self.url(path);
        let mut hops = 0;

        loop {
            let response = self.exchange(HttpRequest::get(url.as_str())).await?;

            let next = match (redirects, response.location()) {
                (RedirectPolicy::Follow, Some(location)) if response.is_redirect() => {
                    Some(Url::parse(&url)?.join(location)?.to_string())
                }
                _ => None,
            };

            match next {
                Some(target) => {
                    if hops == MAX_REDIRECTS {
                        return Err(Error::TooManyRedirects(MAX_REDIRECTS));
                    }
                    hops += 1;
                    url = target;
                }
                None => {
                    self.referer = Some(response.url.clone());
                    return Ok(response);
                }
            }
        }
    }

    /// POST an ordered form to `path` without following redirects.
    pub async fn post(&mut self, path: &str, fun: Option<u32>, params: Params) -> Result<HttpResponse> {
        let envelope = RequestEnvelope::new(self.state.token(), fun, params)?;
        debug!("POST [{}]: {}", path, envelope.redacted());

        let request = HttpRequest::post(self.url(path))
            .header("Content-Type", CONTENT_TYPE_FORM)
            .body(envelope.encode());
        self.exchange(request).await
    }

    /// POST a raw file body, as the configuration restore form does.
    pub async fn post_binary(&mut self, path: &str, data: Bytes, filename: &str) -> Result<HttpResponse> {
        debug!("POST [{}]: {} bytes as '{}'", path, data.len(), filename);

        let disposition = format!("form-data; name=\"file\"; filename=\"{filename}\"");
        let request = HttpRequest::post(self.url(path))
            .header("Content-Disposition", &disposition)
            .header("Content-Type", CONTENT_TYPE_BINARY)
            .body(data);
        self.exchange(request).await
    }

    async fn exchange(&mut self, mut request: HttpRequest) -> Result<HttpResponse> {
        if let Some(referer) = &self.referer {
            request = request.header("Referer", referer);
        }
        if let Some(cookies) = self.state.cookie_header() {
            request = request.header("Cookie", &cookies);
        }

        let url = request.url.clone();
        let mut response = self.backend.send(request).await?;
        response.url = url;

        TokenInterceptor::observe(&mut self.state, &response);
        Ok(response)
    }
}
