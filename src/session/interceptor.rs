//! Anti-replay token tracking.
//!
//! Every response passes through [`TokenInterceptor::observe`] before the
//! caller sees it. The modem rotates `sessionToken` on each exchange and
//! expects the latest value back in the next request's `token` field.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::protocol::{HttpResponse, TOKEN_COOKIE};

/// A 302 seen by the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRecord {
    pub from: String,
    pub to: String,
}

/// Mutable per-session state: token, cookie jar, last redirect.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    token: Option<String>,
    cookies: BTreeMap<String, String>,
    last_redirect: Option<RedirectRecord>,
    exchanges: u64,
}

impl SessionState {
    /// Token captured from the most recent response that carried one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn remove_cookie(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }

    /// `Cookie` request header for the current jar.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        Some(pairs.join("; "))
    }

    pub fn last_redirect(&self) -> Option<&RedirectRecord> {
        self.last_redirect.as_ref()
    }

    /// Number of responses observed so far.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }
}

/// Response hook keeping [`SessionState`] in sync with the device.
pub struct TokenInterceptor;

impl TokenInterceptor {
    pub fn observe(state: &mut SessionState, response: &HttpResponse) {
        state.exchanges += 1;

        for (name, value) in response.cookies() {
            state.cookies.insert(name.to_string(), value.to_string());
        }
        // Exchanges without the cookie leave the token as it was.
        if let Some(token) = response.cookie(TOKEN_COOKIE) {
            state.token = Some(token.to_string());
        }

        if response.status_code == 302 {
            let to = response.location().unwrap_or_default().to_string();
            info!(
                "302 [{}] => '{}' [token: {}]",
                response.url,
                to,
                state.token().unwrap_or("-")
            );
            state.last_redirect = Some(RedirectRecord {
                from: response.url.clone(),
                to,
            });
        } else {
            debug!(
                "{} [{}] [token: {}]",
                response.status_code,
                response.url,
                state.token().unwrap_or("-")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token(token: &str) -> HttpResponse {
        HttpResponse::new(200, "http://192.168.0.1/xml/getter.xml")
            .with_header("Set-Cookie", &format!("sessionToken={token}; path=/"))
    }

    #[test]
    fn test_token_follows_latest_response() {
        let mut state = SessionState::default();
        TokenInterceptor::observe(&mut state, &with_token("111"));
        assert_eq!(state.token(), Some("111"));

        TokenInterceptor::observe(&mut state, &with_token("222"));
        assert_eq!(state.token(), Some("222"));
        assert_eq!(state.cookie("sessionToken"), Some("222"));
        assert_eq!(state.exchanges(), 2);
    }

    #[test]
    fn test_token_kept_when_cookie_absent() {
        let mut state = SessionState::default();
        TokenInterceptor::observe(&mut state, &with_token("333"));
        TokenInterceptor::observe(
            &mut state,
            &HttpResponse::new(200, "http://192.168.0.1/").with_body("<html/>"),
        );

        assert_eq!(state.token(), Some("333"));
    }

    #[test]
    fn test_redirect_recorded() {
        let mut state = SessionState::default();
        let response = HttpResponse::new(302, "http://192.168.0.1/xml/setter.xml")
            .with_header("Location", "../common_page/Access-denied.html");
        TokenInterceptor::observe(&mut state, &response);

        let redirect = state.last_redirect().unwrap();
        assert_eq!(redirect.from, "http://192.168.0.1/xml/setter.xml");
        assert_eq!(redirect.to, "../common_page/Access-denied.html");
    }

    #[test]
    fn test_cookie_header() {
        let mut state = SessionState::default();
        assert_eq!(state.cookie_header(), None);

        state.set_cookie("sessionToken", "9");
        state.set_cookie("SID", "abc");
        assert_eq!(state.cookie_header().as_deref(), Some("SID=abc; sessionToken=9"));

        assert_eq!(state.remove_cookie("SID").as_deref(), Some("abc"));
        assert_eq!(state.cookie_header().as_deref(), Some("sessionToken=9"));
    }
}
