//! Modem session lifecycle state.

use crate::protocol::{FIRST_INSTALL_PAGE, LOGIN_PAGE};

/// Authentication states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No session id installed.
    Unauthenticated,
    /// Logged in; `SID` cookie installed.
    Authenticated,
    /// Device is rebooting or resetting; the session is gone for good.
    Terminated,
}

impl AuthState {
    /// Check if currently logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    /// Check if the session can still be used.
    pub fn is_usable(&self) -> bool {
        !matches!(self, AuthState::Terminated)
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "Unauthenticated"),
            AuthState::Authenticated => write!(f, "Authenticated"),
            AuthState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Where the initial `GET /` ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingPage {
    /// Ordinary login page.
    Login,
    /// Device has not been set up yet.
    FirstInstallation,
    /// Anything else; usually another session is active.
    Other(String),
}

impl LandingPage {
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(FIRST_INSTALL_PAGE) {
            LandingPage::FirstInstallation
        } else if url.ends_with(LOGIN_PAGE) {
            LandingPage::Login
        } else {
            LandingPage::Other(url.to_string())
        }
    }
}
