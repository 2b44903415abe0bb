//! Error types for the modem client.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the modem client.
#[derive(Error, Debug)]
pub enum Error {
    /// The device did not answer within the configured timeout.
    #[error("Request timed out")]
    TransportTimeout,

    /// Any other HTTP-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// GET followed more redirects than allowed
    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    /// Login was redirected to the access-denied page.
    #[error("Access denied - still logged in somewhere else?")]
    AccessDenied,

    /// Login returned a non-200 status without the access-denied redirect.
    #[error("Login failed for unknown reason (HTTP {status})")]
    LoginFailedUnknown { status: u16 },

    /// Login returned 200 but no session id.
    #[error("No valid session id received - wrong password?")]
    InvalidCredentials,

    /// No password configured and none supplied.
    #[error("No key/password available")]
    MissingCredential,

    /// Non-200 status during a function scan that is not a lost session.
    #[error("Scan failed with HTTP {0}")]
    ScanHttpError(u16),

    /// Caller passed a reserved field name.
    #[error("Invalid request parameters: {0}")]
    InvalidParams(String),

    /// Invalid response from the device
    #[error("Invalid device response: {0}")]
    InvalidResponse(String),

    /// XML parse error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Create a new transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new invalid response error.
    pub fn invalid_response<S: Into<String>>(msg: S) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid state error.
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Check if this is a read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TransportTimeout)
    }

    /// Check if this error came out of the login sequence.
    pub fn is_login_failure(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied | Self::LoginFailedUnknown { .. } | Self::InvalidCredentials
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // A timeout while connecting means the device is unreachable, not busy.
        if err.is_timeout() && !err.is_connect() {
            Self::TransportTimeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Transport(format!("invalid URL: {err}"))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}
