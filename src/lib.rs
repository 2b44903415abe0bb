//! Control client for the Compal CH7465LG cable modem web interface.
//!
//! Every request to the modem must carry the anti-replay token the device
//! set in the `sessionToken` cookie of its previous response. [`Session`]
//! threads that token through all traffic, [`Modem`] layers the getter and
//! setter calls and the login lifecycle on top of it, and
//! [`FunctionScanner`] enumerates the undocumented getter functions.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod scanner;
pub mod session;
pub mod settings;
pub mod xml;

#[cfg(test)]
mod testing;

pub use client::{AuthState, Completion, LandingPage, Modem};
pub use config::{ModemConfig, ScanConfig};
pub use error::{Error, Result};
pub use protocol::{FunctionId, GetFunction, Params, SetFunction};
pub use scanner::{EnumerateSink, FileSink, FunctionScanner, ScanSink};
pub use session::{HttpBackend, ReqwestBackend, Session};

// Default configuration constants
pub const DEFAULT_CONFIG_FILE: &str = "compal.json";
pub const DEFAULT_HOST: &str = "192.168.178.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
