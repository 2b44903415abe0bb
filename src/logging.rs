//! Logging setup and redaction helpers for sensitive form fields.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Field names (case-insensitive substrings) that are redacted in logs.
const SENSITIVE_KEYS: &[&str] = &["password", "pskey", "presharedkey", "secret"];

/// Check whether a form field carries a secret.
pub fn is_sensitive(name: &str) -> bool {
    let name_l = name.to_lowercase();
    SENSITIVE_KEYS.iter().any(|k| name_l.contains(k))
}

/// Initialize tracing with env overrides.
///
/// Priority: RUST_LOG, then RUST_LOG_LEVEL (e.g. "debug"), then `verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let default_level = std::env::var("RUST_LOG_LEVEL").unwrap_or_else(|_| fallback.to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).without_time())
        .try_init()
        .ok();
}
