//! Modem web interface constants.

/// Getter endpoint (read configuration).
pub const GETTER_PATH: &str = "/xml/getter.xml";

/// Setter endpoint (mutate configuration).
pub const SETTER_PATH: &str = "/xml/setter.xml";

/// Anti-replay token cookie, rotated by every response.
pub const TOKEN_COOKIE: &str = "sessionToken";

/// Session identity cookie, installed after login.
pub const SID_COOKIE: &str = "SID";

/// Form field carrying the anti-replay token. Always first.
pub const TOKEN_FIELD: &str = "token";

/// Form field carrying the function identifier. Always second.
pub const FUN_FIELD: &str = "fun";

/// Landing page of a device that has never been set up.
pub const FIRST_INSTALL_PAGE: &str = "common_page/FirstInstallation.html";

/// Ordinary landing page.
pub const LOGIN_PAGE: &str = "common_page/login.html";

/// Redirect target when another session holds the device.
pub const ACCESS_DENIED_PAGE: &str = "common_page/Access-denied.html";

/// The only account the firmware knows.
pub const ADMIN_USERNAME: &str = "admin";

/// Filename announced when uploading a configuration restore.
pub const RESTORE_FILENAME: &str = "Config_Restore.bin";

/// Content type for form posts.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Content type for binary uploads.
pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";

/// Maximum redirect hops followed by a GET.
pub const MAX_REDIRECTS: usize = 3;
