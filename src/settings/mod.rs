//! Settings collaborators layered on the getter/setter primitives.

mod backup;
mod diagnostics;
mod misc;

pub use backup::BackupRestore;
pub use diagnostics::{Diagnostics, PingOptions, TracerouteOptions};
pub use misc::{MiscSettings, REMOTE_ACCESS_PORT};
