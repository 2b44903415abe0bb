//! Modem web interface protocol.
//!
//! This module contains:
//! - Constants: endpoints, cookie names, landing pages
//! - Functions: getter/setter function identifiers
//! - Envelope: ordered form bodies
//! - HTTP: request/response types

mod constants;
mod envelope;
mod functions;
mod http;

pub use constants::*;
pub use envelope::{Params, Redacted, RequestEnvelope};
pub use functions::{FunctionId, GetFunction, SetFunction};
pub use http::{HttpRequest, HttpResponse, Method};
