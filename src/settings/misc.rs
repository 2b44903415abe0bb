//! Miscellaneous device settings.

use crate::client::Modem;
use crate::error::Result;
use crate::protocol::{HttpResponse, Params, SetFunction};
use crate::session::HttpBackend;

/// Default port of the remote management interface.
pub const REMOTE_ACCESS_PORT: u16 = 8443;

pub struct MiscSettings<'a, B> {
    modem: &'a mut Modem<B>,
}

impl<'a, B: HttpBackend> MiscSettings<'a, B> {
    pub fn new(modem: &'a mut Modem<B>) -> Self {
        Self { modem }
    }

    pub async fn set_mtu(&mut self, size: u32) -> Result<HttpResponse> {
        self.modem
            .setter(SetFunction::MtuSize, Params::new().with("MTUSize", size))
            .await
    }

    /// Enable or disable remote access on `port`.
    pub async fn set_remote_access(&mut self, enabled: bool, port: u16) -> Result<HttpResponse> {
        // The firmware encodes on/off as 1/2, not 1/0.
        let flag = if enabled { 1 } else { 2 };
        self.modem
            .setter(
                SetFunction::RemoteAccess,
                Params::new().with("RemoteAccess", flag).with("Port", port),
            )
            .await
    }
}
