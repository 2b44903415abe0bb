//! Configuration backup and restore.

use bytes::Bytes;
use tracing::{error, info};

use crate::client::Modem;
use crate::error::{Error, Result};
use crate::protocol::{GetFunction, HttpResponse, Params, GETTER_PATH, RESTORE_FILENAME};
use crate::session::{HttpBackend, RedirectPolicy};
use crate::xml;

pub struct BackupRestore<'a, B> {
    modem: &'a mut Modem<B>,
}

impl<'a, B: HttpBackend> BackupRestore<'a, B> {
    pub fn new(modem: &'a mut Modem<B>) -> Self {
        Self { modem }
    }

    /// Vendor model, which names the backup file.
    pub async fn model(&mut self) -> Result<String> {
        let response = self
            .modem
            .getter(GetFunction::GlobalSettings, Params::new())
            .await?;
        xml::element_text(&response.body, "ConfigVenderModel")?
            .filter(|model| !model.is_empty())
            .ok_or_else(|| Error::invalid_response("global settings carry no ConfigVenderModel"))
    }

    /// Download the configuration file. `None` when the device refuses it.
    pub async fn backup(&mut self) -> Result<Option<Bytes>> {
        let model = self.model().await?;
        let path = format!("{GETTER_PATH}?filename={model}-Cfg.bin");

        let response = self.modem.get(&path, RedirectPolicy::Stop).await?;
        if !response.is_ok() {
            error!("Did not get configfile response! Wrong config file name?");
            return Ok(None);
        }

        info!(model = %model, len = response.body.len(), "Configuration downloaded");
        Ok(Some(response.body))
    }

    /// Upload a configuration file previously produced by [`backup`](Self::backup).
    pub async fn restore(&mut self, data: Bytes) -> Result<HttpResponse> {
        info!("Restoring config. Modem will be unresponsive for a while");
        let path = format!("{GETTER_PATH}?Restore={}", data.len());
        self.modem.post_binary(&path, data, RESTORE_FILENAME).await
    }
}
