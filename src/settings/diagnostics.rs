//! Ping and traceroute run by the modem itself.

use tracing::info;

use crate::client::Modem;
use crate::error::Result;
use crate::protocol::{GetFunction, HttpResponse, Params, SetFunction};
use crate::session::HttpBackend;
use crate::xml;

/// Parameters of a ping test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingOptions {
    pub size: u32,
    pub count: u32,
    /// Seconds between echo requests.
    pub interval: u32,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            size: 64,
            count: 3,
            interval: 10,
        }
    }
}

/// Parameters of a traceroute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracerouteOptions {
    pub max_hops: u32,
    pub data_size: u32,
    pub base_port: u16,
    pub resolve_host: bool,
}

impl Default for TracerouteOptions {
    fn default() -> Self {
        Self {
            max_hops: 30,
            data_size: 32,
            base_port: 33434,
            resolve_host: false,
        }
    }
}

pub struct Diagnostics<'a, B> {
    modem: &'a mut Modem<B>,
}

impl<'a, B: HttpBackend> Diagnostics<'a, B> {
    pub fn new(modem: &'a mut Modem<B>) -> Self {
        Self { modem }
    }

    /// Start a ping; poll [`ping_result`](Self::ping_result) for the output.
    pub async fn ping(&mut self, target: &str, options: PingOptions) -> Result<HttpResponse> {
        info!(host = %target, count = options.count, "Starting ping");
        let params = Params::new()
            .with("Type", 0)
            .with("Target_IP", target)
            .with("Ping_Size", options.size)
            .with("Num_Ping", options.count)
            .with("Ping_Interval", options.interval);
        self.modem.setter(SetFunction::PingTest, params).await
    }

    /// Start a traceroute; poll [`traceroute_result`](Self::traceroute_result).
    pub async fn traceroute(&mut self, target: &str, options: TracerouteOptions) -> Result<HttpResponse> {
        info!(host = %target, max_hops = options.max_hops, "Starting traceroute");
        let params = Params::new()
            .with("type", 1)
            .with("Tracert_IP", target)
            .with("MaxHops", options.max_hops)
            .with("DataSize", options.data_size)
            .with("BasePort", options.base_port)
            .with("ResolveHost", u8::from(options.resolve_host));
        self.modem.setter(SetFunction::Traceroute, params).await
    }

    pub async fn ping_result(&mut self) -> Result<String> {
        self.result(GetFunction::PingResult).await
    }

    pub async fn traceroute_result(&mut self) -> Result<String> {
        self.result(GetFunction::TracerouteResult).await
    }

    /// Stop a running diagnostic by process name, e.g. `ping` is sent as
    /// `Ping=ping`.
    pub async fn cancel(&mut self, command: &str) -> Result<String> {
        let lower = command.to_lowercase();
        let mut chars = lower.chars();
        let key: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        self.cancel_pair(&key, &lower).await
    }

    /// Stop a running diagnostic with an explicit field.
    pub async fn cancel_pair(&mut self, key: &str, value: &str) -> Result<String> {
        let response = self
            .modem
            .setter(SetFunction::DiagnosticsCancel, Params::new().with(key, value))
            .await?;
        Ok(response.text())
    }

    async fn result(&mut self, function: GetFunction) -> Result<String> {
        let response = self.modem.getter(function, Params::new()).await?;
        Ok(xml::unescape(&response.text()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModemConfig;
    use crate::testing::{ok, FakeBackend, FakeModem};

    async fn logged_in() -> Modem<FakeBackend> {
        let device = FakeModem::default().shared();
        let config = ModemConfig::new("192.168.0.1", Some("secret".into()));
        let mut modem = Modem::with_backend(&config, FakeBackend::device(device))
            .await
            .unwrap();
        modem.login(None).await.unwrap();
        modem
    }

    fn last_fields(modem: &Modem<FakeBackend>) -> Vec<(String, String)> {
        let requests = modem.session().backend().requests();
        crate::testing::form_fields(requests.last().unwrap())
    }

    fn names(fields: &[(String, String)]) -> Vec<&str> {
        fields.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[tokio::test]
    async fn test_ping_fields() {
        let mut modem = logged_in().await;
        Diagnostics::new(&mut modem)
            .ping("8.8.8.8", PingOptions::default())
            .await
            .unwrap();

        let fields = last_fields(&modem);
        assert_eq!(
            names(&fields),
            ["token", "fun", "Type", "Target_IP", "Ping_Size", "Num_Ping", "Ping_Interval"]
        );
        let values: Vec<&str> = fields[1..].iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, ["126", "0", "8.8.8.8", "64", "3", "10"]);
    }

    #[tokio::test]
    async fn test_traceroute_fields() {
        let mut modem = logged_in().await;
        let options = TracerouteOptions {
            resolve_host: true,
            ..Default::default()
        };
        Diagnostics::new(&mut modem)
            .traceroute("example.com", options)
            .await
            .unwrap();

        let fields = last_fields(&modem);
        assert_eq!(
            names(&fields),
            ["token", "fun", "type", "Tracert_IP", "MaxHops", "DataSize", "BasePort", "ResolveHost"]
        );
        assert_eq!(fields[1].1, "127");
        assert_eq!(fields[7].1, "1");
    }

    #[tokio::test]
    async fn test_results_are_unescaped() {
        let mut modem = logged_in().await;
        let mut diagnostics = Diagnostics::new(&mut modem);

        let ping = diagnostics.ping_result().await.unwrap();
        assert_eq!(ping, "<Ping>64 bytes from 8.8.8.8: <1ms></Ping>");

        let trace = diagnostics.traceroute_result().await.unwrap();
        assert_eq!(trace, "<Tracert>1  192.168.178.1 & done</Tracert>");
    }

    #[tokio::test]
    async fn test_results_tolerate_html_entities() {
        let backend = FakeBackend::scripted(vec![
            Ok(ok("<html/>")),
            Ok(ok("<Ping>64 bytes&nbsp;from 8.8.8.8 & done</Ping>")),
        ]);
        let config = ModemConfig::new("192.168.0.1", Some("secret".into()));
        let mut modem = Modem::with_backend(&config, backend).await.unwrap();

        let ping = Diagnostics::new(&mut modem).ping_result().await.unwrap();
        assert_eq!(ping, "<Ping>64 bytes\u{a0}from 8.8.8.8 & done</Ping>");
    }

    #[tokio::test]
    async fn test_cancel_capitalizes_key() {
        let mut modem = logged_in().await;
        Diagnostics::new(&mut modem).cancel("PING").await.unwrap();

        let fields = last_fields(&modem);
        assert_eq!(fields[1].1, "128");
        assert_eq!(fields[2], ("Ping".to_string(), "ping".to_string()));
    }

    #[tokio::test]
    async fn test_cancel_pair() {
        let mut modem = logged_in().await;
        Diagnostics::new(&mut modem)
            .cancel_pair("Tracert", "tracert")
            .await
            .unwrap();

        let fields = last_fields(&modem);
        assert_eq!(fields[2], ("Tracert".to_string(), "tracert".to_string()));
    }
}
