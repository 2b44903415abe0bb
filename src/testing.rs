//! In-process fakes for exercising the client without a modem.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::{form_urlencoded, Url};

use crate::error::{Error, Result};
use crate::protocol::{HttpRequest, HttpResponse, Method};
use crate::session::HttpBackend;

type Handler = Box<dyn FnMut(&HttpRequest) -> Result<HttpResponse> + Send>;

/// Backend that records every request and answers from a handler.
pub struct FakeBackend {
    handler: Mutex<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeBackend {
    pub fn new(handler: impl FnMut(&HttpRequest) -> Result<HttpResponse> + Send + 'static) -> Self {
        Self {
            handler: Mutex::new(Box::new(handler)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer with `responses` in order.
    pub fn scripted(responses: Vec<Result<HttpResponse>>) -> Self {
        let mut queue: VecDeque<_> = responses.into();
        Self::new(move |request| {
            queue
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request: {} {}", request.method.as_str(), request.url))
        })
    }

    /// Answer from a simulated device.
    pub fn device(device: Arc<Mutex<FakeModem>>) -> Self {
        Self::new(move |request| device.lock().unwrap().handle(request))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpBackend for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut handler = self.handler.lock().unwrap();
        (handler.as_mut())(&request)
    }
}

pub fn ok(body: &str) -> HttpResponse {
    HttpResponse::new(200, "").with_body(body.to_string())
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::new(302, "").with_header("Location", location)
}

pub fn with_token(response: HttpResponse, token: &str) -> HttpResponse {
    response.with_header("Set-Cookie", &format!("sessionToken={token}; path=/"))
}

/// Form fields of a request body, in order.
pub fn form_fields(request: &HttpRequest) -> Vec<(String, String)> {
    form_urlencoded::parse(&request.body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Where `GET /` lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Login,
    FirstInstall,
    Elsewhere,
}

/// What a getter probe at a given position returns.
#[derive(Debug, Clone)]
pub enum Probe {
    Body(String),
    Empty,
    Status(u16),
}

/// Small stateful model of the modem's web interface.
///
/// Rotates `sessionToken` on every response, rejects requests whose `token`
/// field is stale, enforces the single session, and answers getter probes
/// from a table.
pub struct FakeModem {
    pub landing: Landing,
    pub password: String,
    pub logged_in: bool,
    pub other_session_active: bool,
    pub sid: String,
    pub probes: HashMap<u32, Probe>,
    /// Positions whose first probe drops the session.
    pub drop_session_at: HashSet<u32>,
    /// Setter functions that never answer.
    pub timeout_setters: HashSet<u32>,
    pub config_blob: Vec<u8>,
    pub model: String,
    pub token_counter: u64,
    pub stale_tokens: usize,
    pub calls: Vec<(String, Vec<(String, String)>)>,
}

impl Default for FakeModem {
    fn default() -> Self {
        Self {
            landing: Landing::Login,
            password: "secret".to_string(),
            logged_in: false,
            other_session_active: false,
            sid: "abc123".to_string(),
            probes: HashMap::new(),
            drop_session_at: HashSet::new(),
            timeout_setters: HashSet::new(),
            config_blob: b"CFG\x00\x01\x02".to_vec(),
            model: "CH7465LG".to_string(),
            token_counter: 100,
            stale_tokens: 0,
            calls: Vec::new(),
        }
    }
}

impl FakeModem {
    pub fn shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    fn current_token(&self) -> String {
        self.token_counter.to_string()
    }

    fn respond(&mut self, response: HttpResponse) -> Result<HttpResponse> {
        self.token_counter += 1;
        let token = self.current_token();
        Ok(with_token(response, &token))
    }

    pub fn handle(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = Url::parse(&request.url).map_err(|e| Error::transport(e.to_string()))?;
        let path = url.path().to_string();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        match (request.method, path.as_str()) {
            (Method::Get, "/") => {
                let target = match self.landing {
                    Landing::Login => "/common_page/login.html",
                    Landing::FirstInstall => "/common_page/FirstInstallation.html",
                    Landing::Elsewhere => "/index.html",
                };
                self.respond(redirect(target))
            }
            (Method::Get, "/xml/getter.xml") => match query.get("filename") {
                Some(name) if *name == format!("{}-Cfg.bin", self.model) && self.logged_in => {
                    let blob = self.config_blob.clone();
                    self.respond(HttpResponse::new(200, "").with_body(blob))
                }
                _ => self.respond(redirect("/common_page/login.html")),
            },
            (Method::Get, _) => self.respond(ok("<html/>")),
            (Method::Post, "/xml/getter.xml") if query.contains_key("Restore") => {
                self.config_blob = request.body.to_vec();
                self.respond(ok(""))
            }
            (Method::Post, "/xml/getter.xml") => self.getter(request),
            (Method::Post, "/xml/setter.xml") => self.setter(request),
            _ => self.respond(HttpResponse::new(404, "")),
        }
    }

    fn check_token(&mut self, fields: &[(String, String)]) -> bool {
        let fresh = fields.first().map(|(k, v)| k == "token" && *v == self.current_token());
        if fresh != Some(true) {
            self.stale_tokens += 1;
        }
        fresh == Some(true)
    }

    fn getter(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let fields = form_fields(request);
        self.calls.push(("getter".to_string(), fields.clone()));
        if !self.check_token(&fields) {
            return self.respond(ok(""));
        }
        let fun: u32 = fields
            .get(1)
            .filter(|(k, _)| k == "fun")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);

        if !self.logged_in {
            return match fun {
                1 | 3 | 21 => self.respond(ok("<lang>en</lang>")),
                2 => self.respond(redirect("../common_page/login.html")),
                _ => self.respond(ok("")),
            };
        }
        if self.drop_session_at.remove(&fun) {
            self.logged_in = false;
            return self.respond(ok(""));
        }

        let response = match fun {
            1 => ok(&format!(
                "<GlobalSettings><ConfigVenderModel>{}</ConfigVenderModel></GlobalSettings>",
                self.model
            )),
            2 => ok("<cm_system_info><cm_docsis_mode>DOCSIS 3.0</cm_docsis_mode></cm_system_info>"),
            6 => ok("<DefaultValue><wlSsid2g>Ziggo</wlSsid2g></DefaultValue>"),
            126 => ok("<Ping>64 bytes from 8.8.8.8: &lt;1ms&gt;</Ping>"),
            128 => ok("<Tracert>1  192.168.178.1 &amp; done</Tracert>"),
            _ => match self.probes.get(&fun) {
                Some(Probe::Body(body)) => ok(body),
                Some(Probe::Empty) => ok(""),
                Some(Probe::Status(status)) => HttpResponse::new(*status, ""),
                None => ok(&format!("<fun{fun}/>")),
            },
        };
        self.respond(response)
    }

    fn setter(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let fields = form_fields(request);
        self.calls.push(("setter".to_string(), fields.clone()));
        if !self.check_token(&fields) {
            return self.respond(ok(""));
        }
        let fun: u32 = fields
            .get(1)
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        if self.timeout_setters.contains(&fun) {
            return Err(Error::TransportTimeout);
        }

        match fun {
            15 => {
                if self.other_session_active {
                    return self.respond(redirect("../common_page/Access-denied.html"));
                }
                let password = fields
                    .iter()
                    .find(|(k, _)| k == "Password")
                    .map(|(_, v)| v.as_str());
                if password == Some(self.password.as_str()) {
                    self.logged_in = true;
                    let body = format!("successful;SID={}", self.sid);
                    self.respond(ok(&body))
                } else {
                    self.respond(ok("idloginincorrect"))
                }
            }
            16 => {
                self.logged_in = false;
                self.respond(ok(""))
            }
            _ => self.respond(ok("")),
        }
    }
}
