//! Modem client: getter/setter primitives and the login lifecycle.

mod state;

pub use state::{AuthState, LandingPage};

use bytes::Bytes;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::ModemConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    FunctionId, GetFunction, HttpResponse, Params, SetFunction, ACCESS_DENIED_PAGE,
    ADMIN_USERNAME, GETTER_PATH, SETTER_PATH, SID_COOKIE,
};
use crate::session::{HttpBackend, RedirectPolicy, ReqwestBackend, Session};

/// Result of a request the device may never answer.
#[derive(Debug)]
pub enum Completion {
    /// The device answered.
    Acknowledged(HttpResponse),
    /// The request timed out; the device stopped responding mid-operation,
    /// which is what it does when the operation takes effect.
    NoResponse,
}

impl Completion {
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Completion::Acknowledged(response) => Some(response),
            Completion::NoResponse => None,
        }
    }
}

/// Client for one modem.
///
/// The device allows a single session system-wide, and every request must
/// carry the token of the previous response, so a `Modem` is used from one
/// task at a time.
pub struct Modem<B = ReqwestBackend> {
    session: Session<B>,
    secret: Option<String>,
    state: AuthState,
    landing: LandingPage,
    set_up: bool,
}

impl Modem<ReqwestBackend> {
    /// Connect to the modem described by `config`.
    pub async fn connect(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        let backend = ReqwestBackend::new(config.timeout())?;
        Self::with_backend(config, backend).await
    }
}

impl<B: HttpBackend> Modem<B> {
    /// Connect through the given backend.
    ///
    /// Issues the initial `GET /`. A device still on its first-installation
    /// page is set up right away; landing anywhere but the login page is
    /// reported as a possible concurrent session.
    pub async fn with_backend(config: &ModemConfig, backend: B) -> Result<Self> {
        let session = Session::new(backend, &config.host)?;
        let mut modem = Self {
            session,
            secret: config.password.clone(),
            state: AuthState::Unauthenticated,
            landing: LandingPage::Login,
            set_up: false,
        };

        debug!("Getting initial token");
        let initial = modem.session.get("/", RedirectPolicy::Follow).await?;
        modem.landing = LandingPage::from_url(&initial.url);

        match &modem.landing {
            LandingPage::Login => debug!("Landed on login page"),
            LandingPage::FirstInstallation => modem.initial_setup(None).await?,
            LandingPage::Other(url) => {
                warn!(url = %url, "Was not redirected to login page: concurrent session?")
            }
        }

        Ok(modem)
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn landing(&self) -> &LandingPage {
        &self.landing
    }

    /// Whether this client ran the first-installation sequence.
    pub fn performed_initial_setup(&self) -> bool {
        self.set_up
    }

    pub fn session(&self) -> &Session<B> {
        &self.session
    }

    /// Call `/xml/getter.xml` for the given function.
    pub async fn getter(&mut self, function: impl Into<FunctionId>, params: Params) -> Result<HttpResponse> {
        self.ensure_usable()?;
        let function = function.into();
        self.session.post(GETTER_PATH, Some(function.code()), params).await
    }

    /// Call `/xml/setter.xml` for the given function.
    pub async fn setter(&mut self, function: SetFunction, params: Params) -> Result<HttpResponse> {
        self.ensure_usable()?;
        self.session.post(SETTER_PATH, Some(function.code()), params).await
    }

    /// Plain GET relative to the web root.
    pub async fn get(&mut self, path: &str, redirects: RedirectPolicy) -> Result<HttpResponse> {
        self.ensure_usable()?;
        self.session.get(path, redirects).await
    }

    /// Raw file upload relative to the web root.
    pub async fn post_binary(&mut self, path: &str, data: Bytes, filename: &str) -> Result<HttpResponse> {
        self.ensure_usable()?;
        self.session.post_binary(path, data, filename).await
    }

    /// Log in as admin, optionally overriding the configured password.
    pub async fn login(&mut self, secret: Option<&str>) -> Result<HttpResponse> {
        let password = match secret {
            Some(s) => s.to_string(),
            None => self.secret.clone().ok_or(Error::MissingCredential)?,
        };

        let response = self.setter(SetFunction::Login, login_params(&password)).await?;
        match check_login(&response) {
            Ok(sid) => {
                info!("[login] SID {}", sid);
                self.session.install_cookie(SID_COOKIE, &sid);
                self.state = AuthState::Authenticated;
                Ok(response)
            }
            Err(e) => {
                self.state = AuthState::Unauthenticated;
                Err(e)
            }
        }
    }

    /// Log out. The device only allows one session, so do this before
    /// leaving; logging out an already-closed session is accepted.
    pub async fn logout(&mut self) -> Result<HttpResponse> {
        let response = self.setter(SetFunction::Logout, Params::new()).await?;
        self.session.remove_cookie(SID_COOKIE);
        self.state = AuthState::Unauthenticated;
        info!("Logged out");
        Ok(response)
    }

    /// Replay the settings the web UI makes on a factory-fresh device.
    pub async fn initial_setup(&mut self, new_secret: Option<&str>) -> Result<()> {
        if self.landing != LandingPage::FirstInstallation {
            return Err(Error::invalid_state(
                "initial setup requires the first-installation page",
            ));
        }
        if let Some(secret) = new_secret {
            self.secret = Some(secret.to_string());
        }
        let secret = self
            .secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(Error::MissingCredential)?;

        info!("Initial setup: english.");
        self.getter(GetFunction::MultiLang, Params::new()).await?;
        self.getter(GetFunction::LangSetList, Params::new()).await?;
        self.getter(GetFunction::MultiLang, Params::new()).await?;

        self.setter(SetFunction::Language, Params::new().with("lang", "en"))
            .await?;
        // Sets the admin password on a fresh device.
        self.setter(SetFunction::Login, login_params(&secret)).await?;
        self.getter(GetFunction::WirelessBasic, Params::new()).await?;

        self.setter(
            SetFunction::InstallDone,
            Params::new().with("install", 0).with("iv", 1).with("en", 0),
        )
        .await?;

        self.landing = LandingPage::Login;
        self.set_up = true;
        info!("Initial setup done");
        Ok(())
    }

    /// Reboot the modem.
    pub async fn reboot(&mut self) -> Result<Completion> {
        info!("Performing a reboot - this will take a while");
        let completion = self.fire_and_forget(SetFunction::Reboot).await?;
        self.state = AuthState::Terminated;
        Ok(completion)
    }

    /// Factory-reset the modem, returning the default-value snapshot read
    /// just before the reset.
    pub async fn factory_reset(&mut self) -> Result<HttpResponse> {
        let defaults = self.getter(GetFunction::DefaultValue, Params::new()).await?;

        info!("Initiating factory reset - this will take a while");
        self.fire_and_forget(SetFunction::FactoryReset).await?;
        self.state = AuthState::Terminated;
        Ok(defaults)
    }

    async fn fire_and_forget(&mut self, function: SetFunction) -> Result<Completion> {
        match self.setter(function, Params::new()).await {
            Ok(response) => Ok(Completion::Acknowledged(response)),
            Err(Error::TransportTimeout) => {
                debug!(?function, "No response, assuming the device is busy");
                Ok(Completion::NoResponse)
            }
            Err(e) => Err(e),
        }
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.state.is_usable() {
            Ok(())
        } else {
            Err(Error::invalid_state("session terminated by reboot or reset"))
        }
    }
}

fn login_params(password: &str) -> Params {
    Params::new()
        .with("Username", ADMIN_USERNAME)
        .with("Password", password)
}

/// Interpret a login response, returning the session id.
fn check_login(response: &HttpResponse) -> Result<String> {
    if !response.is_ok() {
        let denied = response
            .location()
            .is_some_and(|location| location.ends_with(ACCESS_DENIED_PAGE));
        return Err(if denied {
            Error::AccessDenied
        } else {
            Error::LoginFailedUnknown {
                status: response.status_code,
            }
        });
    }

    parse_sid(&response.text()).ok_or(Error::InvalidCredentials)
}

/// Extract `SID` from a query-string style body such as `successful;SID=123`.
fn parse_sid(body: &str) -> Option<String> {
    let normalized = body.trim().replace(';', "&");
    form_urlencoded::parse(normalized.as_bytes())
        .find(|(name, value)| name == SID_COOKIE && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
