//! Getter function scanner.
//!
//! Walks the integer space of getter functions and reports every position
//! that answers with a document. The modem answers a getter with an empty
//! body both for unused functions and when the session was dropped; the
//! scanner tells the two apart with a probe to a function that always
//! answers, logs in again when the session is gone, and retries the same
//! position so no function is skipped because of a lost session.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::client::Modem;
use crate::error::{Error, Result};
use crate::protocol::{FunctionId, GetFunction, HttpResponse, Params};
use crate::session::HttpBackend;
use crate::xml;

/// Scanner states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Next step probes the cursor position.
    Probing,
    /// Session was lost; next step logs in again.
    AwaitingReauth,
    /// A non-200 response ended the scan.
    Failed(u16),
    /// The last identifier was probed.
    Exhausted,
}

/// A position that answered with a document.
#[derive(Debug, Clone)]
pub struct FunctionHit {
    pub position: FunctionId,
    pub response: HttpResponse,
}

/// Outcome of one [`FunctionScanner::step`].
#[derive(Debug)]
pub enum ScanStep {
    /// Position answered with a document; cursor advanced.
    Hit(FunctionHit),
    /// Position answered 200 with nothing on a valid session; cursor advanced.
    Skipped(FunctionId),
    /// Empty answer and the session is gone; cursor kept.
    SessionLost(FunctionId),
    /// Logged in again; the same position is probed next.
    Reauthenticated(FunctionId),
}

/// Receives scan results.
#[async_trait]
pub trait ScanSink: Send {
    async fn record(&mut self, hit: &FunctionHit) -> Result<()>;
}

/// Scanner over the getter function space of one modem.
pub struct FunctionScanner<'a, B> {
    modem: &'a mut Modem<B>,
    cursor: FunctionId,
    secret: Option<String>,
    last_login: Option<FunctionId>,
    state: ScanState,
    quiet: bool,
}

impl<'a, B: HttpBackend> FunctionScanner<'a, B> {
    /// Start scanning at `start`. `secret` overrides the configured password
    /// for re-authentication.
    pub fn new(modem: &'a mut Modem<B>, start: impl Into<FunctionId>, secret: Option<String>) -> Self {
        Self {
            modem,
            cursor: start.into(),
            secret,
            last_login: None,
            state: ScanState::Probing,
            quiet: false,
        }
    }

    /// Suppress per-position progress logging.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn cursor(&self) -> FunctionId {
        self.cursor
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Position at which the scanner last had to log in.
    pub fn last_login_position(&self) -> Option<FunctionId> {
        self.last_login
    }

    /// Check whether the session still answers the always-present
    /// system-info getter.
    pub async fn is_valid_session(&mut self) -> Result<bool> {
        debug!(last_login = ?self.last_login, "Checking session");
        let response = self
            .modem
            .getter(GetFunction::CmSystemInfo, Params::new())
            .await?;
        Ok(response.is_ok())
    }

    /// Advance the state machine by one request (two when the session is
    /// checked).
    pub async fn step(&mut self) -> Result<ScanStep> {
        match self.state {
            ScanState::Failed(status) => Err(Error::ScanHttpError(status)),
            ScanState::Exhausted => Err(Error::invalid_state("function space exhausted")),
            ScanState::AwaitingReauth => {
                self.modem.login(self.secret.as_deref()).await?;
                self.last_login = Some(self.cursor);
                self.state = ScanState::Probing;
                if !self.quiet {
                    info!("Had to login at index {}", self.cursor);
                }
                Ok(ScanStep::Reauthenticated(self.cursor))
            }
            ScanState::Probing => {
                if !self.quiet {
                    info!("func={}", self.cursor);
                }
                let response = self.modem.getter(self.cursor, Params::new()).await?;

                if response.is_empty_body() && !self.is_valid_session().await? {
                    self.state = ScanState::AwaitingReauth;
                    return Ok(ScanStep::SessionLost(self.cursor));
                }
                if !response.is_ok() {
                    self.state = ScanState::Failed(response.status_code);
                    return Err(Error::ScanHttpError(response.status_code));
                }

                let position = self.cursor;
                match self.cursor.next() {
                    Some(next) => self.cursor = next,
                    None => self.state = ScanState::Exhausted,
                }
                if response.is_empty_body() {
                    Ok(ScanStep::Skipped(position))
                } else {
                    Ok(ScanStep::Hit(FunctionHit { position, response }))
                }
            }
        }
    }

    /// Step until a position answers with a document.
    pub async fn next_hit(&mut self) -> Result<FunctionHit> {
        loop {
            if let ScanStep::Hit(hit) = self.step().await? {
                return Ok(hit);
            }
        }
    }

    /// Feed hits into `sink` until the cursor passes `end`, or until the
    /// identifier space runs out when `end` is `None`. Returns the number of
    /// hits recorded.
    pub async fn run<S: ScanSink>(&mut self, sink: &mut S, end: Option<FunctionId>) -> Result<u64> {
        let mut hits = 0;
        while self.state != ScanState::Exhausted && end.map_or(true, |end| self.cursor <= end) {
            if let ScanStep::Hit(hit) = self.step().await? {
                sink.record(&hit).await?;
                hits += 1;
            }
        }
        Ok(hits)
    }
}

/// Writes every hit to `func_<n>.xml` in a directory.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, position: FunctionId) -> PathBuf {
        self.dir.join(format!("func_{position}.xml"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ScanSink for FileSink {
    async fn record(&mut self, hit: &FunctionHit) -> Result<()> {
        let mut out = String::from("===== HEADERS =====\n");
        for (name, value) in &hit.response.headers {
            out.push_str(&format!("{name}: {value}\n"));
        }
        out.push_str("===== DATA ======\n");
        match xml::pretty_print(&hit.response.body) {
            Ok(pretty) => out.push_str(&pretty),
            Err(_) => out.push_str(&hit.response.text()),
        }

        let path = self.path_for(hit.position);
        tokio::fs::write(&path, out).await?;
        debug!(path = %path.display(), "Wrote scan result");
        Ok(())
    }
}

/// Logs `<ROOT TAG> = <n>` for every hit.
#[derive(Debug, Default)]
pub struct EnumerateSink {
    found: Vec<(FunctionId, String)>,
}

impl EnumerateSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(position, root tag)` pairs seen so far.
    pub fn found(&self) -> &[(FunctionId, String)] {
        &self.found
    }
}

#[async_trait]
impl ScanSink for EnumerateSink {
    async fn record(&mut self, hit: &FunctionHit) -> Result<()> {
        match xml::root_tag(&hit.response.body) {
            Ok(tag) => {
                let tag = tag.to_uppercase();
                info!("{} = {}", tag, hit.position);
                self.found.push((hit.position, tag));
            }
            // The firmware emits broken XML for some functions.
            Err(e) => warn!(position = %hit.position, "Unparseable response: {}", e),
        }
        Ok(())
    }
}
