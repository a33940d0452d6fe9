use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::io::Read;
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result, summarize_error_body};
use crate::export::{ExportRequest, ExportResult};
use crate::session::{Credentials, SessionRequest, SessionResponse, SessionToken};
use crate::util::{normalize_endpoint, urljoin};

const SESSION_PATH: &str = "/api/session";

/// Default overall request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// Upper bound on the buffer reserved from a Content-Length header.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// Blocking client for the two Metabase endpoints the export needs.
///
/// No request is ever retried: every failure is reported to the caller.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    timeout: Duration,
    progress: bool,
    http: HttpClient,
}

impl Client {
    /// Creates a client for `endpoint`.
    ///
    /// `endpoint` may be a bare host (`metabase.example.com`), which is
    /// reached over plain `http://`, or a full `http(s)://` URL.
    pub fn new(endpoint: &str, verify: bool) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("metabase-export/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("metabase-export")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .connect_timeout(CONNECT_TIMEOUT);

        if !verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build()?;

        Ok(Self {
            url: normalize_endpoint(endpoint),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            progress: true,
            http,
        })
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        Self::new(&cfg.url, cfg.verify)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Base URL every request is joined onto.
    pub fn endpoint(&self) -> &str {
        &self.url
    }

    /// Exchanges a username and password for a session token.
    ///
    /// Any status other than 200 is reported as [`Error::Authentication`].
    pub fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken> {
        let url = urljoin(&self.url, SESSION_PATH);
        debug!(%url, username = %credentials.username, "requesting session");

        let resp = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&SessionRequest::from_credentials(credentials))
            .send()?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().unwrap_or_default();
            return Err(Error::Authentication {
                status,
                message: summarize_error_body(&text),
            });
        }

        let text = resp.text()?;
        let session: SessionResponse =
            serde_json::from_str(&text).map_err(|e| Error::UnexpectedResponse {
                url,
                reason: format!("invalid session response: {e}"),
            })?;

        Ok(SessionToken::new(session.id))
    }

    /// Downloads the rendered export and returns its bytes untouched.
    ///
    /// 401 maps to [`Error::Unauthorized`], 404 to [`Error::NotFound`] and
    /// every other non-200 status to [`Error::UnknownService`].
    pub fn export(&self, request: &ExportRequest, token: &SessionToken) -> Result<ExportResult> {
        let url = urljoin(&self.url, &request.path());
        debug!(%url, "requesting export");

        let (name, id) = token.header();
        let mut session = HeaderValue::from_str(id).map_err(|_| Error::UnexpectedResponse {
            url: urljoin(&self.url, SESSION_PATH),
            reason: "session id is not a valid header value".to_string(),
        })?;
        session.set_sensitive(true);

        let resp = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .header(name, session)
            .send()?;

        match resp.status() {
            StatusCode::OK => {
                let bytes = self.read_body(resp, &url)?;
                Ok(ExportResult {
                    bytes,
                    format: request.format,
                })
            }
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
            StatusCode::NOT_FOUND => Err(Error::NotFound { url }),
            status => {
                let body = resp.text().unwrap_or_default();
                Err(Error::UnknownService { status, body })
            }
        }
    }

    fn read_body(&self, mut resp: Response, url: &str) -> Result<Vec<u8>> {
        let total = resp.content_length();
        let pb = self.progress_bar(total);

        let reserve = total
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
            .min(MAX_PREALLOC);
        let mut bytes = Vec::with_capacity(reserve);

        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = resp.read(&mut buf).map_err(|source| Error::Read {
                url: url.to_string(),
                source,
            })?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&buf[..n]);
            if let Some(pb) = &pb {
                pb.inc(n as u64);
            }
        }

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        Ok(bytes)
    }

    fn progress_bar(&self, total: Option<u64>) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }

        let pb = match total {
            Some(len) => {
                let pb = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(
                    "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                ) {
                    pb.set_style(style.progress_chars("=>-"));
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::with_template("{spinner:.green} {bytes} ({bytes_per_sec})")
                {
                    pb.set_style(style);
                }
                pb
            }
        };
        Some(pb)
    }
}
