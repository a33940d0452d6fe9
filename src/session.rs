use secrecy::{ExposeSecret, SecretString};

/// Header Metabase reads the session id from.
pub const SESSION_HEADER: &str = "X-Metabase-Session";

/// Username/password pair exchanged once for a [`SessionToken`].
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Session id returned by `POST /api/session`.
///
/// The id is kept behind [`SecretString`] so `Debug` output is redacted;
/// it is only exposed when building the request header.
#[derive(Debug)]
pub struct SessionToken(SecretString);

impl SessionToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self(SecretString::from(id.into()))
    }

    /// Header name/value pair that authenticates subsequent requests.
    pub fn header(&self) -> (&'static str, &str) {
        (SESSION_HEADER, self.0.expose_secret())
    }
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct SessionRequest<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

impl<'a> SessionRequest<'a> {
    pub(crate) fn from_credentials(credentials: &'a Credentials) -> Self {
        Self {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
}
