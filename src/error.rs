use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Process exit statuses reported by the `metabase-export` binary.
///
/// The numeric values are stable: schedulers branch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// The export was written.
    Success = 0,
    /// Local failure: configuration, filesystem or transport.
    Failure = 1,
    /// Login rejected, or the export request came back 401.
    InvalidCredentials = 200,
    /// The dashboard, dashcard or card does not exist (404).
    NotFound = 201,
    /// Any other non-success status from the service.
    UnknownServiceError = 202,
}

impl ExitStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// `POST /api/session` did not answer 200.
    #[error(
        "error getting credentials (HTTP {status}), check if username or password are correct\nserver message: {message}"
    )]
    Authentication { status: StatusCode, message: String },

    /// The export endpoint answered 401.
    #[error(
        "Metabase API returned an Unauthorized response, check if credentials are correct and try again"
    )]
    Unauthorized,

    /// The export endpoint answered 404.
    #[error("report id or run id not found (request: {url})")]
    NotFound { url: String },

    /// The export endpoint answered with a status we do not handle.
    #[error("Metabase returned an unknown status {status}\nreturned data: {body}")]
    UnknownService { status: StatusCode, body: String },

    /// A 200 response whose body did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    UnexpectedResponse { url: String, reason: String },

    #[error("unsupported file type `{0}` (expected one of: json, xlsx, csv)")]
    InvalidFormat(String),

    #[error("configuration error: {0:#}")]
    Config(#[from] anyhow::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read response body from {url}: {source}")]
    Read {
        url: String,
        source: std::io::Error,
    },

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Exit status the binary terminates with for this error.
    pub const fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Authentication { .. } | Self::Unauthorized => ExitStatus::InvalidCredentials,
            Self::NotFound { .. } => ExitStatus::NotFound,
            Self::UnknownService { .. } => ExitStatus::UnknownServiceError,
            Self::UnexpectedResponse { .. }
            | Self::InvalidFormat(_)
            | Self::Config(_)
            | Self::Http(_)
            | Self::Read { .. }
            | Self::Io { .. } => ExitStatus::Failure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, serde::Deserialize)]
pub(crate) struct MetabaseErrorResponse {
    #[serde(default)]
    pub(crate) message: Option<String>,
    // Login failures respond with {"errors": {"password": "did not match stored password"}}
    #[serde(default)]
    pub(crate) errors: Option<serde_json::Map<String, Value>>,
}

/// Condenses an error response body into a one-line server message.
pub(crate) fn summarize_error_body(text: &str) -> String {
    let text = text.trim();

    if let Ok(e) = serde_json::from_str::<MetabaseErrorResponse>(text) {
        if let Some(message) = e.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
        if let Some(errors) = e.errors.filter(|m| !m.is_empty()) {
            return errors
                .iter()
                .map(|(field, value)| match value {
                    Value::String(s) => format!("{field}: {s}"),
                    other => format!("{field}: {other}"),
                })
                .collect::<Vec<_>>()
                .join("; ");
        }
    }

    if text.is_empty() {
        "(empty response body)".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_exit_status() {
        let login = Error::Authentication {
            status: StatusCode::FORBIDDEN,
            message: String::new(),
        };
        assert_eq!(login.exit_status(), ExitStatus::InvalidCredentials);
        assert_eq!(Error::Unauthorized.exit_status(), ExitStatus::InvalidCredentials);
        assert_eq!(ExitStatus::InvalidCredentials.code(), 200);
    }

    #[test]
    fn service_errors_map_to_documented_codes() {
        let not_found = Error::NotFound {
            url: "http://mb/api/dashboard/1/dashcard/2/card/3/query/csv".into(),
        };
        assert_eq!(not_found.exit_status().code(), 201);

        let unknown = Error::UnknownService {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        };
        assert_eq!(unknown.exit_status().code(), 202);
        assert_eq!(ExitStatus::Success.code(), 0);
    }

    #[test]
    fn local_failures_exit_with_one() {
        let err = Error::InvalidFormat("pdf".into());
        assert_eq!(err.exit_status(), ExitStatus::Failure);

        let err = Error::Io {
            action: "open",
            path: PathBuf::from("/nope/out.csv"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.exit_status(), ExitStatus::Failure);
        assert!(err.to_string().contains("/nope/out.csv"));
    }

    #[test]
    fn unknown_service_message_carries_status_and_body() {
        let err = Error::UnknownService {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream exploded".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("upstream exploded"));
    }

    #[test]
    fn summarize_prefers_message_field() {
        let body = r#"{"message": "Too many attempts"}"#;
        assert_eq!(summarize_error_body(body), "Too many attempts");
    }

    #[test]
    fn summarize_flattens_field_errors() {
        let body = r#"{"errors": {"password": "did not match stored password"}}"#;
        assert_eq!(
            summarize_error_body(body),
            "password: did not match stored password"
        );
    }

    #[test]
    fn summarize_falls_back_to_raw_text() {
        assert_eq!(summarize_error_body("Unauthenticated\n"), "Unauthenticated");
        assert_eq!(summarize_error_body("  "), "(empty response body)");
        assert_eq!(summarize_error_body("{}"), "{}");
    }
}
