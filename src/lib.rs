//! Download a Metabase dashboard card's query results as a file.
//!
//! The flow is two requests:
//! log in with `POST /api/session`, then fetch the rendered export from
//! `POST /api/dashboard/{id}/dashcard/{id}/card/{id}/query/{format}`
//! and write the body to disk unchanged.
//!
//! ## Quick start
//! - Configure the endpoint and credentials via CLI flags, environment variables
//!   (`METABASE_URL`, `METABASE_USERNAME`, `METABASE_PASSWORD`) or a `.metabaserc`
//!   file (supported in the current directory and in your home directory).
//! - Call [`run`] with an [`ExportJob`], or drive [`Client`] directly.
//!
//! ```no_run
//! use metabase_export::{Client, Credentials, ExportFormat, ExportRequest};
//!
//! fn main() -> metabase_export::Result<()> {
//!     let client = Client::new("https://metabase.example.com", true)?;
//!     let token = client.authenticate(&Credentials::new("ana@example.com", "secret"))?;
//!     let export = client.export(&ExportRequest::new(5, 9, 3, ExportFormat::Csv), &token)?;
//!     std::fs::write("out.csv", &export.bytes).expect("write export");
//!     Ok(())
//! }
//! ```
//!
//! Every failure is returned as an [`Error`]; [`Error::exit_status`] gives the
//! process exit status the `metabase-export` binary uses for it.

#![forbid(unsafe_code)]

pub mod cli;
mod client;
mod config;
mod error;
mod export;
pub mod logging;
mod run;
mod session;
mod util;

pub use client::{Client, DEFAULT_TIMEOUT_SECS};
pub use config::{ClientConfig, ConfigOverrides, load_config};
pub use error::{Error, ExitStatus, Result};
pub use export::{ExportFormat, ExportRequest, ExportResult};
pub use run::{ExportJob, prepare_destination, run, write_export};
pub use session::{Credentials, SESSION_HEADER, SessionToken};
