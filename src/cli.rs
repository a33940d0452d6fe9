//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{Client, DEFAULT_TIMEOUT_SECS};
use crate::config::{ConfigOverrides, load_config};
use crate::error::Result;
use crate::export::{ExportFormat, ExportRequest};
use crate::run::{ExportJob, run};

/// Download a Metabase dashboard card's query results as a file.
#[derive(Parser, Debug)]
#[command(name = "metabase-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Metabase host (`metabase.example.com`) or URL (`https://metabase.example.com`).
    /// Falls back to METABASE_URL or `.metabaserc`.
    #[arg(long)]
    pub metabase_url: Option<String>,

    /// Falls back to METABASE_USERNAME or `.metabaserc`.
    #[arg(long)]
    pub username: Option<String>,

    /// Falls back to METABASE_PASSWORD or `.metabaserc`.
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub dashboard_id: u64,

    #[arg(long)]
    pub dashcard_id: u64,

    #[arg(long)]
    pub card_id: u64,

    /// Name of the file to write.
    #[arg(long)]
    pub dest_file_name: String,

    /// Folder to write into; created if missing. Defaults to the current directory.
    #[arg(long)]
    pub dest_folder_name: Option<PathBuf>,

    /// Export format.
    #[arg(long, value_enum, ignore_case = true)]
    pub file_type: ExportFormat,

    /// Accept invalid TLS certificates.
    #[arg(long)]
    pub no_verify: bool,

    /// Overall request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Do not draw a download progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn request(&self) -> ExportRequest {
        ExportRequest::new(self.dashboard_id, self.dashcard_id, self.card_id, self.file_type)
    }

    pub fn job(&self) -> ExportJob {
        ExportJob {
            request: self.request(),
            dest_file_name: self.dest_file_name.clone(),
            dest_folder: self.dest_folder_name.clone(),
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.metabase_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            verify: self.no_verify.then_some(false),
        }
    }

    /// Resolves configuration and runs the export. Returns the written path.
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg = load_config(self.overrides())?;
        let client = Client::from_config(&cfg)?
            .with_timeout(Duration::from_secs(self.timeout))
            .with_progress(!self.no_progress);

        run(&client, cfg.credentials, &self.job())
    }
}
