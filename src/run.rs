use anyhow::anyhow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::export::{ExportRequest, ExportResult};
use crate::session::Credentials;

/// What to export and where to put it.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub request: ExportRequest,
    pub dest_file_name: String,
    /// Destination folder; `None` or empty means the current directory.
    pub dest_folder: Option<PathBuf>,
}

impl ExportJob {
    /// Joins the destination folder and file name without touching the filesystem.
    pub fn destination(&self) -> Result<PathBuf> {
        if self.dest_file_name.trim().is_empty() {
            return Err(Error::Config(anyhow!("destination file name is empty")));
        }

        let folder = match &self.dest_folder {
            Some(folder) if !folder.as_os_str().is_empty() => folder.clone(),
            _ => std::env::current_dir().map_err(|source| Error::Io {
                action: "resolve current directory",
                path: PathBuf::from("."),
                source,
            })?,
        };

        Ok(folder.join(&self.dest_file_name))
    }
}

/// Resolves the destination path and creates its directory if needed.
pub fn prepare_destination(job: &ExportJob) -> Result<PathBuf> {
    let target = job.destination()?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                action: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(target)
}

/// Runs the whole workflow: prepare destination, log in, export, write.
///
/// The output file is only opened once the export has been fully received,
/// so a failed run never leaves an empty or truncated file behind.
pub fn run(client: &Client, credentials: Credentials, job: &ExportJob) -> Result<PathBuf> {
    let target = prepare_destination(job)?;

    let token = client.authenticate(&credentials)?;
    info!(username = %credentials.username, endpoint = client.endpoint(), "authenticated");
    drop(credentials);

    info!(
        "Downloading the contents of the query results as {}",
        job.request.format
    );
    let result = client.export(&job.request, &token)?;

    write_export(&target, &result)?;
    info!(
        card_id = job.request.card_id,
        bytes = result.bytes.len(),
        path = %target.display(),
        "export written"
    );

    Ok(target)
}

/// Writes the payload verbatim, creating or truncating `target`.
pub fn write_export(target: &Path, result: &ExportResult) -> Result<()> {
    let mut out = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(target)
        .map_err(|source| Error::Io {
            action: "open",
            path: target.to_path_buf(),
            source,
        })?;

    out.write_all(&result.bytes)
        .and_then(|()| out.flush())
        .map_err(|source| Error::Io {
            action: "write",
            path: target.to_path_buf(),
            source,
        })
}
