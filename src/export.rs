use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// File formats Metabase can render a card's query results as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Json, Self::Xlsx, Self::Csv];

    /// Path segment used by the export endpoint.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidFormat(s.to_string()))
    }
}

/// Identifies one card on one dashboard, plus the format to render it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub dashboard_id: u64,
    pub dashcard_id: u64,
    pub card_id: u64,
    pub format: ExportFormat,
}

impl ExportRequest {
    pub fn new(dashboard_id: u64, dashcard_id: u64, card_id: u64, format: ExportFormat) -> Self {
        Self {
            dashboard_id,
            dashcard_id,
            card_id,
            format,
        }
    }

    /// API path relative to the service endpoint.
    pub fn path(&self) -> String {
        format!(
            "/api/dashboard/{}/dashcard/{}/card/{}/query/{}",
            self.dashboard_id, self.dashcard_id, self.card_id, self.format
        )
    }
}

/// Raw export payload. The bytes are exactly what the server sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
}
