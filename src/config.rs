use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::error::{ReportError, Result};
use crate::models::ReportKind;

pub const DEFAULT_BASE_URL: &str = "https://api.torn.com/v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// Print the report to standard output
    Stdout,
    /// Overwrite ranges in a Google spreadsheet
    Sheets,
    /// Overwrite one CSV file per target sheet
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    #[default]
    NotInOc,
    All,
    Both,
}

impl ReportMode {
    pub fn from_flags(all: bool, both: bool) -> Result<Self> {
        match (all, both) {
            (true, true) => Err(ReportError::config(
                "--all and --both cannot be used together",
            )),
            (true, false) => Ok(Self::All),
            (false, true) => Ok(Self::Both),
            (false, false) => Ok(Self::NotInOc),
        }
    }

    pub fn kinds(self) -> &'static [ReportKind] {
        match self {
            Self::NotInOc => &[ReportKind::NotInOc],
            Self::All => &[ReportKind::All],
            Self::Both => &[ReportKind::NotInOc, ReportKind::All],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Targets {
    pub not_in_oc: String,
    pub all: String,
}

impl Targets {
    pub fn for_kind(&self, kind: ReportKind) -> &str {
        match kind {
            ReportKind::NotInOc => &self.not_in_oc,
            ReportKind::All => &self.all,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetsCredentials {
    pub spreadsheet_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub mode: ReportMode,
    pub output: OutputKind,
    pub targets: Targets,
    /// `None` runs a single pass.
    pub interval: Option<Duration>,
    pub csv_dir: PathBuf,
    pub http_timeout: Duration,
    pub sheets: Option<SheetsCredentials>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ReportError::config("API key is empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ReportError::config("base URL is empty"));
        }
        if self.http_timeout.is_zero() {
            return Err(ReportError::config("HTTP timeout must be positive"));
        }
        for kind in self.mode.kinds() {
            if self.targets.for_kind(*kind).trim().is_empty() {
                return Err(ReportError::config(format!(
                    "target range for the {} report is empty",
                    kind.label()
                )));
            }
        }
        if self.output == OutputKind::Sheets && self.sheets.is_none() {
            return Err(ReportError::config(
                "sheets output requires spreadsheet credentials",
            ));
        }
        Ok(())
    }
}

/// Parses repeat intervals such as `0`, `45`, `90s`, `5m`, `1h30m` or `250ms`.
/// A bare number is read as seconds.
pub fn parse_interval(raw: &str) -> std::result::Result<Duration, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("interval is empty".to_string());
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = raw;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid interval '{raw}': expected a number"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid interval '{raw}': number too large"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            "" => return Err(format!("invalid interval '{raw}': missing unit")),
            other => return Err(format!("invalid interval '{raw}': unknown unit '{other}'")),
        };
        total = total.saturating_add(part);
        rest = &rest[unit_len..];
    }
    Ok(total)
}
