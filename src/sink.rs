use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{error, info};

use crate::error::{ReportError, Result};
use crate::models::ReportKind;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Destination for rendered report lines.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn emit(&self, kind: ReportKind, target: &str, lines: &[String]) -> Result<()>;
}

pub struct ConsoleSink<W> {
    out: Mutex<W>,
    headings: bool,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(headings: bool) -> Self {
        Self::new(std::io::stdout(), headings)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, headings: bool) -> Self {
        Self {
            out: Mutex::new(out),
            headings,
        }
    }

    fn write_lines(&self, kind: ReportKind, lines: &[String]) -> std::io::Result<()> {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.headings {
            writeln!(out, "=== {} ===", kind.heading())?;
        }
        for line in lines {
            writeln!(out, "{line}")?;
        }
        if self.headings {
            writeln!(out)?;
        }
        out.flush()
    }
}

#[async_trait]
impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    async fn emit(&self, kind: ReportKind, target: &str, lines: &[String]) -> Result<()> {
        self.write_lines(kind, lines)
            .map_err(|err| ReportError::sink(target, err))
    }
}

/// Range-addressed table store: a spreadsheet or something shaped like one.
#[async_trait]
pub trait TabularSink: Send + Sync {
    async fn clear_range(&self, target: &str) -> Result<()>;

    async fn write_range(&self, target: &str, rows: &[Vec<String>]) -> Result<()>;
}

/// Writes each report line as a one-cell row after clearing the target.
pub struct TabularEmitter<T> {
    inner: T,
}

impl<T: TabularSink> TabularEmitter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TabularSink> ReportSink for TabularEmitter<T> {
    async fn emit(&self, kind: ReportKind, target: &str, lines: &[String]) -> Result<()> {
        let rows: Vec<Vec<String>> = lines.iter().map(|line| vec![line.clone()]).collect();

        // a failed clear still gets a write attempt
        if let Err(err) = self.inner.clear_range(target).await {
            error!(report = kind.label(), range = target, error = %err, "clear range failed");
        }
        if let Err(err) = self.inner.write_range(target, &rows).await {
            error!(report = kind.label(), range = target, error = %err, "write range failed");
            return Err(err);
        }

        info!(report = kind.label(), range = target, rows = rows.len(), "wrote report");
        Ok(())
    }
}

/// Widens a single anchor cell (`History!A1`) to the rest of its column
/// (`History!A1:A`). Anything else is returned unchanged.
pub fn clear_range_for(target: &str) -> String {
    let (sheet, cells) = match target.rsplit_once('!') {
        Some((sheet, cells)) => (Some(sheet), cells),
        None => (None, target),
    };
    let letters = cells.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let (column, row) = cells.split_at(letters);
    if column.is_empty() || row.is_empty() || !row.chars().all(|c| c.is_ascii_digit()) {
        return target.to_string();
    }
    match sheet {
        Some(sheet) => format!("{sheet}!{column}{row}:{column}"),
        None => format!("{column}{row}:{column}"),
    }
}

pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

impl SheetsClient {
    pub fn new(http: Client, spreadsheet_id: &str, access_token: &str) -> Self {
        Self {
            http,
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn values_url(&self, range_segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ReportError::config(format!("invalid sheets URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ReportError::config("sheets URL cannot take a path"))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range_segment);
        Ok(url)
    }

    async fn check(target: &str, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ReportError::sink(target, format!("status {status}: {body}")))
    }
}

#[async_trait]
impl TabularSink for SheetsClient {
    async fn clear_range(&self, target: &str) -> Result<()> {
        let url = self.values_url(&format!("{}:clear", clear_range_for(target)))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|err| ReportError::sink(target, err))?;
        Self::check(target, response).await
    }

    async fn write_range(&self, target: &str, rows: &[Vec<String>]) -> Result<()> {
        let mut url = self.values_url(target)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = serde_json::json!({
            "range": target,
            "majorDimension": "ROWS",
            "values": rows,
        });
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|err| ReportError::sink(target, err))?;
        Self::check(target, response).await
    }
}

/// Stores each target sheet as `{dir}/{sheet}.csv`.
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, target: &str) -> PathBuf {
        let sheet = target.split('!').next().unwrap_or(target);
        let name: String = sheet
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        let name = if name.trim().is_empty() { "report".to_string() } else { name };
        self.dir.join(format!("{name}.csv"))
    }

    fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    fn write_rows(path: &Path, rows: &[Vec<String>]) -> std::result::Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl TabularSink for CsvDirectory {
    async fn clear_range(&self, target: &str) -> Result<()> {
        self.ensure_dir()
            .and_then(|_| std::fs::write(self.path_for(target), ""))
            .map_err(|err| ReportError::sink(target, err))
    }

    async fn write_range(&self, target: &str, rows: &[Vec<String>]) -> Result<()> {
        self.ensure_dir()
            .map_err(|err| ReportError::sink(target, err))?;
        Self::write_rows(&self.path_for(target), rows).map_err(|err| ReportError::sink(target, err))
    }
}
