// Artifact output for finished leaf results

use crate::error::{CrawlError, Result};
use crate::namespace::StorageNamespace;
use dircrawl_scanner::{COLUMNS, CrawlResult};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Receives one finished [`CrawlResult`] per leaf category.
pub trait OutputSink: Send + Sync {
    /// Persist `result` under `namespace`, returning the artifacts written.
    fn write(&self, namespace: &StorageNamespace, result: &CrawlResult) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Csv,
    Json,
    Xlsx,
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ArtifactFormat::Csv),
            "json" => Ok(ArtifactFormat::Json),
            "xlsx" => Ok(ArtifactFormat::Xlsx),
            other => Err(format!("Unknown artifact format '{}'", other)),
        }
    }
}

impl ArtifactFormat {
    /// A single format name, or "all".
    pub fn parse_list(s: &str) -> std::result::Result<Vec<Self>, String> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::all())
        } else {
            s.parse().map(|format| vec![format])
        }
    }

    pub fn all() -> Vec<Self> {
        vec![ArtifactFormat::Csv, ArtifactFormat::Json, ArtifactFormat::Xlsx]
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactFormat::Csv => "data.csv",
            ArtifactFormat::Json => "data.json",
            ArtifactFormat::Xlsx => "data.xlsx",
        }
    }

    pub fn render(&self, result: &CrawlResult) -> Result<Vec<u8>> {
        match self {
            ArtifactFormat::Csv => Ok(to_csv_string(result).into_bytes()),
            ArtifactFormat::Json => Ok(serde_json::to_vec_pretty(&result.records)?),
            ArtifactFormat::Xlsx => to_xlsx_bytes(result),
        }
    }
}

/// Writes one file per format into the leaf's directory. Empty results still get
/// header-only CSV and spreadsheet files and an empty JSON array.
#[derive(Debug, Clone)]
pub struct FsSink {
    formats: Vec<ArtifactFormat>,
}

impl FsSink {
    pub fn new(formats: Vec<ArtifactFormat>) -> Self {
        Self { formats }
    }
}

impl Default for FsSink {
    fn default() -> Self {
        Self::new(ArtifactFormat::all())
    }
}

impl OutputSink for FsSink {
    fn write(&self, namespace: &StorageNamespace, result: &CrawlResult) -> Result<Vec<PathBuf>> {
        namespace.create()?;

        let mut written = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            let path = namespace.path().join(format.file_name());
            let content = format.render(result)?;
            save_artifact(&content, &path)?;
            info!("Wrote {} records to {}", result.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn save_artifact(content: &[u8], path: &Path) -> Result<()> {
    fs::write(path, content).map_err(|source| CrawlError::Sink {
        path: path.to_path_buf(),
        source,
    })
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Append one CRLF-terminated CSV row, quoting fields that need it.
pub fn write_row(out: &mut String, row: &[&str]) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}

/// Header row followed by one row per record.
pub fn to_csv_string(result: &CrawlResult) -> String {
    let mut out = String::new();
    write_row(&mut out, &COLUMNS);
    for record in &result.records {
        write_row(&mut out, &record.to_row());
    }
    out
}

/// One worksheet: a bold header row, then one row per record.
pub fn to_xlsx_bytes(result: &CrawlResult) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, name) in (0u16..).zip(COLUMNS) {
        worksheet.write_string_with_format(0, col, name, &bold)?;
    }
    for (row, record) in (1u32..).zip(&result.records) {
        for (col, cell) in (0u16..).zip(record.to_row()) {
            worksheet.write_string(row, col, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
