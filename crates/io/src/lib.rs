// File I/O: uploaded influencer lists in, export artifacts out

use std::path::Path;

use rosterdesk_recon::{ExportTable, RawTable};

pub mod csv;
pub mod xlsx;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_MIME: &str = "text/csv";

/// Uploaded file kinds, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Load an uploaded list as a raw table (first row headers).
pub fn load_table(path: &Path) -> Result<RawTable, String> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Csv) => csv::import(path),
        Some(FileFormat::Tsv) => csv::import_tsv(path),
        Some(FileFormat::Excel) => xlsx::import(path),
        None => Err(format!(
            "{}: unsupported file type (expected .csv, .tsv, .txt, .xlsx, .xlsm, .xls or .ods)",
            path.display()
        )),
    }
}

/// A downloadable export: name, media type and content.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn xlsx(table: &ExportTable, filename: impl Into<String>) -> Result<Self, String> {
        Ok(Self {
            filename: filename.into(),
            mime: XLSX_MIME,
            bytes: xlsx::export_bytes(table)?,
        })
    }

    pub fn csv(table: &ExportTable, filename: impl Into<String>) -> Result<Self, String> {
        let mut bytes = Vec::new();
        csv::write_export(table, &mut bytes)?;
        Ok(Self {
            filename: filename.into(),
            mime: CSV_MIME,
            bytes,
        })
    }

    /// Pick the writer from the file extension; anything but `.csv` is XLSX.
    pub fn for_path(table: &ExportTable, path: &Path) -> Result<Self, String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match FileFormat::from_path(path) {
            Some(FileFormat::Csv) => Self::csv(table, filename),
            _ => Self::xlsx(table, filename),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), String> {
        std::fs::write(path, &self.bytes).map_err(|e| format!("{}: {e}", path.display()))
    }
}
