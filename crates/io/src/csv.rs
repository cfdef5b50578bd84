// CSV/TSV import/export

use std::io::{Read, Write};
use std::path::Path;

use rosterdesk_recon::schema::format_number;
use rosterdesk_recon::{ExportCell, ExportTable, RawTable};

pub fn import(path: &Path) -> Result<RawTable, String> {
    let values = read_values(path)?;
    Ok(RawTable::from_values(&values))
}

pub fn import_tsv(path: &Path) -> Result<RawTable, String> {
    let content = read_file_as_utf8(path)?;
    let values = values_from_string(&content, b'\t')?;
    Ok(RawTable::from_values(&values))
}

/// Read a delimited file as a value matrix, delimiter detected.
pub fn read_values(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = detect_delimiter(&content);
    values_from_string(&content, delimiter)
}

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const DETECT_SAMPLE_ROWS: usize = 20;

/// Pick the delimiter under which the most sampled records share the
/// header's width. Candidates splitting the header into a single field are
/// skipped; ties go to the earlier candidate, so comma is the default.
fn detect_delimiter(content: &str) -> u8 {
    let mut best = (b',', 0usize, 0usize);

    for delim in DELIMITERS {
        let widths = record_widths(content, delim);
        let Some(&header) = widths.first() else {
            continue;
        };
        if header < 2 {
            continue;
        }
        let agreeing = widths.iter().filter(|&&w| w == header).count();
        if (agreeing, header) > (best.1, best.2) {
            best = (delim, agreeing, header);
        }
    }

    best.0
}

/// Field counts of the first non-blank records, parsed as one stream so
/// quoted newlines stay inside their record.
fn record_widths(content: &str, delimiter: u8) -> Vec<usize> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
        .records()
        .map_while(Result::ok)
        .filter(|r| r.iter().any(|f| !f.trim().is_empty()))
        .take(DETECT_SAMPLE_ROWS)
        .map(|r| r.len())
        .collect()
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.trim_start_matches('\u{feff}').to_string()),
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel-exported CSVs are usually Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn values_from_string(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut values = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        values.push(record.iter().map(str::to_string).collect());
    }
    Ok(values)
}

/// Overwrite `path` with a value matrix. Rows may differ in width.
pub fn write_values(path: &Path, values: &[Vec<String>]) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    for row in values {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Append rows to a delimited file, creating it if missing.
///
/// Rows use the file's own delimiter. A final line without a line
/// terminator is closed first so the new rows never join it.
pub fn append_values(path: &Path, rows: &[Vec<String>]) -> Result<(), String> {
    let existing = if path.exists() {
        read_file_as_utf8(path)?
    } else {
        String::new()
    };
    let delimiter = if existing.trim().is_empty() {
        b','
    } else {
        detect_delimiter(&existing)
    };

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n").map_err(|e| e.to_string())?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(file);
    for row in rows {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Write an export table as CSV.
pub fn write_export<W: Write>(table: &ExportTable, out: W) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);
    writer.write_record(&table.header).map_err(|e| e.to_string())?;
    for row in &table.rows {
        let record: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                ExportCell::Empty => String::new(),
                ExportCell::Text(s) => s.clone(),
                ExportCell::Number(n) => format_number(*n),
            })
            .collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
