// Excel import (xlsx, xlsm, xls, ods) and export-template writer

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

use rosterdesk_recon::schema::format_number;
use rosterdesk_recon::{ExportCell, ExportTable, RawTable};

/// Maximum number of cells to import (prevents DoS from huge files)
const MAX_CELLS: usize = 5_000_000;

/// Import the first worksheet. The first row is the header.
pub fn import(path: &Path) -> Result<RawTable, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err("Excel file contains no sheets".to_string());
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    // Range start offset (data may not begin at column A)
    let (_, start_col) = range.start().unwrap_or((0, 0));
    let lead = start_col as usize;

    let mut values: Vec<Vec<String>> = Vec::new();
    let mut total_cells = 0usize;
    for row in range.rows() {
        if total_cells >= MAX_CELLS {
            log::warn!("'{}': import stopped at {} cells", sheet_name, MAX_CELLS);
            break;
        }
        let mut out = vec![String::new(); lead];
        out.extend(row.iter().map(cell_to_string));
        total_cells += out.len();
        values.push(out);
    }

    log::debug!("imported {} row(s) from sheet '{}'", values.len(), sheet_name);
    Ok(RawTable::from_values(&values))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Serial number; the mapper only reads numbers and text
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Render an export table as a single-sheet XLSX workbook in memory.
pub fn export_bytes(table: &ExportTable) -> Result<Vec<u8>, String> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    write_table(worksheet, table)?;
    workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to build XLSX file: {}", e))
}

fn write_table(worksheet: &mut Worksheet, table: &ExportTable) -> Result<(), String> {
    let header_format = Format::new().set_bold();

    for (col, label) in table.header.iter().enumerate() {
        if label.is_empty() {
            continue;
        }
        worksheet
            .write_string_with_format(0, col as u16, label, &header_format)
            .map_err(|e| format!("Failed to write header ({}): {}", col, e))?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let row32 = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            match cell {
                ExportCell::Empty => {}
                ExportCell::Text(s) => {
                    worksheet
                        .write_string(row32, col16, s)
                        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col, e))?;
                }
                ExportCell::Number(n) => {
                    worksheet
                        .write_number(row32, col16, *n)
                        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col, e))?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use rosterdesk_recon::{export_table, CanonicalRow};

    fn sample_export() -> ExportTable {
        let mut jane = CanonicalRow::new("jane");
        jane.followers = Some(12000.0);
        jane.ier = Some(0.04);
        jane.post_price = Some(250.0);
        jane.category = "food".into();
        export_table(&[jane, CanonicalRow::new("bob")])
    }

    #[test]
    fn test_export_writes_numbers_as_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pending_influencers.xlsx");
        std::fs::write(&path, export_bytes(&sample_export()).unwrap()).unwrap();

        let mut workbook: Sheets<_> = open_workbook_auto(&path).unwrap();
        let name = workbook.sheet_names()[0].clone();
        let range = workbook.worksheet_range(&name).unwrap();

        assert_eq!(range.get_value((0, 5)), Some(&Data::String("ID".into())));
        assert_eq!(range.get_value((0, 19)), Some(&Data::String("Post price".into())));
        assert_eq!(range.get_value((1, 5)), Some(&Data::String("jane".into())));
        assert_eq!(range.get_value((1, 14)), Some(&Data::Float(12000.0)));
        assert_eq!(range.get_value((1, 15)), Some(&Data::Float(0.04)));
        assert_eq!(range.get_value((1, 19)), Some(&Data::Float(250.0)));
        assert_eq!(
            range.get_value((2, 11)),
            Some(&Data::String("https://www.instagram.com/bob".into()))
        );
    }

    #[test]
    fn test_import_keeps_leading_blank_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.xlsx");
        std::fs::write(&path, export_bytes(&sample_export()).unwrap()).unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.width(), 20);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][5], "jane");
        assert_eq!(table.rows[0][14], "12000");
        assert_eq!(table.rows[1][14], "");
    }

    #[test]
    fn test_import_upload_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload.xlsx");

        let mut workbook = XlsxWorkbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Username").unwrap();
        sheet.write_string(0, 1, "Followers").unwrap();
        sheet.write_string(1, 0, "@jane").unwrap();
        sheet.write_number(1, 1, 1200.0).unwrap();
        sheet.write_string(2, 0, "bob").unwrap();
        sheet.write_boolean(2, 1, true).unwrap();
        workbook.save(&path).unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.headers, vec!["Username", "Followers"]);
        assert_eq!(table.rows[0], vec!["@jane", "1200"]);
        assert_eq!(table.rows[1], vec!["bob", "TRUE"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(import(&dir.path().join("nope.xlsx")).is_err());
    }
}
