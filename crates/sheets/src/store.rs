//! Remote tabular stores.
//!
//! [`TabularStore`] is the four-call surface the roster needs from a
//! spreadsheet tab. [`Worksheet`] talks to Google Sheets; [`CsvFileStore`]
//! stands in with a local CSV file; [`MemoryStore`] is an in-process table
//! for tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::auth::AuthCredentials;
use crate::client::{tab_range, InsertDataOption, SheetsClient, SheetsError};
use crate::policy::{with_retry, RetryPolicy};

/// How appended rows are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendMode {
    /// Insert new rows after the table.
    #[default]
    InsertRows,
    /// Write into existing empty rows after the table.
    Overwrite,
}

pub trait TabularStore {
    /// Every row of the table, header first. Rows are padded to equal width.
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetsError>;

    /// Overwrite from the top-left cell.
    fn update(&self, rows: &[Vec<String>]) -> Result<(), SheetsError>;

    fn clear(&self) -> Result<(), SheetsError>;

    fn append_rows(&self, rows: &[Vec<String>], mode: AppendMode) -> Result<(), SheetsError>;

    /// Human description for logs and status output.
    fn describe(&self) -> String;
}

/// Pad ragged rows to the widest one.
pub fn pad_rows(mut values: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = values.iter().map(Vec::len).max().unwrap_or(0);
    for row in values.iter_mut() {
        row.resize(width, String::new());
    }
    values
}

// ── Google Sheets ───────────────────────────────────────────────────

/// One tab of a Google spreadsheet.
#[derive(Clone)]
pub struct Worksheet {
    client: SheetsClient,
    sheet_id: String,
    title: String,
    fetch_retry: RetryPolicy,
}

impl Worksheet {
    /// Build a client and open a tab.
    ///
    /// The spreadsheet metadata fetch is the first call that presents the
    /// token, so it runs under `auth_retry`. A missing tab fails at once.
    /// `fetch_retry` covers every later read of the tab's values.
    pub fn connect(
        creds: &AuthCredentials,
        sheet_id: &str,
        title: &str,
        auth_retry: &RetryPolicy,
        fetch_retry: &RetryPolicy,
    ) -> Result<Self, SheetsError> {
        let client = SheetsClient::new(creds.clone())?;
        let titles = with_retry(auth_retry, "authenticate", || client.sheet_titles(sheet_id))?;
        if !titles.iter().any(|t| t == title) {
            return Err(SheetsError::WorksheetNotFound {
                sheet_id: sheet_id.to_string(),
                worksheet: title.to_string(),
            });
        }
        log::info!("opened worksheet '{}' of {}", title, sheet_id);
        Ok(Self {
            client,
            sheet_id: sheet_id.to_string(),
            title: title.to_string(),
            fetch_retry: *fetch_retry,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn range(&self) -> String {
        tab_range(&self.title)
    }
}

impl TabularStore for Worksheet {
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        let values = with_retry(&self.fetch_retry, "fetch worksheet", || {
            self.client.get_values(&self.sheet_id, &self.range())
        })?;
        Ok(pad_rows(values))
    }

    fn update(&self, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        let anchor = format!("{}!A1", self.range());
        self.client.update_values(&self.sheet_id, &anchor, rows)
    }

    fn clear(&self) -> Result<(), SheetsError> {
        self.client.clear_values(&self.sheet_id, &self.range())
    }

    fn append_rows(&self, rows: &[Vec<String>], mode: AppendMode) -> Result<(), SheetsError> {
        let insert = match mode {
            AppendMode::InsertRows => InsertDataOption::InsertRows,
            AppendMode::Overwrite => InsertDataOption::Overwrite,
        };
        self.client.append_values(&self.sheet_id, &self.range(), rows, insert)
    }

    fn describe(&self) -> String {
        format!("sheet {} / '{}'", self.sheet_id, self.title)
    }
}

// ── Local CSV file ──────────────────────────────────────────────────

/// A CSV file acting as the remote table. A missing file is an empty table.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularStore for CsvFileStore {
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let values = rosterdesk_io::csv::read_values(&self.path).map_err(SheetsError::Io)?;
        // Blank lines are not rows; the Sheets API skips them too
        let values = values
            .into_iter()
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .collect();
        Ok(pad_rows(values))
    }

    fn update(&self, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        rosterdesk_io::csv::write_values(&self.path, rows).map_err(SheetsError::Io)
    }

    fn clear(&self) -> Result<(), SheetsError> {
        std::fs::write(&self.path, b"")
            .map_err(|e| SheetsError::Io(format!("{}: {}", self.path.display(), e)))
    }

    fn append_rows(&self, rows: &[Vec<String>], _mode: AppendMode) -> Result<(), SheetsError> {
        rosterdesk_io::csv::append_values(&self.path, rows).map_err(SheetsError::Io)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

// ── In-memory ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Update,
    Clear,
    Append,
}

#[derive(Debug, Default)]
struct MemoryState {
    values: Vec<Vec<String>>,
    calls: Vec<StoreOp>,
    failures: Vec<(StoreOp, SheetsError)>,
}

/// Shared in-process table. Clones are handles to the same table, so a test
/// can play a second editor.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new(values: Vec<Vec<String>>) -> Self {
        let store = Self::default();
        store.state.lock().values = values;
        store
    }

    pub fn values(&self) -> Vec<Vec<String>> {
        self.state.lock().values.clone()
    }

    /// Replace the table out-of-band.
    pub fn set_values(&self, values: Vec<Vec<String>>) {
        self.state.lock().values = values;
    }

    /// Make the next call of `op` fail with `err`. Queued failures fire in order.
    pub fn fail_next(&self, op: StoreOp, err: SheetsError) {
        self.state.lock().failures.push((op, err));
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == op).count()
    }

    fn enter(&self, op: StoreOp) -> Result<parking_lot::MutexGuard<'_, MemoryState>, SheetsError> {
        let mut state = self.state.lock();
        state.calls.push(op);
        if let Some(i) = state.failures.iter().position(|(o, _)| *o == op) {
            let (_, err) = state.failures.remove(i);
            return Err(err);
        }
        Ok(state)
    }
}

impl TabularStore for MemoryStore {
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        let state = self.enter(StoreOp::Get)?;
        Ok(pad_rows(state.values.clone()))
    }

    fn update(&self, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        let mut state = self.enter(StoreOp::Update)?;
        for (i, row) in rows.iter().enumerate() {
            if i < state.values.len() {
                let target = &mut state.values[i];
                if target.len() < row.len() {
                    target.resize(row.len(), String::new());
                }
                target[..row.len()].clone_from_slice(row);
            } else {
                state.values.push(row.clone());
            }
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SheetsError> {
        let mut state = self.enter(StoreOp::Clear)?;
        state.values.clear();
        Ok(())
    }

    fn append_rows(&self, rows: &[Vec<String>], _mode: AppendMode) -> Result<(), SheetsError> {
        let mut state = self.enter(StoreOp::Append)?;
        state.values.extend(rows.iter().cloned());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory table".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn v(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_pad_rows() {
        let padded = pad_rows(v(&[&["a", "b", "c"], &["d"]]));
        assert_eq!(padded[1], vec!["d", "", ""]);
        assert!(pad_rows(Vec::new()).is_empty());
    }

    #[test]
    fn test_memory_store_ops() {
        let store = MemoryStore::new(v(&[&["ID", "Comment"], &["a", "x"]]));
        store.append_rows(&v(&[&["b", "y"]]), AppendMode::InsertRows).unwrap();
        assert_eq!(store.get_all_values().unwrap().len(), 3);

        store.clear().unwrap();
        assert!(store.get_all_values().unwrap().is_empty());
        store.update(&v(&[&["ID"], &["z"]])).unwrap();
        assert_eq!(store.values(), v(&[&["ID"], &["z"]]));
        assert_eq!(store.calls(StoreOp::Get), 2);
    }

    #[test]
    fn test_memory_store_update_overlays_cells() {
        let store = MemoryStore::new(v(&[&["a", "b", "c"], &["d", "e", "f"]]));
        store.update(&v(&[&["A"]])).unwrap();
        assert_eq!(store.values(), v(&[&["A", "b", "c"], &["d", "e", "f"]]));
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemoryStore::new(Vec::new());
        store.fail_next(StoreOp::Update, SheetsError::Http(500, "boom".into()));
        assert!(store.update(&v(&[&["x"]])).is_err());
        assert!(store.update(&v(&[&["x"]])).is_ok());
        assert_eq!(store.calls(StoreOp::Update), 2);
    }

    #[test]
    fn test_memory_store_handles_share_state() {
        let store = MemoryStore::new(Vec::new());
        let other = store.clone();
        other.set_values(v(&[&["ID"]]));
        assert_eq!(store.values(), v(&[&["ID"]]));
    }

    #[test]
    fn test_csv_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = CsvFileStore::new(dir.path().join("roster.csv"));
        assert!(store.get_all_values().unwrap().is_empty());
    }

    #[test]
    fn test_csv_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = CsvFileStore::new(dir.path().join("roster.csv"));
        store.update(&v(&[&["ID", "Comment", "Credibility"], &["jane", "", "False"]])).unwrap();
        store.append_rows(&v(&[&["bob", "ok, fine", "True"]]), AppendMode::InsertRows).unwrap();

        let values = store.get_all_values().unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[2], vec!["bob", "ok, fine", "True"]);

        store.clear().unwrap();
        assert!(store.get_all_values().unwrap().is_empty());
    }

    #[test]
    fn test_csv_store_append_to_hand_edited_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, "ID,Comment,Credibility\njane,,False").unwrap();
        let store = CsvFileStore::new(&path);

        store.append_rows(&v(&[&["zoe", "", "True"]]), AppendMode::InsertRows).unwrap();

        let values = store.get_all_values().unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], vec!["jane", "", "False"]);
        assert_eq!(values[2], vec!["zoe", "", "True"]);
    }

    #[test]
    fn test_csv_store_append_to_semicolon_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, "ID;Comment;Credibility\njane;;False\n").unwrap();
        let store = CsvFileStore::new(&path);

        store.append_rows(&v(&[&["zoe", "new", "True"]]), AppendMode::InsertRows).unwrap();

        let values = store.get_all_values().unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[2], vec!["zoe", "new", "True"]);
    }
}
