//! Google Sheets v4 HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Covers the values API calls the roster needs: read a whole tab, overwrite
//! it, clear it, append rows, and list tab titles.

use std::time::Duration;

use serde::Deserialize;

use crate::auth::AuthCredentials;

/// Sheets API client (blocking).
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

/// Error type for remote table operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetsError {
    /// No bearer token configured
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Local file I/O error
    Io(String),
    /// Spreadsheet has no tab with this title
    WorksheetNotFound { sheet_id: String, worksheet: String },
}

impl SheetsError {
    /// Network failures, rate limiting and server errors are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            SheetsError::Network(_) => true,
            SheetsError::Http(code, _) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for SheetsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsError::NotAuthenticated => write!(
                f,
                "Not authenticated: set ROSTERDESK_TOKEN or write an auth.json with a bearer token"
            ),
            SheetsError::Network(msg) => write!(f, "Network error: {}", msg),
            SheetsError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SheetsError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SheetsError::Io(msg) => write!(f, "I/O error: {}", msg),
            SheetsError::WorksheetNotFound { sheet_id, worksheet } => {
                write!(f, "Worksheet '{}' not found in spreadsheet {}", worksheet, sheet_id)
            }
        }
    }
}

impl std::error::Error for SheetsError {}

/// `insertDataOption` for append calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertDataOption {
    InsertRows,
    Overwrite,
}

impl InsertDataOption {
    fn as_str(self) -> &'static str {
        match self {
            InsertDataOption::InsertRows => "INSERT_ROWS",
            InsertDataOption::Overwrite => "OVERWRITE",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl SheetsClient {
    /// Create a new client with explicit credentials.
    pub fn new(creds: AuthCredentials) -> Result<Self, SheetsError> {
        if creds.token.trim().is_empty() {
            return Err(SheetsError::NotAuthenticated);
        }

        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("roster/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SheetsError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: creds.api_base.trim_end_matches('/').to_string(),
            token: creds.token,
        })
    }

    /// Titles of every tab in the spreadsheet.
    pub fn sheet_titles(&self, sheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let mut url = self.spreadsheet_url(sheet_id, &[])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");

        let resp = self.send(self.http.get(url))?;
        let meta: SpreadsheetMeta = resp.json().map_err(|e| SheetsError::Parse(e.to_string()))?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Every non-empty row of `range`, cells rendered as strings.
    pub fn get_values(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.spreadsheet_url(sheet_id, &["values", range])?;
        let resp = self.send(self.http.get(url))?;
        let body: ValueRange = resp.json().map_err(|e| SheetsError::Parse(e.to_string()))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Overwrite cells starting at the top-left of `range`.
    pub fn update_values(
        &self,
        sheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        let mut url = self.spreadsheet_url(sheet_id, &["values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = serde_json::json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        self.send(self.http.put(url).json(&body))?;
        Ok(())
    }

    /// Clear every value in `range` (formatting is kept).
    pub fn clear_values(&self, sheet_id: &str, range: &str) -> Result<(), SheetsError> {
        let url = self.spreadsheet_url(sheet_id, &["values", &format!("{}:clear", range)])?;
        self.send(self.http.post(url).json(&serde_json::json!({})))?;
        Ok(())
    }

    /// Append rows after the last row of the table in `range`.
    pub fn append_values(
        &self,
        sheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
        insert: InsertDataOption,
    ) -> Result<(), SheetsError> {
        let mut url = self.spreadsheet_url(sheet_id, &["values", &format!("{}:append", range)])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", insert.as_str());

        let body = serde_json::json!({
            "majorDimension": "ROWS",
            "values": rows,
        });
        self.send(self.http.post(url).json(&body))?;
        Ok(())
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn spreadsheet_url(&self, sheet_id: &str, tail: &[&str]) -> Result<url::Url, SheetsError> {
        let mut url = url::Url::parse(&self.api_base)
            .map_err(|e| SheetsError::Parse(format!("invalid API base '{}': {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Parse(format!("invalid API base '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", sheet_id])
            .extend(tail);
        Ok(url)
    }

    fn send(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, SheetsError> {
        let response = req
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| SheetsError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            if status == 401 {
                return Err(SheetsError::NotAuthenticated);
            }
            return Err(SheetsError::Http(status, body));
        }

        Ok(response)
    }
}

/// A1-notation range covering a whole tab: `'Title'`, quotes doubled.
pub fn tab_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_text(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
