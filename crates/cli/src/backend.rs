//! Where the roster lives for this invocation: a local CSV file or a
//! Google Sheets tab.

use std::path::PathBuf;

use rosterdesk_config::Settings;
use rosterdesk_sheets::{
    load_auth, AppendMode, CachePolicy, CsvFileStore, RetryPolicy, RosterStore, Session,
    SheetsError, TabularStore, Worksheet, DEFAULT_API_BASE,
};

use crate::exit_codes::{config_exit_code, session_exit_code, sheets_exit_code};
use crate::CliError;

pub enum Backend {
    File(CsvFileStore),
    Sheet(Worksheet),
}

impl TabularStore for Backend {
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        match self {
            Backend::File(s) => s.get_all_values(),
            Backend::Sheet(s) => s.get_all_values(),
        }
    }

    fn update(&self, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        match self {
            Backend::File(s) => s.update(rows),
            Backend::Sheet(s) => s.update(rows),
        }
    }

    fn clear(&self) -> Result<(), SheetsError> {
        match self {
            Backend::File(s) => s.clear(),
            Backend::Sheet(s) => s.clear(),
        }
    }

    fn append_rows(&self, rows: &[Vec<String>], mode: AppendMode) -> Result<(), SheetsError> {
        match self {
            Backend::File(s) => s.append_rows(rows, mode),
            Backend::Sheet(s) => s.append_rows(rows, mode),
        }
    }

    fn describe(&self) -> String {
        match self {
            Backend::File(s) => s.describe(),
            Backend::Sheet(s) => s.describe(),
        }
    }
}

/// Per-invocation context built from global flags and settings.
pub struct Context {
    pub settings: Settings,
    pub store_file: Option<PathBuf>,
}

impl Context {
    pub fn load(config: Option<PathBuf>, store_file: Option<PathBuf>) -> Result<Self, CliError> {
        let settings = Settings::load(config.as_deref()).map_err(|e| CliError {
            code: config_exit_code(&e),
            message: e.to_string(),
            hint: None,
        })?;
        Ok(Self { settings, store_file })
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            roster_ttl: self.settings.cache.roster_ttl(),
            version_ttl: self.settings.cache.version_ttl(),
        }
    }

    pub fn backend(&self) -> Result<Backend, CliError> {
        if let Some(path) = &self.store_file {
            tracing::debug!("using store file {}", path.display());
            return Ok(Backend::File(CsvFileStore::new(path.clone())));
        }

        let sheet_id = self.settings.sheet_id().map_err(|e| CliError {
            code: config_exit_code(&e),
            message: e.to_string(),
            hint: Some("or pass --store-file to work on a local CSV roster".to_string()),
        })?;

        let mut creds = load_auth().ok_or_else(|| CliError::sheets(SheetsError::NotAuthenticated))?;
        if creds.api_base == DEFAULT_API_BASE {
            creds = creds.with_api_base(self.settings.sheet.api_base.clone());
        }

        let retry = &self.settings.retry;
        let ws = Worksheet::connect(
            &creds,
            &sheet_id,
            &self.settings.sheet.worksheet,
            &RetryPolicy::new(retry.auth_attempts, retry.delay()),
            &RetryPolicy::new(retry.fetch_attempts, retry.delay()),
        )
        .map_err(CliError::sheets)?;
        Ok(Backend::Sheet(ws))
    }

    pub fn roster_store(&self) -> Result<RosterStore<Backend>, CliError> {
        Ok(RosterStore::new(self.backend()?, self.cache_policy()))
    }

    pub fn open_session(&self) -> Result<Session<Backend>, CliError> {
        let session = Session::open(self.roster_store()?).map_err(CliError::session)?;
        let report = &session.roster().report;
        if report.blank_ids > 0 || !report.duplicate_ids.is_empty() {
            tracing::warn!(
                "roster: skipped {} row(s) without id and {} repeated id(s)",
                report.blank_ids,
                report.duplicate_ids.len()
            );
        }
        Ok(session)
    }
}

impl CliError {
    pub fn sheets(err: SheetsError) -> Self {
        let hint = match &err {
            SheetsError::NotAuthenticated => {
                Some(format!("set {} or pass --store-file", rosterdesk_sheets::TOKEN_ENV))
            }
            SheetsError::WorksheetNotFound { .. } => {
                Some("check sheet.worksheet in settings or ROSTERDESK_WORKSHEET".to_string())
            }
            _ => None,
        };
        Self { code: sheets_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn session(err: rosterdesk_sheets::SessionError) -> Self {
        use rosterdesk_sheets::SessionError;
        let hint = match &err {
            SessionError::ConcurrentModification { .. } => {
                Some("the roster changed remotely and was reloaded; re-run the command".to_string())
            }
            SessionError::Commit(_) => Some("check the roster before retrying".to_string()),
            _ => None,
        };
        Self { code: session_exit_code(&err), message: err.to_string(), hint }
    }
}
