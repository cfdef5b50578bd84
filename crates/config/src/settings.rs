// Settings file: ~/.config/rosterdesk/settings.toml

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const SHEET_ID_ENV: &str = "ROSTERDESK_SHEET_ID";
pub const WORKSHEET_ENV: &str = "ROSTERDESK_WORKSHEET";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    /// Spreadsheet id, or a full sheet URL
    pub id: Option<String>,
    /// Full sheet URL; the id is taken from its `/d/<id>` segment
    pub url: Option<String>,
    pub worksheet: String,
    pub api_base: String,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            id: None,
            url: None,
            worksheet: "Influencers List".to_string(),
            api_base: "https://sheets.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub roster_ttl_secs: u64,
    pub version_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            roster_ttl_secs: 120,
            version_ttl_secs: 60,
        }
    }
}

impl CacheSettings {
    pub fn roster_ttl(&self) -> Duration {
        Duration::from_secs(self.roster_ttl_secs)
    }

    pub fn version_ttl(&self) -> Duration {
        Duration::from_secs(self.version_ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts when building the API client
    pub auth_attempts: u32,
    /// Attempts when opening the worksheet
    pub fetch_attempts: u32,
    /// Base delay; attempt `n` waits `n * delay_ms`
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            auth_attempts: 3,
            fetch_attempts: 2,
            delay_ms: 1000,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub filename: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            filename: "pending_influencers.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sheet: SheetSettings,
    pub cache: CacheSettings,
    pub retry: RetrySettings,
    pub export: ExportSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rosterdesk")
            .join("settings.toml")
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }

    /// Load settings, then apply environment overrides.
    ///
    /// An explicit `path` must exist. The default location may be absent, in
    /// which case defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Self::config_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    log::debug!("no settings file at {}; using defaults", default.display());
                    Self::default()
                }
            }
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Apply `ROSTERDESK_SHEET_ID` / `ROSTERDESK_WORKSHEET`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup(SHEET_ID_ENV).filter(|s| !s.trim().is_empty()) {
            self.sheet.id = Some(id);
        }
        if let Some(ws) = lookup(WORKSHEET_ENV).filter(|s| !s.trim().is_empty()) {
            self.sheet.worksheet = ws;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.worksheet.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet.worksheet must not be empty".into()));
        }
        if self.retry.auth_attempts == 0 || self.retry.fetch_attempts == 0 {
            return Err(ConfigError::Invalid("retry attempts must be at least 1".into()));
        }
        if self.export.filename.trim().is_empty() {
            return Err(ConfigError::Invalid("export.filename must not be empty".into()));
        }
        Ok(())
    }

    /// The spreadsheet id, from `sheet.id` or `sheet.url`.
    pub fn sheet_id(&self) -> Result<String, ConfigError> {
        if let Some(id) = self.sheet.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(sheet_id_from_url(id).unwrap_or_else(|| id.to_string()));
        }
        if let Some(url) = self.sheet.url.as_deref() {
            return sheet_id_from_url(url).ok_or_else(|| {
                ConfigError::Invalid(format!("no spreadsheet id in sheet.url '{}'", url))
            });
        }
        Err(ConfigError::Invalid(format!(
            "no spreadsheet configured: set sheet.id or sheet.url in {} or {}",
            Self::config_path_display(),
            SHEET_ID_ENV
        )))
    }
}

/// Extract the id from `https://docs.google.com/spreadsheets/d/<id>/edit...`.
pub fn sheet_id_from_url(url: &str) -> Option<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").ok())
        .as_ref()?;
    re.captures(url).map(|c| c[1].to_string())
}
