//! Bearer token lookup.
//!
//! The token is issued elsewhere (OAuth consent, service account exchange);
//! this crate only consumes it. Lookup order: `ROSTERDESK_TOKEN`, then
//! ~/.config/rosterdesk/auth.json.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// OAuth scopes the token must carry.
pub const SCOPE_SPREADSHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const SCOPE_DRIVE: &str = "https://www.googleapis.com/auth/drive";
pub const REQUIRED_SCOPES: [&str; 2] = [SCOPE_SPREADSHEETS, SCOPE_DRIVE];

pub const TOKEN_ENV: &str = "ROSTERDESK_TOKEN";

/// Authentication credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// Bearer token for the Sheets API
    pub token: String,
    /// API base URL (e.g., "https://sheets.googleapis.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl AuthCredentials {
    pub fn new(token: String, api_base: String) -> Self {
        Self { token, api_base }
    }

    /// Same token against a different endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("rosterdesk/auth.json"))
}

/// Read credentials from a JSON file. None if missing or invalid.
pub fn load_auth_from(path: &Path) -> Option<AuthCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(creds) => Some(creds),
        Err(e) => {
            log::warn!("ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Load credentials from the environment, then the auth file.
pub fn load_auth() -> Option<AuthCredentials> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Some(AuthCredentials::new(token, default_api_base()));
        }
    }
    load_auth_from(&auth_file_path()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_credentials_roundtrip() {
        let creds = AuthCredentials::new("test-token".into(), "https://sheets.test".into());
        let json = serde_json::to_string_pretty(&creds).unwrap();
        let parsed: AuthCredentials = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.token, "test-token");
        assert_eq!(parsed.api_base, "https://sheets.test");
    }

    #[test]
    fn test_api_base_defaults() {
        let parsed: AuthCredentials = serde_json::from_str(r#"{"token":"tok"}"#).unwrap();
        assert_eq!(parsed.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_auth_file_path_exists() {
        let path = auth_file_path().unwrap();
        assert!(path.to_string_lossy().contains("rosterdesk"));
        assert!(path.to_string_lossy().ends_with("auth.json"));
    }

    #[test]
    fn test_load_auth_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, r#"{"token":"tok123","api_base":"https://api.test"}"#).unwrap();

        let loaded = load_auth_from(&path).unwrap();
        assert_eq!(loaded.token, "tok123");
        assert_eq!(loaded.api_base, "https://api.test");

        std::fs::write(&path, "not json").unwrap();
        assert!(load_auth_from(&path).is_none());
        assert!(load_auth_from(&dir.path().join("missing.json")).is_none());
    }

    #[test]
    fn test_required_scopes() {
        assert!(REQUIRED_SCOPES.iter().all(|s| s.starts_with("https://www.googleapis.com/auth/")));
    }
}
