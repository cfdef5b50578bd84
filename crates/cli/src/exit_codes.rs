//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `roster` exit codes.
//! Scripts rely on them; do not renumber.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                    |
//! |---------|-----------|------------------------------------------------|
//! | 0       | Universal | Success                                        |
//! | 1       | Universal | General error (unspecified)                    |
//! | 2       | Universal | Usage error (bad args, unknown id)             |
//! | 3-9     | Local     | File and schema problems                       |
//! | 10-19   | Remote    | Auth, network and worksheet lookup             |
//! | 20-29   | Sync      | Version conflicts and failed commits           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the mapping functions below

use rosterdesk_config::ConfigError;
use rosterdesk_sheets::{SessionError, SheetsError, StoreError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown id, nothing to do.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Local (3-9)
// =============================================================================

/// File could not be read or written (upload, export, store file, config).
pub const EXIT_IO: u8 = 3;

/// Table shape unusable: no header, missing Credibility/Comment column,
/// malformed config.
pub const EXIT_SCHEMA: u8 = 4;

// =============================================================================
// Remote (10-19)
// =============================================================================

/// No bearer token, or the API rejected it.
pub const EXIT_NOT_AUTH: u8 = 10;

/// Network failure or unexpected API response.
pub const EXIT_REMOTE: u8 = 11;

/// The spreadsheet has no tab with the configured title.
pub const EXIT_WORKSHEET_NOT_FOUND: u8 = 12;

// =============================================================================
// Sync (20-29)
// =============================================================================

/// The roster changed remotely; local edits were discarded and the roster
/// reloaded. Re-run the command.
pub const EXIT_CONCURRENT_MODIFICATION: u8 = 20;

/// Writing the roster failed. Nothing was committed from this invocation's
/// point of view.
pub const EXIT_COMMIT_FAILED: u8 = 21;

// =============================================================================
// Mapping
// =============================================================================

pub fn sheets_exit_code(err: &SheetsError) -> u8 {
    match err {
        SheetsError::NotAuthenticated => EXIT_NOT_AUTH,
        SheetsError::Http(403, _) => EXIT_NOT_AUTH,
        SheetsError::Network(_) | SheetsError::Http(..) | SheetsError::Parse(_) => EXIT_REMOTE,
        SheetsError::Io(_) => EXIT_IO,
        SheetsError::WorksheetNotFound { .. } => EXIT_WORKSHEET_NOT_FOUND,
    }
}

pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Remote(e) => sheets_exit_code(e),
        StoreError::Schema(_) => EXIT_SCHEMA,
    }
}

pub fn session_exit_code(err: &SessionError) -> u8 {
    match err {
        SessionError::Store(e) => store_exit_code(e),
        SessionError::Edit(_) => EXIT_ERROR,
        SessionError::ConcurrentModification { .. } => EXIT_CONCURRENT_MODIFICATION,
        SessionError::Commit(_) => EXIT_COMMIT_FAILED,
        SessionError::PendingEdits { .. } => EXIT_USAGE,
    }
}

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Io(_) => EXIT_IO,
        ConfigError::Parse(_) => EXIT_SCHEMA,
        ConfigError::Invalid(_) => EXIT_USAGE,
    }
}
