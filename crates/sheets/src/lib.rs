//! Remote roster storage over the Google Sheets values API, plus local stand-ins.
//!
//! This crate owns the wire contract with the spreadsheet: auth, the four
//! table calls, retry and caching policy, and the session that guards
//! commits with a version check.
//!
//! No UI concepts. Blocking IO only.

mod adapter;
mod auth;
mod client;
mod policy;
mod session;
mod store;

pub use adapter::{CachePolicy, RosterStore, StoreError};
pub use auth::{
    auth_file_path, load_auth, load_auth_from, AuthCredentials, DEFAULT_API_BASE,
    REQUIRED_SCOPES, SCOPE_DRIVE, SCOPE_SPREADSHEETS, TOKEN_ENV,
};
pub use client::{tab_range, InsertDataOption, SheetsClient, SheetsError};
pub use policy::{with_retry, RetryPolicy, TimedCache, Transient};
pub use session::{Session, SessionError, SyncStatus};
pub use store::{pad_rows, AppendMode, CsvFileStore, MemoryStore, StoreOp, TabularStore, Worksheet};
