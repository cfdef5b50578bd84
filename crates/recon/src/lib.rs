//! `rosterdesk-recon`: influencer roster reconciliation engine.
//!
//! Pure engine crate: takes raw value matrices, returns canonical rosters,
//! reconciliation buckets, edit sets and export tables. No CLI or IO
//! dependencies.

pub mod classify;
pub mod edits;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod headers;
pub mod model;
pub mod roster;
pub mod schema;
pub mod table;

pub use classify::classify;
pub use edits::{
    AddOutcome, CommitOutcome, CommitSummary, EditSet, EditTracker, FieldEdit, RosterSink,
    RowChanges,
};
pub use error::RosterError;
pub use export::{export_table, ExportCell, ExportTable, EXPORT_WIDTH};
pub use fingerprint::{fingerprint, VersionToken};
pub use headers::make_unique_headers;
pub use model::{
    CandidateBatch, CanonicalRow, Credibility, ReconBucket, ReconSummary, ReconciliationResult,
};
pub use roster::{CredibilityCounts, LoadReport, RosterLayout, RosterSnapshot};
pub use schema::{
    candidates_from_table, map_table, normalize_column_name, normalize_id, parse_numeric,
    CanonicalField,
};
pub use table::RawTable;
