//! Upload commands: `classify`, `export`, `promote`.
//!
//! Each reads an agency file, classifies it against the current roster and
//! then reports, exports or writes verdicts back.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rosterdesk_io::{load_table, ExportArtifact};
use rosterdesk_recon::{
    candidates_from_table, classify, export_table, normalize_id, CanonicalRow, Credibility,
    FieldEdit, ReconBucket, ReconciliationResult, RosterSnapshot,
};

use crate::backend::Context;
use crate::exit_codes::{EXIT_IO, EXIT_SCHEMA};
use crate::roster::finish;
use crate::util::{number_cell, print_json, print_text, render_table};
use crate::CliError;

const BUCKETS: [ReconBucket; 4] = [
    ReconBucket::Pending,
    ReconBucket::Rejected,
    ReconBucket::Unknown,
    ReconBucket::Approved,
];

fn reconcile(file: &Path, roster: &RosterSnapshot) -> Result<ReconciliationResult, CliError> {
    let table = load_table(file).map_err(|e| CliError {
        code: EXIT_IO,
        message: e,
        hint: None,
    })?;
    let candidates = candidates_from_table(&table).map_err(|e| CliError {
        code: EXIT_SCHEMA,
        message: format!("{}: {}", file.display(), e),
        hint: None,
    })?;
    if !candidates.duplicate_ids.is_empty() {
        tracing::warn!(
            "{}: repeated id(s) ignored: {}",
            file.display(),
            candidates.duplicate_ids.join(", ")
        );
    }
    Ok(classify(&candidates, roster))
}

/// Normalize requested ids, dropping blanks and repeats.
fn requested_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| normalize_id(id))
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

// ============================================================================
// classify
// ============================================================================

pub fn cmd_classify(
    ctx: &Context,
    file: PathBuf,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let session = ctx.open_session()?;
    let result = reconcile(&file, session.roster())?;

    if let Some(path) = &output {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::error(format!("cannot serialize result: {e}")))?;
        std::fs::write(path, text)
            .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        return print_json(&result);
    }

    let s = &result.summary;
    eprintln!(
        "{} candidate(s): {} pending, {} rejected, {} unknown, {} approved",
        s.candidates, s.pending, s.rejected, s.unknown, s.approved
    );

    let mut out = String::new();
    for bucket in BUCKETS {
        let rows = result.bucket(bucket);
        if rows.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{} ({})\n", bucket, rows.len()));
        let table: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                vec![
                    r.id.clone(),
                    number_cell(r.followers),
                    number_cell(r.post_price),
                    r.category.clone(),
                    r.comment.clone(),
                    r.profile_link(),
                ]
            })
            .collect();
        out.push_str(&render_table(
            &["ID", "Followers", "Post price", "Category", "Comment", "Link"],
            &table,
        ));
    }
    print_text(&out)
}

// ============================================================================
// export
// ============================================================================

/// Pending candidates to export: all of them, or those named in `ids`.
pub(crate) fn select_pending(
    pending: &[CanonicalRow],
    ids: &[String],
) -> Result<Vec<CanonicalRow>, CliError> {
    if ids.is_empty() {
        return Ok(pending.to_vec());
    }
    let mut selected = Vec::with_capacity(ids.len());
    for id in requested_ids(ids) {
        match pending.iter().find(|r| r.id == id) {
            Some(row) => selected.push(row.clone()),
            None => {
                return Err(CliError::args(format!("'{}' is not a pending candidate", id))
                    .with_hint("run `roster classify` to see the pending list"))
            }
        }
    }
    Ok(selected)
}

pub fn cmd_export(
    ctx: &Context,
    file: PathBuf,
    ids: Vec<String>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let session = ctx.open_session()?;
    let result = reconcile(&file, session.roster())?;
    let selected = select_pending(&result.pending, &ids)?;
    let table = export_table(&selected);

    let path = output.unwrap_or_else(|| PathBuf::from(&ctx.settings.export.filename));
    let artifact = ExportArtifact::for_path(&table, &path).map_err(CliError::io)?;
    artifact.write_to(&path).map_err(CliError::io)?;

    eprintln!(
        "exported {} pending candidate(s) to {} ({})",
        selected.len(),
        path.display(),
        artifact.mime
    );
    Ok(())
}

// ============================================================================
// promote
// ============================================================================

pub fn cmd_promote(
    ctx: &Context,
    file: PathBuf,
    ids: Vec<String>,
    credibility: Credibility,
    dry_run: bool,
) -> Result<(), CliError> {
    let ids = requested_ids(&ids);
    if ids.is_empty() {
        return Err(CliError::args("no ids given").with_hint("pass --id at least once"));
    }

    let mut session = ctx.open_session()?;
    let result = reconcile(&file, session.roster())?;

    let mut new_rows = Vec::new();
    let mut edits = Vec::new();
    for id in &ids {
        match result.bucket_of(id) {
            Some(ReconBucket::Pending) => {
                if let Some(row) = result.pending.iter().find(|r| &r.id == id) {
                    new_rows.push(row.clone().with_credibility(credibility));
                }
            }
            Some(_) => {
                if let Some((row, _)) = session.roster().find(id) {
                    edits.push(FieldEdit::Credibility { row, value: credibility });
                }
            }
            None => {
                return Err(CliError::args(format!(
                    "'{}' is not in {}",
                    id,
                    file.display()
                )))
            }
        }
    }

    session.stage(edits).map_err(CliError::session)?;
    session.add_rows(new_rows);
    finish(&mut session, dry_run)
}
