//! Roster commands: `status`, `list`, `set`, `add`, `fingerprint`.

use serde::Serialize;

use rosterdesk_recon::{
    normalize_id, CanonicalRow, CommitOutcome, Credibility, CredibilityCounts, FieldEdit,
    LoadReport, VersionToken,
};
use rosterdesk_sheets::{Session, TabularStore};

use crate::backend::{Backend, Context};
use crate::util::{number_cell, print_json, print_text, render_table};
use crate::CliError;

// ============================================================================
// status
// ============================================================================

#[derive(Serialize)]
struct StatusReport {
    store: String,
    version: VersionToken,
    rows: usize,
    #[serde(flatten)]
    counts: CredibilityCounts,
    load_report: LoadReport,
}

pub fn cmd_status(ctx: &Context, json: bool) -> Result<(), CliError> {
    let session = ctx.open_session()?;
    let roster = session.roster();
    let report = StatusReport {
        store: session.store().inner().describe(),
        version: roster.version.clone(),
        rows: roster.len(),
        counts: roster.counts(),
        load_report: roster.report.clone(),
    };

    if json {
        return print_json(&report);
    }

    let mut out = String::new();
    out.push_str(&format!("store:    {}\n", report.store));
    out.push_str(&format!("version:  {}\n", report.version));
    out.push_str(&format!("rows:     {}\n", report.rows));
    out.push_str(&format!("approved: {}\n", report.counts.approved));
    out.push_str(&format!("rejected: {}\n", report.counts.rejected));
    out.push_str(&format!("unknown:  {}\n", report.counts.unknown));
    if report.load_report.blank_ids > 0 || !report.load_report.duplicate_ids.is_empty() {
        out.push_str(&format!(
            "skipped:  {} blank id(s), repeated: {}\n",
            report.load_report.blank_ids,
            report.load_report.duplicate_ids.join(", ")
        ));
    }
    print_text(&out)
}

// ============================================================================
// list
// ============================================================================

#[derive(Serialize)]
struct ListedRow<'a> {
    #[serde(flatten)]
    row: &'a CanonicalRow,
    status: &'static str,
}

/// Rows whose verdict matches and whose comment contains `comment`
/// (case-insensitive).
pub(crate) fn filter_rows<'a>(
    rows: &'a [CanonicalRow],
    credibility: Option<Credibility>,
    comment: Option<&str>,
) -> Vec<&'a CanonicalRow> {
    let needle = comment.map(str::to_lowercase);
    rows.iter()
        .filter(|r| credibility.map_or(true, |c| r.credibility == c))
        .filter(|r| {
            needle
                .as_deref()
                .map_or(true, |n| r.comment.to_lowercase().contains(n))
        })
        .collect()
}

pub fn cmd_list(
    ctx: &Context,
    credibility: Option<Credibility>,
    comment: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let session = ctx.open_session()?;
    let rows = filter_rows(&session.roster().rows, credibility, comment.as_deref());
    tracing::info!("{} of {} roster row(s) match", rows.len(), session.roster().len());

    if json {
        let listed: Vec<ListedRow> = rows
            .iter()
            .map(|r| ListedRow { row: r, status: r.credibility.label() })
            .collect();
        return print_json(&listed);
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                number_cell(r.followers),
                number_cell(r.post_price),
                r.category.clone(),
                r.comment.clone(),
                r.credibility.label().to_string(),
            ]
        })
        .collect();
    print_text(&render_table(
        &["ID", "Followers", "Post price", "Category", "Comment", "Status"],
        &table,
    ))
}

// ============================================================================
// set
// ============================================================================

pub fn cmd_set(
    ctx: &Context,
    id: String,
    credibility: Option<Credibility>,
    comment: Option<String>,
    dry_run: bool,
) -> Result<(), CliError> {
    if credibility.is_none() && comment.is_none() {
        return Err(CliError::args("nothing to set")
            .with_hint("pass --credibility and/or --comment"));
    }

    let mut session = ctx.open_session()?;
    let id = normalize_id(&id);
    let row = match session.roster().find(&id) {
        Some((row, _)) => row,
        None => {
            return Err(CliError::args(format!("'{}' is not in the roster", id))
                .with_hint("use `roster add` for new influencers"))
        }
    };

    let mut edits = Vec::new();
    if let Some(value) = credibility {
        edits.push(FieldEdit::Credibility { row, value });
    }
    if let Some(value) = comment {
        edits.push(FieldEdit::Comment { row, value });
    }
    session.stage(edits).map_err(CliError::session)?;

    finish(&mut session, dry_run)
}

// ============================================================================
// add
// ============================================================================

pub fn cmd_add(
    ctx: &Context,
    ids: Vec<String>,
    comment: Option<String>,
    credibility: Credibility,
    append: bool,
    dry_run: bool,
) -> Result<(), CliError> {
    let comment = comment.unwrap_or_default();
    let rows: Vec<CanonicalRow> = ids
        .iter()
        .map(|id| {
            CanonicalRow::new(id.as_str())
                .with_credibility(credibility)
                .with_comment(comment.as_str())
        })
        .collect();

    let mut session = ctx.open_session()?;

    if append && !dry_run {
        let outcome = session.append_rows(rows).map_err(CliError::session)?;
        report_skipped(outcome.skipped_blank, &outcome.skipped_duplicates);
        eprintln!("appended {} row(s)", outcome.added.len());
        return Ok(());
    }

    let outcome = session.add_rows(rows);
    report_skipped(outcome.skipped_blank, &outcome.skipped_duplicates);
    finish(&mut session, dry_run)
}

fn report_skipped(blank: usize, duplicates: &[String]) {
    if blank > 0 {
        tracing::warn!("skipped {} blank id(s)", blank);
    }
    if !duplicates.is_empty() {
        tracing::warn!("already in the roster: {}", duplicates.join(", "));
    }
}

// ============================================================================
// fingerprint
// ============================================================================

pub fn cmd_fingerprint(ctx: &Context) -> Result<(), CliError> {
    let mut store = ctx.roster_store()?;
    let version = store
        .fingerprint()
        .map_err(|e| CliError::session(e.into()))?;
    print_text(&format!("{}\n", version))
}

// ============================================================================
// shared
// ============================================================================

/// Describe staged edits, then commit them unless `dry_run`.
pub(crate) fn finish(session: &mut Session<Backend>, dry_run: bool) -> Result<(), CliError> {
    let edits = session.tracker().edits();
    let baseline = session.roster();
    for (row, changes) in &edits.changes {
        let id = baseline.rows.get(*row).map(|r| r.id.as_str()).unwrap_or("?");
        let mut parts = Vec::new();
        if let Some(c) = changes.credibility {
            parts.push(format!("credibility={}", c));
        }
        if let Some(c) = &changes.comment {
            parts.push(format!("comment={:?}", c));
        }
        eprintln!("  ~ {} {}", id, parts.join(" "));
    }
    for row in &edits.new_rows {
        eprintln!("  + {} credibility={}", row.id, row.credibility);
    }

    if dry_run {
        eprintln!(
            "dry run: {} changed row(s), {} new row(s) not committed",
            edits.changed_rows(),
            edits.new_rows.len()
        );
        return Ok(());
    }

    match session.commit().map_err(CliError::session)? {
        CommitOutcome::NothingToCommit => eprintln!("nothing to commit"),
        CommitOutcome::Committed(summary) => eprintln!(
            "committed {} changed row(s), {} new row(s); version {}",
            summary.changed_rows, summary.added_rows, summary.version
        ),
    }
    Ok(())
}
