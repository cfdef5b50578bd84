//! Local edits against the last-synced roster snapshot.
//!
//! The tracker holds the baseline (what the remote looked like at load) and
//! an [`EditSet`] describing what the user changed since. Only material
//! changes are recorded: setting a field to its baseline value removes the
//! entry instead of adding one. Nothing is durable until [`EditTracker::commit`]
//! hands the working snapshot to a [`RosterSink`].

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::RosterError;
use crate::fingerprint::VersionToken;
use crate::model::{CanonicalRow, Credibility};
use crate::roster::{LoadReport, RosterSnapshot};
use crate::schema::normalize_id;

/// A single field change addressed by baseline row index.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Credibility { row: usize, value: Credibility },
    Comment { row: usize, value: String },
}

impl FieldEdit {
    fn row(&self) -> usize {
        match self {
            Self::Credibility { row, .. } | Self::Comment { row, .. } => *row,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credibility: Option<Credibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RowChanges {
    fn is_empty(&self) -> bool {
        self.credibility.is_none() && self.comment.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditSet {
    /// Baseline row index → changed fields.
    pub changes: BTreeMap<usize, RowChanges>,
    /// Rows to place in front of the roster, newest batch first.
    pub new_rows: Vec<CanonicalRow>,
}

impl EditSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.new_rows.is_empty()
    }

    pub fn changed_rows(&self) -> usize {
        self.changes.len()
    }

    /// Apply to a baseline: field changes first, then new rows in front.
    pub fn apply(&self, baseline: &RosterSnapshot) -> RosterSnapshot {
        let mut snapshot = baseline.clone();
        for (&i, change) in &self.changes {
            let Some(row) = snapshot.rows.get_mut(i) else {
                continue;
            };
            if let Some(c) = change.credibility {
                row.credibility = c;
            }
            if let Some(comment) = &change.comment {
                row.comment = comment.clone();
            }
        }
        if !self.new_rows.is_empty() {
            let mut rows = self.new_rows.clone();
            rows.append(&mut snapshot.rows);
            snapshot.rows = rows;
        }
        snapshot
    }
}

/// Destination for a committed roster. Returns the version of what was
/// written.
pub trait RosterSink {
    type Error;

    fn commit(&mut self, snapshot: &RosterSnapshot) -> Result<VersionToken, Self::Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub added: Vec<String>,
    pub skipped_blank: usize,
    pub skipped_duplicates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub changed_rows: usize,
    pub added_rows: usize,
    pub version: VersionToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    NothingToCommit,
    Committed(CommitSummary),
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EditTracker {
    baseline: RosterSnapshot,
    edits: EditSet,
}

impl EditTracker {
    pub fn new(baseline: RosterSnapshot) -> Self {
        Self {
            baseline,
            edits: EditSet::default(),
        }
    }

    pub fn baseline(&self) -> &RosterSnapshot {
        &self.baseline
    }

    pub fn edits(&self) -> &EditSet {
        &self.edits
    }

    pub fn has_changes(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Record field edits. An edit equal to the baseline value clears any
    /// earlier change to that field.
    ///
    /// The batch is all or nothing: if any edit addresses a row outside the
    /// baseline, nothing is recorded.
    pub fn stage<I>(&mut self, edits: I) -> Result<&EditSet, RosterError>
    where
        I: IntoIterator<Item = FieldEdit>,
    {
        let edits: Vec<FieldEdit> = edits.into_iter().collect();
        let len = self.baseline.len();
        if let Some(bad) = edits.iter().find(|e| e.row() >= len) {
            return Err(RosterError::RowOutOfRange { row: bad.row(), len });
        }

        for edit in edits {
            let i = edit.row();
            let base = &self.baseline.rows[i];

            let entry = self.edits.changes.entry(i).or_default();
            match edit {
                FieldEdit::Credibility { value, .. } => {
                    entry.credibility = (value != base.credibility).then_some(value);
                }
                FieldEdit::Comment { value, .. } => {
                    entry.comment = (value != base.comment).then_some(value);
                }
            }
            if entry.is_empty() {
                self.edits.changes.remove(&i);
            }
        }
        Ok(&self.edits)
    }

    /// Diff a full edited copy of the baseline table, row by row.
    pub fn stage_table(&mut self, rows: &[CanonicalRow]) -> Result<&EditSet, RosterError> {
        let edits = rows.iter().enumerate().flat_map(|(row, r)| {
            [
                FieldEdit::Credibility { row, value: r.credibility },
                FieldEdit::Comment { row, value: r.comment.clone() },
            ]
        });
        let edits: Vec<FieldEdit> = edits.collect();
        self.stage(edits)
    }

    /// Queue new rows for the front of the roster.
    ///
    /// Ids are normalized; blank ids and ids already present (in the
    /// baseline, among queued rows, or earlier in this batch) are skipped.
    pub fn add_rows<I>(&mut self, rows: I) -> AddOutcome
    where
        I: IntoIterator<Item = CanonicalRow>,
    {
        let mut taken: HashSet<String> = self
            .baseline
            .rows
            .iter()
            .chain(self.edits.new_rows.iter())
            .map(|r| r.id.clone())
            .collect();

        let mut outcome = AddOutcome::default();
        let mut batch = Vec::new();
        for mut row in rows {
            row.id = normalize_id(&row.id);
            if row.id.is_empty() {
                outcome.skipped_blank += 1;
                continue;
            }
            if !taken.insert(row.id.clone()) {
                outcome.skipped_duplicates.push(row.id);
                continue;
            }
            // Source cells belong to another layout.
            row.raw.clear();
            outcome.added.push(row.id.clone());
            batch.push(row);
        }

        batch.append(&mut self.edits.new_rows);
        self.edits.new_rows = batch;
        outcome
    }

    /// Baseline with all pending edits applied.
    pub fn working_snapshot(&self) -> RosterSnapshot {
        self.edits.apply(&self.baseline)
    }

    /// Drop all pending edits. Returns how many row changes and new rows
    /// were discarded.
    pub fn discard(&mut self) -> usize {
        let n = self.edits.changes.len() + self.edits.new_rows.len();
        self.edits = EditSet::default();
        n
    }

    /// Swap in a freshly loaded baseline, discarding pending edits.
    pub fn reset(&mut self, baseline: RosterSnapshot) -> usize {
        let discarded = self.discard();
        self.baseline = baseline;
        discarded
    }

    /// Write the working snapshot through `sink`.
    ///
    /// On success the written snapshot becomes the new baseline and the edit
    /// set is cleared. On failure nothing changes, so the caller can retry.
    pub fn commit<S: RosterSink>(&mut self, sink: &mut S) -> Result<CommitOutcome, S::Error> {
        if self.edits.is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }

        let mut working = self.working_snapshot();
        let version = sink.commit(&working)?;

        let summary = CommitSummary {
            changed_rows: self.edits.changes.len(),
            added_rows: self.edits.new_rows.len(),
            version: version.clone(),
        };

        for row in working.rows.iter_mut() {
            row.raw = working.layout.encode_row(row);
        }
        working.version = version;
        working.report = LoadReport::default();
        self.baseline = working;
        self.edits = EditSet::default();

        Ok(CommitOutcome::Committed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;

    fn v(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn snapshot() -> RosterSnapshot {
        RosterSnapshot::from_values(&v(&[
            &["ID", "Comment", "Credibility"],
            &["jane", "", "False"],
            &["bob", "ok", "True"],
        ]))
        .unwrap()
    }

    /// Sink that records what it was given.
    #[derive(Default)]
    struct Recorder {
        written: Vec<Vec<Vec<String>>>,
        fail: bool,
    }

    impl RosterSink for Recorder {
        type Error = String;

        fn commit(&mut self, snapshot: &RosterSnapshot) -> Result<VersionToken, String> {
            if self.fail {
                return Err("boom".into());
            }
            let values = snapshot.to_values();
            let version = fingerprint(&values);
            self.written.push(values);
            Ok(version)
        }
    }

    #[test]
    fn unchanged_values_produce_no_entries() {
        let mut t = EditTracker::new(snapshot());
        t.stage([
            FieldEdit::Credibility { row: 0, value: Credibility::Rejected },
            FieldEdit::Comment { row: 1, value: "ok".into() },
        ])
        .unwrap();
        assert!(t.edits().is_empty());
    }

    #[test]
    fn staging_the_baseline_table_is_idempotent() {
        let mut t = EditTracker::new(snapshot());
        let rows = t.baseline().rows.clone();
        assert!(t.stage_table(&rows).unwrap().is_empty());
        assert!(t.stage_table(&rows).unwrap().is_empty());
        assert_eq!(t.working_snapshot().to_values(), t.baseline().to_values());
    }

    #[test]
    fn reverting_an_edit_removes_it() {
        let mut t = EditTracker::new(snapshot());
        t.stage([FieldEdit::Credibility { row: 0, value: Credibility::Approved }])
            .unwrap();
        assert_eq!(t.edits().changed_rows(), 1);

        t.stage([FieldEdit::Credibility { row: 0, value: Credibility::Rejected }])
            .unwrap();
        assert!(t.edits().is_empty());
    }

    #[test]
    fn out_of_range_row_is_rejected() {
        let mut t = EditTracker::new(snapshot());
        let err = t
            .stage([FieldEdit::Comment { row: 7, value: "x".into() }])
            .unwrap_err();
        assert_eq!(err, RosterError::RowOutOfRange { row: 7, len: 2 });
    }

    #[test]
    fn bad_row_in_batch_leaves_tracker_untouched() {
        let mut t = EditTracker::new(snapshot());
        let err = t
            .stage([
                FieldEdit::Comment { row: 0, value: "hello".into() },
                FieldEdit::Comment { row: 99, value: "x".into() },
            ])
            .unwrap_err();
        assert_eq!(err, RosterError::RowOutOfRange { row: 99, len: 2 });
        assert!(!t.has_changes());
        assert!(t.edits().is_empty());
    }

    #[test]
    fn new_rows_go_in_front_newest_batch_first() {
        let mut t = EditTracker::new(snapshot());
        let first = t.add_rows([CanonicalRow::new("@a"), CanonicalRow::new("b")]);
        assert_eq!(first.added, vec!["a", "b"]);
        let second = t.add_rows([
            CanonicalRow::new("c"),
            CanonicalRow::new("jane"),
            CanonicalRow::new("a"),
            CanonicalRow::new("  "),
        ]);
        assert_eq!(second.added, vec!["c"]);
        assert_eq!(second.skipped_duplicates, vec!["jane", "a"]);
        assert_eq!(second.skipped_blank, 1);

        let ids: Vec<String> = t.working_snapshot().rows.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "a", "b", "jane", "bob"]);
    }

    #[test]
    fn commit_writes_and_rebaselines() {
        let mut t = EditTracker::new(snapshot());
        t.stage([FieldEdit::Comment { row: 0, value: "fake followers".into() }])
            .unwrap();
        t.add_rows([CanonicalRow::new("zoe").with_credibility(Credibility::Approved)]);

        let mut sink = Recorder::default();
        let outcome = t.commit(&mut sink).unwrap();
        let CommitOutcome::Committed(summary) = outcome else {
            panic!("expected a commit");
        };
        assert_eq!(summary.changed_rows, 1);
        assert_eq!(summary.added_rows, 1);

        let written = &sink.written[0];
        assert_eq!(written[1], vec!["zoe", "", "True"]);
        assert_eq!(written[2], vec!["jane", "fake followers", "False"]);
        assert!(!t.has_changes());
        assert_eq!(t.baseline().version, summary.version);
        assert_eq!(t.baseline().rows[1].comment, "fake followers");
    }

    #[test]
    fn empty_commit_is_a_no_op() {
        let mut t = EditTracker::new(snapshot());
        let mut sink = Recorder::default();
        assert_eq!(t.commit(&mut sink).unwrap(), CommitOutcome::NothingToCommit);
        assert!(sink.written.is_empty());
    }

    #[test]
    fn failed_commit_keeps_edits() {
        let mut t = EditTracker::new(snapshot());
        t.stage([FieldEdit::Credibility { row: 1, value: Credibility::Rejected }])
            .unwrap();
        let mut sink = Recorder { fail: true, ..Recorder::default() };
        assert!(t.commit(&mut sink).is_err());
        assert_eq!(t.edits().changed_rows(), 1);
        assert_eq!(t.baseline().rows[1].credibility, Credibility::Approved);
    }

    #[test]
    fn reset_discards_pending_edits() {
        let mut t = EditTracker::new(snapshot());
        t.add_rows([CanonicalRow::new("x")]);
        t.stage([FieldEdit::Comment { row: 0, value: "y".into() }]).unwrap();
        assert_eq!(t.reset(snapshot()), 2);
        assert!(!t.has_changes());
    }
}
