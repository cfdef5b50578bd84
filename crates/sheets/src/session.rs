//! One editing session: the roster store plus the local edit tracker.
//!
//! Before every write the remote version is compared with the one the
//! session loaded. A mismatch means someone else changed the tab: the
//! session reloads, drops its pending edits and reports how many were lost.
//! Only appends and last-row edits are visible this way.

use rosterdesk_recon::{
    AddOutcome, CanonicalRow, CommitOutcome, EditTracker, FieldEdit, RosterError, RosterSnapshot,
    VersionToken,
};

use crate::adapter::{RosterStore, StoreError};
use crate::store::TabularStore;

#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Edit(RosterError),
    /// The remote changed since load. State has been reloaded.
    ConcurrentModification { discarded: usize },
    /// The write failed; pending edits are kept.
    Commit(StoreError),
    /// An append was requested while other edits are pending.
    PendingEdits { count: usize },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Store(e) => write!(f, "{}", e),
            SessionError::Edit(e) => write!(f, "{}", e),
            SessionError::ConcurrentModification { discarded } => write!(
                f,
                "the sheet was updated by someone else; reloaded and discarded {} pending change(s)",
                discarded
            ),
            SessionError::Commit(e) => write!(f, "commit failed, edits kept: {}", e),
            SessionError::PendingEdits { count } => {
                write!(f, "{} pending change(s) must be committed before appending", count)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Store(e) | SessionError::Commit(e) => Some(e),
            SessionError::Edit(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Store(e)
    }
}

impl From<RosterError> for SessionError {
    fn from(e: RosterError) -> Self {
        SessionError::Edit(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    InSync,
    /// Remote changed and there was nothing local to lose.
    Reloaded { version: VersionToken },
}

pub struct Session<S> {
    store: RosterStore<S>,
    tracker: EditTracker,
}

impl<S: TabularStore> Session<S> {
    pub fn open(mut store: RosterStore<S>) -> Result<Self, SessionError> {
        let snapshot = store.load()?;
        Ok(Self {
            store,
            tracker: EditTracker::new(snapshot),
        })
    }

    /// The roster as last synced.
    pub fn roster(&self) -> &RosterSnapshot {
        self.tracker.baseline()
    }

    /// The roster with pending edits applied.
    pub fn working(&self) -> RosterSnapshot {
        self.tracker.working_snapshot()
    }

    pub fn tracker(&self) -> &EditTracker {
        &self.tracker
    }

    pub fn store(&self) -> &RosterStore<S> {
        &self.store
    }

    pub fn stage<I>(&mut self, edits: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = FieldEdit>,
    {
        self.tracker.stage(edits)?;
        Ok(())
    }

    pub fn add_rows<I>(&mut self, rows: I) -> AddOutcome
    where
        I: IntoIterator<Item = CanonicalRow>,
    {
        self.tracker.add_rows(rows)
    }

    /// Reload from the remote regardless of version. Returns discarded edits.
    pub fn refresh(&mut self) -> Result<usize, SessionError> {
        self.store.refresh();
        let snapshot = self.store.load()?;
        Ok(self.tracker.reset(snapshot))
    }

    /// Compare the remote version with the loaded one and reload if needed.
    ///
    /// `fresh` bypasses the version cache.
    pub fn sync(&mut self, fresh: bool) -> Result<SyncStatus, SessionError> {
        if fresh {
            self.store.refresh();
        }
        let remote = self.store.fingerprint()?;
        if remote == self.tracker.baseline().version {
            return Ok(SyncStatus::InSync);
        }

        log::warn!("remote roster changed since load; reloading");
        let discarded = self.refresh()?;
        if discarded > 0 {
            return Err(SessionError::ConcurrentModification { discarded });
        }
        Ok(SyncStatus::Reloaded {
            version: self.tracker.baseline().version.clone(),
        })
    }

    /// Write pending edits after a fresh version check.
    pub fn commit(&mut self) -> Result<CommitOutcome, SessionError> {
        if !self.tracker.has_changes() {
            return Ok(CommitOutcome::NothingToCommit);
        }
        self.sync(true)?;
        self.tracker
            .commit(&mut self.store)
            .map_err(SessionError::Commit)
    }

    /// Append new rows without rewriting the table.
    pub fn append_rows<I>(&mut self, rows: I) -> Result<AddOutcome, SessionError>
    where
        I: IntoIterator<Item = CanonicalRow>,
    {
        if self.tracker.has_changes() {
            let edits = self.tracker.edits();
            return Err(SessionError::PendingEdits {
                count: edits.changed_rows() + edits.new_rows.len(),
            });
        }
        self.sync(true)?;

        let outcome = self.tracker.add_rows(rows);
        let new_rows = self.tracker.edits().new_rows.clone();
        if new_rows.is_empty() {
            return Ok(outcome);
        }

        self.store
            .append(self.tracker.baseline(), &new_rows)
            .map_err(SessionError::Commit)?;
        self.refresh()?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CachePolicy;
    use crate::client::SheetsError;
    use crate::store::{MemoryStore, StoreOp};
    use rosterdesk_recon::Credibility;

    fn v(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn ten_rows() -> Vec<Vec<String>> {
        let mut values = v(&[&["ID", "Comment", "Credibility"]]);
        for i in 1..9 {
            values.push(vec![format!("user{i}"), String::new(), "False".into()]);
        }
        values.push(v(&[&["bob", "ok", "True"]]).remove(0));
        values
    }

    fn session(mem: &MemoryStore) -> Session<MemoryStore> {
        Session::open(RosterStore::new(mem.clone(), CachePolicy::default())).unwrap()
    }

    #[test]
    fn commit_round_trip() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);
        s.stage([FieldEdit::Comment { row: 0, value: "fake".into() }]).unwrap();
        s.add_rows([CanonicalRow::new("zoe").with_credibility(Credibility::Rejected)]);

        let CommitOutcome::Committed(summary) = s.commit().unwrap() else {
            panic!("expected a commit");
        };
        assert_eq!(summary.added_rows, 1);
        let values = mem.values();
        assert_eq!(values[1], vec!["zoe", "", "False"]);
        assert_eq!(values[2], vec!["user1", "fake", "False"]);
        assert!(!s.tracker().has_changes());
        assert_eq!(s.sync(true).unwrap(), SyncStatus::InSync);
    }

    #[test]
    fn concurrent_append_discards_local_edits() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);
        s.stage([FieldEdit::Credibility { row: 2, value: Credibility::Approved }])
            .unwrap();

        // another editor appends a row
        let mut other = mem.values();
        other.push(vec!["eve".into(), String::new(), String::new()]);
        mem.set_values(other);

        let err = s.commit().unwrap_err();
        assert!(matches!(err, SessionError::ConcurrentModification { discarded: 1 }));
        assert!(!s.tracker().has_changes());
        assert!(s.roster().find("eve").is_some());
        // nothing was written
        assert_eq!(mem.calls(StoreOp::Clear), 0);
    }

    #[test]
    fn mid_table_edit_goes_unnoticed() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);
        s.stage([FieldEdit::Comment { row: 5, value: "mine".into() }]).unwrap();

        // another editor flips row 3 without changing the row count or last row
        let mut other = mem.values();
        other[3][2] = "True".into();
        mem.set_values(other);

        assert!(matches!(s.commit().unwrap(), CommitOutcome::Committed(_)));
        // our stale copy of row 3 overwrote theirs
        assert_eq!(mem.values()[3][2], "False");
        assert_eq!(mem.values()[6][1], "mine");
    }

    #[test]
    fn sync_reloads_quietly_without_edits() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);

        let mut other = mem.values();
        other.push(vec!["eve".into(), String::new(), String::new()]);
        mem.set_values(other);

        assert!(matches!(s.sync(true).unwrap(), SyncStatus::Reloaded { .. }));
        assert_eq!(s.roster().len(), 10);
    }

    #[test]
    fn failed_commit_keeps_edits() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);
        s.stage([FieldEdit::Comment { row: 0, value: "x".into() }]).unwrap();

        mem.fail_next(StoreOp::Clear, SheetsError::Http(500, "boom".into()));
        assert!(matches!(s.commit().unwrap_err(), SessionError::Commit(_)));
        assert!(s.tracker().has_changes());

        // second try goes through
        assert!(matches!(s.commit().unwrap(), CommitOutcome::Committed(_)));
    }

    #[test]
    fn empty_commit_does_not_touch_remote() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);
        assert_eq!(s.commit().unwrap(), CommitOutcome::NothingToCommit);
        assert_eq!(mem.calls(StoreOp::Get), 1);
    }

    #[test]
    fn append_rows_skips_known_ids() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);
        let outcome = s
            .append_rows([CanonicalRow::new("@new"), CanonicalRow::new("bob")])
            .unwrap();
        assert_eq!(outcome.added, vec!["new"]);
        assert_eq!(outcome.skipped_duplicates, vec!["bob"]);

        assert_eq!(mem.values().last().unwrap()[0], "new");
        assert_eq!(mem.calls(StoreOp::Clear), 0);
        assert!(s.roster().find("new").is_some());
        assert!(!s.tracker().has_changes());
    }

    #[test]
    fn append_refuses_with_pending_edits() {
        let mem = MemoryStore::new(ten_rows());
        let mut s = session(&mem);
        s.stage([FieldEdit::Comment { row: 0, value: "x".into() }]).unwrap();
        let err = s.append_rows([CanonicalRow::new("z")]).unwrap_err();
        assert!(matches!(err, SessionError::PendingEdits { count: 1 }));
    }
}
