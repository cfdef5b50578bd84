//! Roster persistence over a [`TabularStore`].
//!
//! Reads go through two short-lived caches: the full value matrix and the
//! version token. Any write, or an explicit [`RosterStore::refresh`], drops
//! both.
//!
//! Commit is `clear()` followed by `update()`. The pair is not atomic: if
//! the update fails the remote tab can be left empty. The error is returned
//! and the caller still holds its edits.

use std::time::Duration;

use rosterdesk_recon::{
    fingerprint, CanonicalRow, RosterError, RosterSink, RosterSnapshot, VersionToken,
};

use crate::client::SheetsError;
use crate::policy::TimedCache;
use crate::store::{AppendMode, TabularStore};

#[derive(Debug)]
pub enum StoreError {
    Remote(SheetsError),
    Schema(RosterError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Remote(e) => write!(f, "{}", e),
            StoreError::Schema(e) => write!(f, "roster schema: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Remote(e) => Some(e),
            StoreError::Schema(e) => Some(e),
        }
    }
}

impl From<SheetsError> for StoreError {
    fn from(e: SheetsError) -> Self {
        StoreError::Remote(e)
    }
}

impl From<RosterError> for StoreError {
    fn from(e: RosterError) -> Self {
        StoreError::Schema(e)
    }
}

/// Cache lifetimes for roster reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub roster_ttl: Duration,
    pub version_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            roster_ttl: Duration::from_secs(120),
            version_ttl: Duration::from_secs(60),
        }
    }
}

pub struct RosterStore<S> {
    store: S,
    values: TimedCache<Vec<Vec<String>>>,
    version: TimedCache<VersionToken>,
}

impl<S: TabularStore> RosterStore<S> {
    pub fn new(store: S, cache: CachePolicy) -> Self {
        Self {
            store,
            values: TimedCache::new(cache.roster_ttl),
            version: TimedCache::new(cache.version_ttl),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Load and decode the roster.
    pub fn load(&mut self) -> Result<RosterSnapshot, StoreError> {
        let store = &self.store;
        let values = self.values.get_or_try_insert_with(|| store.get_all_values())?;
        let snapshot = RosterSnapshot::from_values(&values)?;

        let report = &snapshot.report;
        if report.blank_ids > 0 {
            log::warn!(
                "{}: {} row(s) without an id are hidden and will be dropped on commit",
                store.describe(),
                report.blank_ids
            );
        }
        log::debug!(
            "loaded {} roster row(s) from {} (version {})",
            snapshot.len(),
            store.describe(),
            snapshot.version
        );
        Ok(snapshot)
    }

    /// Current remote version token.
    pub fn fingerprint(&mut self) -> Result<VersionToken, StoreError> {
        let store = &self.store;
        let version = self
            .version
            .get_or_try_insert_with(|| store.get_all_values().map(|v| fingerprint(&v)))?;
        Ok(version)
    }

    /// Drop cached reads so the next call goes to the store.
    pub fn refresh(&mut self) {
        self.values.invalidate();
        self.version.invalidate();
    }

    /// Replace the whole remote table with `snapshot`. Returns the version of
    /// what was written.
    pub fn commit(&mut self, snapshot: &RosterSnapshot) -> Result<VersionToken, StoreError> {
        let values = snapshot.to_values();
        self.refresh();

        self.store.clear()?;
        if let Err(e) = self.store.update(&values) {
            log::error!(
                "{}: cleared but update failed; remote may be empty until the next commit",
                self.store.describe()
            );
            return Err(e.into());
        }

        let version = fingerprint(&values);
        log::info!(
            "committed {} row(s) to {} (version {})",
            snapshot.len(),
            self.store.describe(),
            version
        );
        Ok(version)
    }

    /// Append rows after the current table, encoded in `snapshot`'s layout.
    /// An empty remote gets the header row first.
    pub fn append(
        &mut self,
        snapshot: &RosterSnapshot,
        rows: &[CanonicalRow],
    ) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut values = Vec::with_capacity(rows.len() + 1);
        if snapshot.version == fingerprint(&[]) {
            values.push(snapshot.layout.headers.clone());
        }
        values.extend(rows.iter().map(|r| snapshot.layout.encode_row(r)));

        self.refresh();
        self.store.append_rows(&values, AppendMode::InsertRows)?;
        log::info!("appended {} row(s) to {}", rows.len(), self.store.describe());
        Ok(())
    }
}

impl<S: TabularStore> RosterSink for RosterStore<S> {
    type Error = StoreError;

    fn commit(&mut self, snapshot: &RosterSnapshot) -> Result<VersionToken, StoreError> {
        RosterStore::commit(self, snapshot)
    }
}
