//! The authoritative roster as a versioned snapshot.
//!
//! A snapshot is decoded from the remote value matrix and encoded back into
//! one on commit. Rows read from the sheet keep their source cells, so
//! write-back only rewrites the columns the engine edits (comment and
//! credibility); rows added in this session are written from their typed
//! fields.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::RosterError;
use crate::fingerprint::{fingerprint, VersionToken};
use crate::model::{CanonicalRow, Credibility};
use crate::schema::{format_number, map_with, CanonicalField, ColumnMap};
use crate::table::RawTable;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Header row of the remote sheet and how its columns bind to fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterLayout {
    pub headers: Vec<String>,
    pub columns: ColumnMap,
}

impl RosterLayout {
    /// Layout used when the remote sheet is completely empty: every
    /// canonical column in schema order.
    pub fn canonical() -> Self {
        let headers: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|f| f.label().to_string())
            .collect();
        let mut columns = ColumnMap::default();
        for (col, field) in CanonicalField::ALL.iter().enumerate() {
            columns.bind(*field, col);
        }
        Self { headers, columns }
    }

    /// Resolve a roster header row. Besides the schema mapping, the roster
    /// needs a credibility and a comment column; when no alias matches, the
    /// first unbound header containing the keyword is used.
    pub fn resolve(headers: Vec<String>) -> Result<Self, RosterError> {
        let mut columns = ColumnMap::resolve(&headers)?;

        for (field, keyword) in [
            (CanonicalField::Credibility, "credibility"),
            (CanonicalField::Comment, "comment"),
        ] {
            if columns.column(field).is_some() {
                continue;
            }
            let found = columns
                .extras
                .iter()
                .copied()
                .find(|&c| headers[c].to_lowercase().contains(keyword));
            match found {
                Some(col) => columns.bind(field, col),
                None => {
                    return Err(RosterError::MissingColumn {
                        column: field.label().to_string(),
                    })
                }
            }
        }

        Ok(Self { headers, columns })
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Encode a row into sheet cells for this layout.
    pub fn encode_row(&self, row: &CanonicalRow) -> Vec<String> {
        let width = self.width();

        if row.raw.is_empty() {
            let mut cells = vec![String::new(); width];
            for field in CanonicalField::ALL {
                if let Some(col) = self.columns.column(field) {
                    cells[col] = field_cell(row, field);
                }
            }
            return cells;
        }

        let mut cells: Vec<String> = row.raw.iter().take(width).cloned().collect();
        cells.resize(width, String::new());
        for field in [CanonicalField::Comment, CanonicalField::Credibility] {
            if let Some(col) = self.columns.column(field) {
                cells[col] = field_cell(row, field);
            }
        }
        cells
    }
}

fn field_cell(row: &CanonicalRow, field: CanonicalField) -> String {
    let number = |n: Option<f64>| n.map(format_number).unwrap_or_default();
    match field {
        CanonicalField::Id => row.id.clone(),
        CanonicalField::Followers => number(row.followers),
        CanonicalField::PostPrice => number(row.post_price),
        CanonicalField::AvgView => number(row.avg_view),
        CanonicalField::AvgLike => number(row.avg_like),
        CanonicalField::AvgComments => number(row.avg_comments),
        CanonicalField::Ier => number(row.ier),
        CanonicalField::Cpv => number(row.cpv),
        CanonicalField::Category => row.category.clone(),
        CanonicalField::Link => row.link.clone().unwrap_or_default(),
        CanonicalField::Comment => row.comment.clone(),
        CanonicalField::Credibility => row.credibility.to_cell().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// What was dropped while decoding the remote sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub blank_ids: usize,
    pub duplicate_ids: Vec<String>,
    pub coerced_cells: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredibilityCounts {
    pub approved: usize,
    pub rejected: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    pub layout: RosterLayout,
    pub rows: Vec<CanonicalRow>,
    pub version: VersionToken,
    pub report: LoadReport,
}

impl RosterSnapshot {
    /// Decode a full `get_all_values()` matrix.
    ///
    /// An empty matrix gives an empty roster with the canonical layout. Blank
    /// ids are excluded; a repeated id keeps its first row.
    pub fn from_values(values: &[Vec<String>]) -> Result<Self, RosterError> {
        let version = fingerprint(values);
        if values.is_empty() {
            return Ok(Self {
                layout: RosterLayout::canonical(),
                rows: Vec::new(),
                version,
                report: LoadReport::default(),
            });
        }

        let table = RawTable::from_values(values);
        let layout = RosterLayout::resolve(table.headers.clone())?;
        let mapped = map_with(&table, layout.columns.clone());

        let mut report = LoadReport {
            blank_ids: mapped.blank_ids,
            duplicate_ids: Vec::new(),
            coerced_cells: mapped.coerced_cells,
        };
        let mut seen: HashSet<String> = HashSet::with_capacity(mapped.rows.len());
        let mut rows = Vec::with_capacity(mapped.rows.len());
        for row in mapped.rows {
            if seen.insert(row.id.clone()) {
                rows.push(row);
            } else {
                report.duplicate_ids.push(row.id);
            }
        }

        if !report.duplicate_ids.is_empty() {
            log::warn!(
                "roster has {} repeated id(s); keeping first occurrence",
                report.duplicate_ids.len()
            );
        }

        Ok(Self { layout, rows, version, report })
    }

    /// Encode as a value matrix: header row followed by every row.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.layout.headers.clone())
            .chain(self.rows.iter().map(|r| self.layout.encode_row(r)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<(usize, &CanonicalRow)> {
        self.rows.iter().enumerate().find(|(_, r)| r.id == id)
    }

    pub fn index_by_id(&self) -> HashMap<&str, usize> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect()
    }

    pub fn counts(&self) -> CredibilityCounts {
        let mut counts = CredibilityCounts::default();
        for row in &self.rows {
            match row.credibility {
                Credibility::Approved => counts.approved += 1,
                Credibility::Rejected => counts.rejected += 1,
                Credibility::Unknown => counts.unknown += 1,
            }
        }
        counts
    }
}
