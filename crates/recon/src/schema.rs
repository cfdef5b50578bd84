//! Column-name normalization and canonical schema mapping.
//!
//! Influencer lists arrive with whatever headers the agency felt like
//! typing: `Follower Count`, `audience_size`, `Eng. Rate`. Every header is
//! normalized (trim, lowercase, runs of whitespace/`-`/`_` collapsed to one
//! space), looked up in a many-to-one alias table, and bound to a
//! [`CanonicalField`]. Unmapped headers pass through as extra columns.
//!
//! If nothing maps to `ID`, the first column is taken as the identifier.

use std::collections::HashSet;

use crate::error::RosterError;
use crate::model::{CandidateBatch, CanonicalRow, Credibility};
use crate::table::RawTable;

// ---------------------------------------------------------------------------
// Canonical fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Id,
    Followers,
    PostPrice,
    AvgView,
    AvgLike,
    AvgComments,
    Ier,
    Cpv,
    Category,
    Link,
    Comment,
    Credibility,
}

const FIELD_COUNT: usize = 12;

impl CanonicalField {
    /// The canonical influencer schema, in column order.
    pub const SCHEMA: [CanonicalField; 10] = [
        Self::Id,
        Self::Followers,
        Self::PostPrice,
        Self::AvgView,
        Self::AvgLike,
        Self::AvgComments,
        Self::Ier,
        Self::Cpv,
        Self::Category,
        Self::Link,
    ];

    /// Schema plus the two roster bookkeeping columns.
    pub const ALL: [CanonicalField; FIELD_COUNT] = [
        Self::Id,
        Self::Followers,
        Self::PostPrice,
        Self::AvgView,
        Self::AvgLike,
        Self::AvgComments,
        Self::Ier,
        Self::Cpv,
        Self::Category,
        Self::Link,
        Self::Comment,
        Self::Credibility,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Followers => "Followers",
            Self::PostPrice => "Post price",
            Self::AvgView => "Avg View",
            Self::AvgLike => "Avg like",
            Self::AvgComments => "Avg comments",
            Self::Ier => "IER",
            Self::Cpv => "CPV",
            Self::Category => "Category",
            Self::Link => "Link",
            Self::Comment => "Comment",
            Self::Credibility => "Credibility",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Followers
                | Self::PostPrice
                | Self::AvgView
                | Self::AvgLike
                | Self::AvgComments
                | Self::Ier
                | Self::Cpv
        )
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Normalized header name → canonical field.
const COLUMN_ALIASES: &[(&str, CanonicalField)] = &[
    ("id", CanonicalField::Id),
    ("username", CanonicalField::Id),
    ("handle", CanonicalField::Id),
    ("profile", CanonicalField::Id),
    ("followers", CanonicalField::Followers),
    ("follower", CanonicalField::Followers),
    ("follower count", CanonicalField::Followers),
    ("followers count", CanonicalField::Followers),
    ("audience", CanonicalField::Followers),
    ("audience size", CanonicalField::Followers),
    ("post price", CanonicalField::PostPrice),
    ("post price (t)", CanonicalField::PostPrice),
    ("postprice", CanonicalField::PostPrice),
    ("price", CanonicalField::PostPrice),
    ("rate", CanonicalField::PostPrice),
    ("price per post", CanonicalField::PostPrice),
    ("post rate", CanonicalField::PostPrice),
    ("post fee", CanonicalField::PostPrice),
    ("avg view", CanonicalField::AvgView),
    ("avg views", CanonicalField::AvgView),
    ("average view", CanonicalField::AvgView),
    ("average views", CanonicalField::AvgView),
    ("view average", CanonicalField::AvgView),
    ("views avg", CanonicalField::AvgView),
    ("avg like", CanonicalField::AvgLike),
    ("avg likes", CanonicalField::AvgLike),
    ("ave like", CanonicalField::AvgLike),
    ("ave likes", CanonicalField::AvgLike),
    ("average like", CanonicalField::AvgLike),
    ("average likes", CanonicalField::AvgLike),
    ("avg comment", CanonicalField::AvgComments),
    ("avg comments", CanonicalField::AvgComments),
    ("ave comment", CanonicalField::AvgComments),
    ("ave comments", CanonicalField::AvgComments),
    ("average comment", CanonicalField::AvgComments),
    ("average comments", CanonicalField::AvgComments),
    ("ier", CanonicalField::Ier),
    ("ie", CanonicalField::Ier),
    ("er", CanonicalField::Ier),
    ("engagement rate", CanonicalField::Ier),
    ("eng. rate", CanonicalField::Ier),
    ("cpv", CanonicalField::Cpv),
    ("cost per view", CanonicalField::Cpv),
    ("category", CanonicalField::Category),
    ("niche", CanonicalField::Category),
    ("type", CanonicalField::Category),
    ("segment", CanonicalField::Category),
    ("link", CanonicalField::Link),
    ("profile link", CanonicalField::Link),
    ("url", CanonicalField::Link),
    ("comment", CanonicalField::Comment),
    ("comments", CanonicalField::Comment),
    ("credibility", CanonicalField::Credibility),
];

// ---------------------------------------------------------------------------
// Name and value normalization
// ---------------------------------------------------------------------------

/// Trim, lowercase, and collapse runs of whitespace, `-` and `_` into a
/// single space.
pub fn normalize_column_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            if !in_separator {
                out.push(' ');
                in_separator = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out.trim().to_string()
}

/// Canonical field for a raw header, if it is a known alias.
pub fn resolve_alias(raw_header: &str) -> Option<CanonicalField> {
    let normalized = normalize_column_name(raw_header);
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, field)| *field)
}

fn has_id_word(header: &str) -> bool {
    normalize_column_name(header)
        .split_whitespace()
        .any(|word| word == "id")
}

/// Canonical identifier form: no surrounding whitespace, no leading `@`.
pub fn normalize_id(raw: &str) -> String {
    raw.trim_start_matches(|c: char| c == '@' || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Best-effort numeric coercion. Blank, unparsable and non-finite values are
/// missing, never an error.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number for a sheet cell: integral values without a decimal point.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ---------------------------------------------------------------------------
// Column binding
// ---------------------------------------------------------------------------

/// Which source column feeds each canonical field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    bindings: [Option<usize>; FIELD_COUNT],
    /// Source columns that did not bind to a canonical field.
    pub extras: Vec<usize>,
}

impl ColumnMap {
    /// Bind headers to canonical fields via the alias table.
    ///
    /// The first header aliasing to a field wins. With no `ID` alias, the
    /// first unbound header with `id` as a word (`Influencer ID`) becomes
    /// `ID`; failing that the first column does, even if it had aliased to
    /// something else.
    pub fn resolve(headers: &[String]) -> Result<Self, RosterError> {
        if headers.is_empty() {
            return Err(RosterError::EmptyHeader);
        }

        let mut map = Self::default();
        for (col, header) in headers.iter().enumerate() {
            match resolve_alias(header) {
                Some(field) if map.column(field).is_none() => map.bind(field, col),
                _ => map.extras.push(col),
            }
        }

        if map.column(CanonicalField::Id).is_none() {
            let keyed = map
                .extras
                .iter()
                .copied()
                .find(|&c| has_id_word(&headers[c]));
            map.bind(CanonicalField::Id, keyed.unwrap_or(0));
        }

        Ok(map)
    }

    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.bindings[field.slot()]
    }

    /// Bind `field` to `col`, taking the column away from whatever held it.
    pub fn bind(&mut self, field: CanonicalField, col: usize) {
        for slot in self.bindings.iter_mut() {
            if *slot == Some(col) {
                *slot = None;
            }
        }
        self.extras.retain(|&c| c != col);
        self.bindings[field.slot()] = Some(col);
    }

    /// Canonical labels (all of them, bound or not) followed by the
    /// pass-through header names.
    pub fn output_columns(&self, headers: &[String]) -> Vec<String> {
        CanonicalField::ALL
            .iter()
            .map(|f| f.label().to_string())
            .chain(self.extras.iter().filter_map(|&c| headers.get(c).cloned()))
            .collect()
    }

    fn cell<'a>(&self, field: CanonicalField, cells: &'a [String]) -> &'a str {
        self.column(field)
            .and_then(|c| cells.get(c))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Map one data row. Returns the row and how many numeric cells failed
    /// to parse.
    pub fn map_row(&self, cells: &[String]) -> (CanonicalRow, usize) {
        let mut coerced = 0;
        let mut numeric = |field: CanonicalField| {
            let cell = self.cell(field, cells);
            let parsed = parse_numeric(cell);
            if parsed.is_none() && !cell.trim().is_empty() {
                coerced += 1;
            }
            parsed
        };

        let followers = numeric(CanonicalField::Followers);
        let post_price = numeric(CanonicalField::PostPrice);
        let avg_view = numeric(CanonicalField::AvgView);
        let avg_like = numeric(CanonicalField::AvgLike);
        let avg_comments = numeric(CanonicalField::AvgComments);
        let ier = numeric(CanonicalField::Ier);
        let cpv = numeric(CanonicalField::Cpv);

        let link = self.cell(CanonicalField::Link, cells).trim();
        let row = CanonicalRow {
            id: normalize_id(self.cell(CanonicalField::Id, cells)),
            followers,
            post_price,
            avg_view,
            avg_like,
            avg_comments,
            ier,
            cpv,
            category: self.cell(CanonicalField::Category, cells).trim().to_string(),
            link: (!link.is_empty()).then(|| link.to_string()),
            comment: self.cell(CanonicalField::Comment, cells).to_string(),
            credibility: Credibility::from_cell(self.cell(CanonicalField::Credibility, cells)),
            raw: cells.to_vec(),
        };
        (row, coerced)
    }
}

// ---------------------------------------------------------------------------
// Table mapping
// ---------------------------------------------------------------------------

/// A raw table brought into canonical shape.
#[derive(Debug, Clone)]
pub struct MappedTable {
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    /// Rows with a non-blank id, in source order.
    pub rows: Vec<CanonicalRow>,
    /// Rows dropped because their id was blank.
    pub blank_ids: usize,
    /// Non-blank numeric cells that were coerced to missing.
    pub coerced_cells: usize,
}

impl MappedTable {
    pub fn output_columns(&self) -> Vec<String> {
        self.columns.output_columns(&self.headers)
    }
}

/// Map a raw table with an already-resolved column binding.
pub fn map_with(table: &RawTable, columns: ColumnMap) -> MappedTable {
    let mut rows = Vec::with_capacity(table.len());
    let mut blank_ids = 0;
    let mut coerced_cells = 0;

    for cells in &table.rows {
        let (row, coerced) = columns.map_row(cells);
        coerced_cells += coerced;
        if row.id.is_empty() {
            blank_ids += 1;
            continue;
        }
        rows.push(row);
    }

    if coerced_cells > 0 {
        log::debug!("{coerced_cells} numeric cell(s) coerced to missing");
    }

    MappedTable {
        headers: table.headers.clone(),
        columns,
        rows,
        blank_ids,
        coerced_cells,
    }
}

/// Map an arbitrary table onto the canonical schema.
pub fn map_table(table: &RawTable) -> Result<MappedTable, RosterError> {
    let columns = ColumnMap::resolve(&table.headers)?;
    Ok(map_with(table, columns))
}

/// Build a candidate batch from an uploaded table.
///
/// Any credibility column in the upload is ignored; repeated ids keep their
/// first row.
pub fn candidates_from_table(table: &RawTable) -> Result<CandidateBatch, RosterError> {
    let mapped = map_table(table)?;
    let mut seen: HashSet<String> = HashSet::with_capacity(mapped.rows.len());
    let mut batch = CandidateBatch::default();

    for mut row in mapped.rows {
        if !seen.insert(row.id.clone()) {
            batch.duplicate_ids.push(row.id);
            continue;
        }
        row.credibility = Credibility::Unknown;
        batch.rows.push(row);
    }

    if !batch.duplicate_ids.is_empty() {
        log::warn!(
            "{} duplicate candidate id(s) ignored",
            batch.duplicate_ids.len()
        );
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut values = vec![headers.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        values.extend(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()));
        RawTable::from_values(&values)
    }

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_column_name("  Follower__Count "), "follower count");
        assert_eq!(normalize_column_name("Avg-Likes"), "avg likes");
        assert_eq!(normalize_column_name("audience \t size"), "audience size");
        assert_eq!(normalize_column_name("Post Price (T)"), "post price (t)");
    }

    #[test]
    fn aliases_resolve_many_to_one() {
        assert_eq!(resolve_alias("Follower Count"), Some(CanonicalField::Followers));
        assert_eq!(resolve_alias("niche"), Some(CanonicalField::Category));
        assert_eq!(resolve_alias("Eng. Rate"), Some(CanonicalField::Ier));
        assert_eq!(resolve_alias("post_fee"), Some(CanonicalField::PostPrice));
        assert_eq!(resolve_alias("Username"), Some(CanonicalField::Id));
        assert_eq!(resolve_alias("Shoe size"), None);
    }

    #[test]
    fn id_normalization() {
        assert_eq!(normalize_id("  @jane "), "jane");
        assert_eq!(normalize_id("@@jane"), "jane");
        assert_eq!(normalize_id("@ @jane"), "jane");
        assert_eq!(normalize_id("jane@home"), "jane@home");
        assert_eq!(normalize_id("   "), "");
    }

    #[test]
    fn numeric_parsing_is_lossy() {
        assert_eq!(parse_numeric(" 1200 "), Some(1200.0));
        assert_eq!(parse_numeric("3.5"), Some(3.5));
        assert_eq!(parse_numeric("1.2K"), None);
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(1200.0), "1200");
        assert_eq!(format_number(0.035), "0.035");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn positional_id_fallback() {
        let t = table(&["Handle Name", "Followers"], &[&["@jane", "100"]]);
        let mapped = map_table(&t).unwrap();
        assert_eq!(mapped.columns.column(CanonicalField::Id), Some(0));
        assert_eq!(mapped.rows[0].id, "jane");
        assert_eq!(mapped.rows[0].followers, Some(100.0));
        assert!(mapped.columns.extras.is_empty());
    }

    #[test]
    fn id_word_beats_positional_fallback() {
        let t = table(
            &["Name", "Influencer ID", "Followers"],
            &[&["Jane Doe", "@jane", "100"]],
        );
        let mapped = map_table(&t).unwrap();
        assert_eq!(mapped.columns.column(CanonicalField::Id), Some(1));
        assert_eq!(mapped.rows[0].id, "jane");
        assert_eq!(mapped.columns.extras, vec![0]);
    }

    #[test]
    fn id_inside_a_word_does_not_count() {
        let t = table(&["Handle Name", "Video Link"], &[&["jane", "x"]]);
        let mapped = map_table(&t).unwrap();
        assert_eq!(mapped.columns.column(CanonicalField::Id), Some(0));
    }

    #[test]
    fn positional_fallback_steals_aliased_first_column() {
        let t = table(&["Followers", "Niche"], &[&["bob", "food"]]);
        let mapped = map_table(&t).unwrap();
        assert_eq!(mapped.columns.column(CanonicalField::Id), Some(0));
        assert_eq!(mapped.columns.column(CanonicalField::Followers), None);
        assert_eq!(mapped.rows[0].id, "bob");
        assert_eq!(mapped.rows[0].followers, None);
        assert_eq!(mapped.rows[0].category, "food");
    }

    #[test]
    fn first_alias_wins_and_rest_pass_through() {
        let t = table(&["ID", "Price", "Rate", "Shoe size"], &[&["a", "10", "20", "44"]]);
        let mapped = map_table(&t).unwrap();
        assert_eq!(mapped.rows[0].post_price, Some(10.0));
        assert_eq!(mapped.columns.extras, vec![2, 3]);

        let cols = mapped.output_columns();
        assert!(cols.ends_with(&["Rate".to_string(), "Shoe size".to_string()]));
    }

    #[test]
    fn every_canonical_field_is_addressable() {
        let t = table(&["whatever"], &[&["x"]]);
        let mapped = map_table(&t).unwrap();
        let cols = mapped.output_columns();
        for field in CanonicalField::SCHEMA {
            assert!(cols.iter().any(|c| c == field.label()), "{}", field.label());
        }
        let row = &mapped.rows[0];
        assert_eq!(row.followers, None);
        assert_eq!(row.link, None);
        assert_eq!(row.category, "");
    }

    #[test]
    fn blank_ids_are_dropped_and_bad_numbers_counted() {
        let t = table(
            &["ID", "Followers", "IER"],
            &[&["a", "1.5K", "0.03"], &["  ", "10", ""], &["b", "", "n/a"]],
        );
        let mapped = map_table(&t).unwrap();
        assert_eq!(mapped.rows.len(), 2);
        assert_eq!(mapped.blank_ids, 1);
        assert_eq!(mapped.coerced_cells, 2);
        assert_eq!(mapped.rows[0].ier, Some(0.03));
        assert_eq!(mapped.rows[0].followers, None);
    }

    #[test]
    fn empty_header_is_a_schema_error() {
        let t = RawTable::default();
        assert_eq!(map_table(&t).unwrap_err(), RosterError::EmptyHeader);
    }

    #[test]
    fn candidates_ignore_uploaded_credibility_and_dedupe() {
        let t = table(
            &["username", "Credibility", "Comment"],
            &[&["@a", "True", "hi"], &["b", "", ""], &["a", "False", "again"]],
        );
        let batch = candidates_from_table(&t).unwrap();
        assert_eq!(batch.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(batch.duplicate_ids, vec!["a"]);
        assert!(batch.rows.iter().all(|r| r.credibility == Credibility::Unknown));
        assert_eq!(batch.rows[0].comment, "hi");
    }
}
