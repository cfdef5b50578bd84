//! Fixed 20-column export layout for pending candidates.
//!
//! The downstream template expects data at fixed positions (1-based):
//! 6 ID, 12 Link, 13 Category, 15 Followers, 16 IER, 17 Avg like,
//! 18 Avg comments, 20 Post price. Every other column is blank, header
//! included.

use crate::model::CanonicalRow;
use crate::schema::CanonicalField;

pub const EXPORT_WIDTH: usize = 20;

/// 0-based column → field.
const EXPORT_COLUMNS: [(usize, CanonicalField); 8] = [
    (5, CanonicalField::Id),
    (11, CanonicalField::Link),
    (12, CanonicalField::Category),
    (14, CanonicalField::Followers),
    (15, CanonicalField::Ier),
    (16, CanonicalField::AvgLike),
    (17, CanonicalField::AvgComments),
    (19, CanonicalField::PostPrice),
];

#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Empty,
    Text(String),
    Number(f64),
}

impl ExportCell {
    fn text(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }

    fn number(n: Option<f64>) -> Self {
        n.map_or(Self::Empty, Self::Number)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<ExportCell>>,
}

impl ExportTable {
    /// Header plus data rows.
    pub fn height(&self) -> usize {
        self.rows.len() + 1
    }

    /// 1-based positions of the labeled columns.
    pub fn labeled_columns(&self) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, _)| i + 1)
            .collect()
    }
}

fn cell(row: &CanonicalRow, field: CanonicalField) -> ExportCell {
    match field {
        CanonicalField::Id => ExportCell::text(&row.id),
        CanonicalField::Link => ExportCell::text(&row.profile_link()),
        CanonicalField::Category => ExportCell::text(&row.category),
        CanonicalField::Followers => ExportCell::number(row.followers),
        CanonicalField::Ier => ExportCell::number(row.ier),
        CanonicalField::AvgLike => ExportCell::number(row.avg_like),
        CanonicalField::AvgComments => ExportCell::number(row.avg_comments),
        CanonicalField::PostPrice => ExportCell::number(row.post_price),
        _ => ExportCell::Empty,
    }
}

/// Lay rows out in the export template.
pub fn export_table(rows: &[CanonicalRow]) -> ExportTable {
    let mut header = vec![String::new(); EXPORT_WIDTH];
    for (col, field) in EXPORT_COLUMNS {
        header[col] = field.label().to_string();
    }

    let rows = rows
        .iter()
        .map(|row| {
            let mut cells = vec![ExportCell::Empty; EXPORT_WIDTH];
            for (col, field) in EXPORT_COLUMNS {
                cells[col] = cell(row, field);
            }
            cells
        })
        .collect();

    ExportTable { header, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_and_labels() {
        let rows = vec![CanonicalRow::new("a"), CanonicalRow::new("b"), CanonicalRow::new("c")];
        let table = export_table(&rows);
        assert_eq!(table.height(), 4);
        assert_eq!(table.header.len(), EXPORT_WIDTH);
        assert!(table.rows.iter().all(|r| r.len() == EXPORT_WIDTH));
        assert_eq!(table.labeled_columns(), vec![6, 12, 13, 15, 16, 17, 18, 20]);
        assert_eq!(table.header[5], "ID");
        assert_eq!(table.header[19], "Post price");
    }

    #[test]
    fn values_land_in_their_columns() {
        let mut row = CanonicalRow::new("jane");
        row.followers = Some(12000.0);
        row.ier = Some(0.04);
        row.post_price = Some(250.0);
        row.category = "food".into();
        let table = export_table(&[row]);
        let r = &table.rows[0];

        assert_eq!(r[5], ExportCell::Text("jane".into()));
        assert_eq!(r[11], ExportCell::Text("https://www.instagram.com/jane".into()));
        assert_eq!(r[12], ExportCell::Text("food".into()));
        assert_eq!(r[14], ExportCell::Number(12000.0));
        assert_eq!(r[15], ExportCell::Number(0.04));
        assert_eq!(r[16], ExportCell::Empty);
        assert_eq!(r[19], ExportCell::Number(250.0));
        assert!(r[0].is_empty() && r[18].is_empty());
    }

    #[test]
    fn empty_selection_is_header_only() {
        let table = export_table(&[]);
        assert_eq!(table.height(), 1);
        assert!(table.rows.is_empty());
    }
}
