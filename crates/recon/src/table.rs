use crate::headers::make_unique_headers;

/// A rectangular table of strings: one unique header row plus data rows.
///
/// This is the shape every source is brought into before schema mapping,
/// whether it came from `get_all_values()` on the remote sheet or from an
/// uploaded CSV/XLSX file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build from a full value matrix whose first row is the header.
    ///
    /// Headers are deduplicated and every data row is padded with empty
    /// strings (or truncated) to the header width. An empty matrix yields a
    /// table with zero columns.
    pub fn from_values(values: &[Vec<String>]) -> Self {
        let Some((header, data)) = values.split_first() else {
            return Self::default();
        };

        let headers = make_unique_headers(header);
        let width = headers.len();
        let rows = data
            .iter()
            .map(|row| {
                let mut row: Vec<String> = row.iter().take(width).cloned().collect();
                row.resize(width, String::new());
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with exactly this header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}
