use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// The table has no header cells at all, so no column can become `ID`.
    EmptyHeader,
    /// A column the roster cannot work without was not found.
    MissingColumn { column: String },
    /// An edit addressed a row index outside the loaded snapshot.
    RowOutOfRange { row: usize, len: usize },
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHeader => write!(f, "table has no columns"),
            Self::MissingColumn { column } => {
                write!(f, "required column containing '{column}' not found")
            }
            Self::RowOutOfRange { row, len } => {
                write!(f, "row {row} out of range (snapshot has {len} rows)")
            }
        }
    }
}

impl std::error::Error for RosterError {}
