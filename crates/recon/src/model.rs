use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Credibility
// ---------------------------------------------------------------------------

/// Vetting verdict for an influencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Credibility {
    Approved,
    Rejected,
    /// Blank or unrecognized cell: nobody has decided yet.
    #[default]
    Unknown,
}

impl Credibility {
    /// Parse a sheet cell. `TRUE`/`True`/`true` and `approved` mean approved,
    /// the `false` spellings and `rejected` mean rejected, anything else is
    /// unknown.
    pub fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("approved") {
            Self::Approved
        } else if cell.eq_ignore_ascii_case("false") || cell.eq_ignore_ascii_case("rejected") {
            Self::Rejected
        } else {
            Self::Unknown
        }
    }

    /// Token written back to the sheet.
    pub fn to_cell(self) -> &'static str {
        match self {
            Self::Approved => "True",
            Self::Rejected => "False",
            Self::Unknown => "",
        }
    }

    /// Human label used in listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Credibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for Credibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" | "true" => Ok(Self::Approved),
            "rejected" | "false" => Ok(Self::Rejected),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(format!(
                "invalid credibility '{other}' (expected approved, rejected or unknown)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

pub const PROFILE_URL_PREFIX: &str = "https://www.instagram.com/";

/// One influencer in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalRow {
    pub id: String,
    pub followers: Option<f64>,
    pub post_price: Option<f64>,
    pub avg_view: Option<f64>,
    pub avg_like: Option<f64>,
    pub avg_comments: Option<f64>,
    pub ier: Option<f64>,
    pub cpv: Option<f64>,
    pub category: String,
    pub link: Option<String>,
    pub comment: String,
    pub credibility: Credibility,
    /// Source cells as read, aligned with the snapshot layout. Empty for rows
    /// created in this session.
    #[serde(skip)]
    pub raw: Vec<String>,
}

impl CanonicalRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_credibility(mut self, credibility: Credibility) -> Self {
        self.credibility = credibility;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// The stored link, or the derived profile URL when none is stored.
    pub fn profile_link(&self) -> String {
        match &self.link {
            Some(link) if !link.trim().is_empty() => link.clone(),
            _ => format!("{PROFILE_URL_PREFIX}{}", self.id),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Rows parsed from an uploaded file. Ids are non-blank and unique;
/// credibility is always unknown until merged against the roster.
#[derive(Debug, Clone, Default)]
pub struct CandidateBatch {
    pub rows: Vec<CanonicalRow>,
    /// Rows dropped because their id repeated an earlier row.
    pub duplicate_ids: Vec<String>,
}

impl CandidateBatch {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconBucket {
    /// Not in the roster at all.
    Pending,
    Rejected,
    /// In the roster without a verdict.
    Unknown,
    Approved,
}

impl fmt::Display for ReconBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Rejected => write!(f, "rejected"),
            Self::Unknown => write!(f, "unknown"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub candidates: usize,
    pub pending: usize,
    pub rejected: usize,
    pub unknown: usize,
    pub approved: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationResult {
    pub summary: ReconSummary,
    pub pending: Vec<CanonicalRow>,
    pub rejected: Vec<CanonicalRow>,
    pub unknown: Vec<CanonicalRow>,
    pub approved: Vec<CanonicalRow>,
}

impl ReconciliationResult {
    pub fn bucket(&self, bucket: ReconBucket) -> &[CanonicalRow] {
        match bucket {
            ReconBucket::Pending => &self.pending,
            ReconBucket::Rejected => &self.rejected,
            ReconBucket::Unknown => &self.unknown,
            ReconBucket::Approved => &self.approved,
        }
    }

    /// Which bucket a candidate id landed in, if any.
    pub fn bucket_of(&self, id: &str) -> Option<ReconBucket> {
        [
            ReconBucket::Pending,
            ReconBucket::Rejected,
            ReconBucket::Unknown,
            ReconBucket::Approved,
        ]
        .into_iter()
        .find(|b| self.bucket(*b).iter().any(|r| r.id == id))
    }
}
