use crate::model::{
    CandidateBatch, CanonicalRow, Credibility, ReconBucket, ReconSummary, ReconciliationResult,
};
use crate::roster::RosterSnapshot;

/// Classify uploaded candidates against the roster, keyed on `id`.
///
/// - not in the roster → Pending
/// - roster says rejected → Rejected
/// - roster has no verdict → Unknown
/// - roster says approved → Approved
///
/// Every output row carries a profile link. Rows found in the roster take the
/// roster verdict, and the roster comment when the upload has none.
pub fn classify(candidates: &CandidateBatch, roster: &RosterSnapshot) -> ReconciliationResult {
    let index = roster.index_by_id();
    let mut result = ReconciliationResult::default();

    for candidate in &candidates.rows {
        let mut row = candidate.clone();
        row.link = Some(candidate.profile_link());

        let bucket = match index.get(candidate.id.as_str()) {
            None => ReconBucket::Pending,
            Some(&i) => {
                let known = &roster.rows[i];
                row.credibility = known.credibility;
                if row.comment.trim().is_empty() {
                    row.comment = known.comment.clone();
                }
                match known.credibility {
                    Credibility::Rejected => ReconBucket::Rejected,
                    Credibility::Unknown => ReconBucket::Unknown,
                    Credibility::Approved => ReconBucket::Approved,
                }
            }
        };

        push(&mut result, bucket, row);
    }

    result.summary = ReconSummary {
        candidates: candidates.len(),
        pending: result.pending.len(),
        rejected: result.rejected.len(),
        unknown: result.unknown.len(),
        approved: result.approved.len(),
    };

    log::info!(
        "classified {} candidate(s): {} pending, {} rejected, {} unknown, {} approved",
        result.summary.candidates,
        result.summary.pending,
        result.summary.rejected,
        result.summary.unknown,
        result.summary.approved,
    );

    result
}

fn push(result: &mut ReconciliationResult, bucket: ReconBucket, row: CanonicalRow) {
    match bucket {
        ReconBucket::Pending => result.pending.push(row),
        ReconBucket::Rejected => result.rejected.push(row),
        ReconBucket::Unknown => result.unknown.push(row),
        ReconBucket::Approved => result.approved.push(row),
    }
}
