use std::collections::BTreeSet;

use crate::issue::DataIssue;
use crate::results::ResultFile;
use crate::score::ScoreFile;

/// Resolved pass/fail sets for one run/category pair.
///
/// `passed` and `failed` are computed from raw records; when they
/// disagree with the score file's summary, the recomputed values stand
/// and the disagreement is carried as a `SummaryMismatch` issue.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub passed: BTreeSet<String>,
    pub failed: BTreeSet<String>,
    pub issues: Vec<DataIssue>,
}

impl RunOutcome {
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

/// Compute passed = result ids − failure ids.
///
/// Failure ids that never ran (absent from the result file) violate
/// the F ⊆ R precondition; they are flagged and dropped from the
/// failed set rather than silently counted.
pub fn resolve(result: &ResultFile, score: &ScoreFile) -> RunOutcome {
    let all_ids = result.ids();
    let mut failed = BTreeSet::new();
    let mut issues = Vec::new();

    for id in score.failures.keys() {
        if all_ids.contains(id) {
            failed.insert(id.clone());
        } else {
            issues.push(DataIssue::FailureNotInResult { id: id.clone() });
        }
    }

    let passed: BTreeSet<String> = all_ids.difference(&failed).cloned().collect();

    let checks: [(&'static str, u64, u64); 3] = [
        ("total_count", score.summary.total_count, all_ids.len() as u64),
        (
            "correct_count",
            score.summary.correct_count,
            passed.len() as u64,
        ),
        (
            "failure_count",
            score
                .summary
                .total_count
                .saturating_sub(score.summary.correct_count),
            failed.len() as u64,
        ),
    ];
    for (field, summary, computed) in checks {
        if summary != computed {
            issues.push(DataIssue::SummaryMismatch {
                field,
                summary,
                computed,
            });
        }
    }

    RunOutcome {
        passed,
        failed,
        issues,
    }
}
