use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::score::ScoreSummary;
use crate::CategoryRun;

/// One side of a comparison, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SideSummary {
    pub run: String,
    pub summary: ScoreSummary,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

/// Regressions and improvements between a baseline and a modified run
/// of one category.
///
/// Both sets are restricted to identifiers present in both runs'
/// result files; identifiers unique to one side are reported
/// separately instead of failing the comparison.
#[derive(Debug, Serialize)]
pub struct RunComparison {
    pub baseline: SideSummary,
    pub modified: SideSummary,
    pub regressions: Vec<String>,
    pub improvements: Vec<String>,
    pub only_in_baseline: Vec<String>,
    pub only_in_modified: Vec<String>,
    pub regressions_by_error: BTreeMap<String, Vec<String>>,
}

impl RunComparison {
    pub fn net_change(&self) -> i64 {
        self.improvements.len() as i64 - self.regressions.len() as i64
    }
}

fn side_summary(name: &str, run: &CategoryRun) -> SideSummary {
    SideSummary {
        run: name.to_string(),
        summary: run.score.summary.clone(),
        passed: run.outcome.passed.len(),
        failed: run.outcome.failed.len(),
        total: run.outcome.total(),
    }
}

/// Compare two runs of the same category.
pub fn compare_runs(
    baseline_name: &str,
    baseline: &CategoryRun,
    modified_name: &str,
    modified: &CategoryRun,
) -> RunComparison {
    let baseline_ids = baseline.result.ids();
    let modified_ids = modified.result.ids();
    let shared: BTreeSet<&String> = baseline_ids.intersection(&modified_ids).collect();

    let regressions: Vec<String> = baseline
        .outcome
        .passed
        .iter()
        .filter(|id| shared.contains(id) && modified.outcome.failed.contains(*id))
        .cloned()
        .collect();
    let improvements: Vec<String> = baseline
        .outcome
        .failed
        .iter()
        .filter(|id| shared.contains(id) && !modified.outcome.failed.contains(*id))
        .cloned()
        .collect();

    let mut regressions_by_error: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in &regressions {
        let error_type = modified
            .score
            .failures
            .get(id)
            .and_then(|f| f.error.as_ref())
            .map_or("unknown", |e| e.error_type.as_str());
        regressions_by_error
            .entry(error_type.to_string())
            .or_default()
            .push(id.clone());
    }

    RunComparison {
        baseline: side_summary(baseline_name, baseline),
        modified: side_summary(modified_name, modified),
        regressions,
        improvements,
        only_in_baseline: baseline_ids.difference(&modified_ids).cloned().collect(),
        only_in_modified: modified_ids.difference(&baseline_ids).cloned().collect(),
        regressions_by_error,
    }
}
