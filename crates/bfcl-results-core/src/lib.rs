//! Interpreters and aggregations for BFCL benchmark output.
//!
//! A benchmark run produces one result file and one score file per test
//! category, both line-delimited JSON. This crate turns those files
//! (already loaded into memory) into identifier sets, pass/fail
//! outcomes, cross-run stability classifications, and two-run
//! comparisons. Nothing in here touches the filesystem; the CLI crate
//! owns discovery and loading.

pub mod compare;
pub mod extract;
pub mod issue;
pub mod record;
pub mod resolve;
pub mod results;
pub mod score;
pub mod stability;

pub use issue::DataIssue;
pub use record::read_jsonl;
pub use resolve::RunOutcome;
pub use results::ResultFile;
pub use score::{ScoreFile, ScoreSummary, TestError};

use anyhow::Result;

/// One run's data for a single test category: the interpreted result
/// and score files plus the resolved pass/fail outcome.
#[derive(Debug, Clone)]
pub struct CategoryRun {
    pub result: ResultFile,
    pub score: ScoreFile,
    pub outcome: RunOutcome,
}

impl CategoryRun {
    /// Interpret a (result, score) record pair and resolve it.
    pub fn from_records(
        result_records: Vec<serde_json::Value>,
        score_records: Vec<serde_json::Value>,
    ) -> Result<Self> {
        let result = ResultFile::from_records(result_records)?;
        let score = ScoreFile::from_records(score_records)?;
        let outcome = resolve::resolve(&result, &score);
        Ok(CategoryRun {
            result,
            score,
            outcome,
        })
    }

    /// All data-integrity findings from interpretation and resolution,
    /// in the order they were detected.
    pub fn issues(&self) -> impl Iterator<Item = &DataIssue> {
        self.result
            .issues
            .iter()
            .chain(self.score.issues.iter())
            .chain(self.outcome.issues.iter())
    }
}
