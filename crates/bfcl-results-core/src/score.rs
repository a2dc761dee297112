use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::issue::{DataIssue, FileKind};
use crate::record::record_id;

const ACCURACY_TOLERANCE: f64 = 1e-6;

/// The first line of a score file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoreSummary {
    pub accuracy: f64,
    pub correct_count: u64,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestError {
    pub error_type: String,
    pub error_message: String,
}

/// One failing test's record from a score file. The raw record is kept
/// verbatim for rendering; only `id`, `valid`, and `error` are
/// interpreted.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub id: String,
    pub error: Option<TestError>,
    pub raw: Value,
}

/// An interpreted score file: summary line plus failure records keyed
/// by identifier.
#[derive(Debug, Clone)]
pub struct ScoreFile {
    pub summary: ScoreSummary,
    pub failures: BTreeMap<String, FailureRecord>,
    pub issues: Vec<DataIssue>,
}

impl ScoreFile {
    /// Interpret score-file records. The file must be non-empty and
    /// its first record must deserialize as a summary; everything else
    /// is handled as a warn-and-continue `DataIssue`.
    pub fn from_records(records: Vec<Value>) -> Result<Self> {
        let mut records = records.into_iter();
        let first = records
            .next()
            .context("score file is empty (expected a summary line)")?;
        let summary: ScoreSummary =
            serde_json::from_value(first).context("first score line is not a summary record")?;

        let mut issues = Vec::new();
        if summary.correct_count > summary.total_count {
            issues.push(DataIssue::SummaryCountsInverted {
                correct: summary.correct_count,
                total: summary.total_count,
            });
        }
        let computed_accuracy = if summary.total_count == 0 {
            0.0
        } else {
            summary.correct_count as f64 / summary.total_count as f64
        };
        if (summary.accuracy - computed_accuracy).abs() > ACCURACY_TOLERANCE {
            issues.push(DataIssue::AccuracyMismatch {
                summary: summary.accuracy,
                computed: computed_accuracy,
            });
        }

        let mut failures: BTreeMap<String, FailureRecord> = BTreeMap::new();
        for (idx, raw) in records.enumerate() {
            let Some(id) = record_id(&raw).map(str::to_string) else {
                // Line numbers are 1-based and the summary is line 1.
                issues.push(DataIssue::MissingId {
                    file: FileKind::Score,
                    line: idx + 2,
                });
                continue;
            };
            if raw.get("valid").and_then(Value::as_bool) != Some(false) {
                issues.push(DataIssue::ScoreRecordNotInvalid { id: id.clone() });
                continue;
            }
            if failures.contains_key(&id) {
                issues.push(DataIssue::DuplicateId {
                    file: FileKind::Score,
                    id,
                });
                continue;
            }
            let error = raw
                .get("error")
                .and_then(|e| serde_json::from_value(e.clone()).ok());
            failures.insert(id.clone(), FailureRecord { id, error, raw });
        }

        Ok(ScoreFile {
            summary,
            failures,
            issues,
        })
    }
}
