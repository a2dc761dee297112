use serde::Serialize;
use serde_json::Value;

use crate::results::ResultFile;
use crate::score::{ScoreFile, TestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
        }
    }
}

/// One test's full detail for rendering: the record verbatim, plus
/// failure detail merged in from the score file when present.
#[derive(Debug, Serialize)]
pub struct ExtractedTest {
    pub id: String,
    pub category: String,
    pub status: TestStatus,
    pub error: Option<TestError>,
    /// The failure record when the test failed (it carries the error
    /// plus the expected answer), otherwise the result record. Opaque
    /// payload, never re-interpreted.
    pub record: Value,
}

/// Look up one identifier in one category's files. `score` is `None`
/// for an incomplete pair whose score file is missing; the record is
/// then reported as passed, which the caller should caveat.
///
/// Returns `None` when the id appears in neither file. An id found
/// only in the score file is still returned (as failed) so the caller
/// can render it; the accompanying `FailureNotInResult` issue comes
/// out of resolution.
pub fn extract_test(
    category: &str,
    result: &ResultFile,
    score: Option<&ScoreFile>,
    id: &str,
) -> Option<ExtractedTest> {
    let failure = score.and_then(|s| s.failures.get(id));
    if let Some(record) = result.records.get(id) {
        let status = if failure.is_some() {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        };
        return Some(ExtractedTest {
            id: id.to_string(),
            category: category.to_string(),
            status,
            error: failure.and_then(|f| f.error.clone()),
            record: failure.map_or_else(|| record.clone(), |f| f.raw.clone()),
        });
    }
    failure.map(|f| ExtractedTest {
        id: id.to_string(),
        category: category.to_string(),
        status: TestStatus::Failed,
        error: f.error.clone(),
        record: f.raw.clone(),
    })
}
