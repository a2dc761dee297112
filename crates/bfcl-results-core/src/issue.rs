use serde::Serialize;

/// Which of the two files in a pair an issue was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Result,
    Score,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Result => "result",
            FileKind::Score => "score",
        }
    }
}

/// A non-fatal data-integrity finding.
///
/// The interpreters and the resolver never abort on these; the
/// offending record is excluded (first occurrence wins for duplicates)
/// and the finding is carried alongside the computed data so callers
/// can surface it. Counts recomputed from raw records are authoritative
/// over the score file's summary line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIssue {
    /// The same identifier appeared on more than one line of a file.
    DuplicateId { file: FileKind, id: String },
    /// A record had no `id` field.
    MissingId { file: FileKind, line: usize },
    /// A score-file failure record carried `valid: true` (or no
    /// `valid` field at all). Passing tests never appear in score
    /// files.
    ScoreRecordNotInvalid { id: String },
    /// A score-file failure referenced an identifier absent from the
    /// result file.
    FailureNotInResult { id: String },
    /// A summary count disagreed with the count recomputed from raw
    /// records.
    SummaryMismatch {
        field: &'static str,
        summary: u64,
        computed: u64,
    },
    /// The summary's accuracy differed from correct/total by more than
    /// the tolerance.
    AccuracyMismatch { summary: f64, computed: f64 },
    /// `correct_count` exceeded `total_count` in the summary.
    SummaryCountsInverted { correct: u64, total: u64 },
}

impl std::fmt::Display for DataIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataIssue::DuplicateId { file, id } => {
                write!(f, "duplicate id {id:?} in {} file", file.as_str())
            }
            DataIssue::MissingId { file, line } => {
                write!(f, "record without id in {} file (line {line})", file.as_str())
            }
            DataIssue::ScoreRecordNotInvalid { id } => {
                write!(f, "score record {id:?} is not marked valid: false")
            }
            DataIssue::FailureNotInResult { id } => {
                write!(f, "failure id {id:?} does not appear in the result file")
            }
            DataIssue::SummaryMismatch {
                field,
                summary,
                computed,
            } => write!(
                f,
                "summary {field} is {summary} but recomputed value is {computed}"
            ),
            DataIssue::AccuracyMismatch { summary, computed } => write!(
                f,
                "summary accuracy is {summary} but correct/total gives {computed}"
            ),
            DataIssue::SummaryCountsInverted { correct, total } => write!(
                f,
                "summary correct_count {correct} exceeds total_count {total}"
            ),
        }
    }
}
